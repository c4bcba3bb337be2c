// Application Layer - Use Cases and Dispatch Policy

pub mod admission_queue;
pub mod command_classifier;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod dispatcher;
pub mod outcome_classifier;
pub mod package_install;
pub mod server_lifecycle;

// Re-exports
pub use admission_queue::{AdmissionQueue, Completion, QueueError};
pub use config::DispatchConfig;
pub use discovery::DiscoveryService;
pub use dispatcher::DispatchContext;
pub use package_install::InstallRequest;
pub use server_lifecycle::ServerLifecycle;
