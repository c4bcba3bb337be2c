// Domain Layer - Pure business logic and entities

pub mod command;
pub mod error;
pub mod outcome;
pub mod queue;

// Re-exports
pub use command::CommandLine;
pub use error::DomainError;
pub use outcome::{CommandResponse, Outcome};
pub use queue::{QueueClass, QueueConfig, QueueStatus, QueuesStatus};
