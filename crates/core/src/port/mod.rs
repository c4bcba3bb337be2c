// Port Layer - Interfaces for external dependencies

pub mod file_stager;
pub mod process_invoker;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use file_stager::{FileStager, StageError};
pub use process_invoker::{InvocationError, InvokeOptions, ProcessInvoker, RawOutput};
pub use time_provider::TimeProvider;
