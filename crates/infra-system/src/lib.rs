// ADB Dispatch Infrastructure - System Adapters
// Implements: ProcessInvoker, FileStager

pub mod subprocess_invoker;
pub mod temp_dir_stager;

pub use subprocess_invoker::SubprocessInvoker;
pub use temp_dir_stager::TempDirStager;
