// File Stager Port
// Local staging of uploaded files before they are pushed to a device

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("Failed to stage {file_name}: {reason}")]
    WriteFailed { file_name: String, reason: String },

    #[error("Failed to remove staged file {path}: {reason}")]
    RemoveFailed { path: String, reason: String },
}

/// File Stager trait
///
/// Implementations:
/// - TempDirStager: writes under a unique directory inside the staging root (infra-system)
/// - MemoryStager: records staged files in memory for tests
#[async_trait]
pub trait FileStager: Send + Sync {
    /// Write `bytes` to a fresh local file named `file_name` and return its path
    async fn stage(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, StageError>;

    /// Remove a file previously returned by `stage`
    async fn remove(&self, path: &Path) -> Result<(), StageError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory stager
    #[derive(Default)]
    pub struct MemoryStager {
        files: Mutex<HashMap<PathBuf, usize>>,
        fail_writes: bool,
    }

    impl MemoryStager {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                files: Mutex::new(HashMap::new()),
                fail_writes: true,
            }
        }

        /// Number of files currently staged
        pub fn staged_count(&self) -> usize {
            self.files.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl FileStager for MemoryStager {
        async fn stage(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, StageError> {
            if self.fail_writes {
                return Err(StageError::WriteFailed {
                    file_name: file_name.to_string(),
                    reason: "disk full".to_string(),
                });
            }
            let path = PathBuf::from("/staging").join(file_name);
            self.files.lock().unwrap().insert(path.clone(), bytes.len());
            Ok(path)
        }

        async fn remove(&self, path: &Path) -> Result<(), StageError> {
            match self.files.lock().unwrap().remove(path) {
                Some(_) => Ok(()),
                None => Err(StageError::RemoveFailed {
                    path: path.display().to_string(),
                    reason: "not staged".to_string(),
                }),
            }
        }
    }
}
