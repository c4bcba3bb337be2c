// Temp directory stager
// Each staged file gets its own uuid-named directory under the staging root
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use adb_dispatch_core::port::{FileStager, StageError};

const STAGING_DIR_NAME: &str = "adb-dispatch-staging";

pub struct TempDirStager {
    root: PathBuf,
}

impl TempDirStager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Staging root inside the OS temp directory
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir().join(STAGING_DIR_NAME))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl FileStager for TempDirStager {
    async fn stage(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, StageError> {
        let write_failed = |e: std::io::Error| StageError::WriteFailed {
            file_name: file_name.to_string(),
            reason: e.to_string(),
        };

        let dir = self.root.join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&dir).await.map_err(write_failed)?;

        let path = dir.join(file_name);
        if let Err(e) = tokio::fs::write(&path, bytes).await {
            let _ = tokio::fs::remove_dir_all(&dir).await;
            return Err(write_failed(e));
        }

        debug!(path = %path.display(), bytes = bytes.len(), "File staged");
        Ok(path)
    }

    async fn remove(&self, path: &Path) -> Result<(), StageError> {
        let remove_failed = |e: std::io::Error| StageError::RemoveFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        tokio::fs::remove_file(path).await.map_err(remove_failed)?;

        // Drop the per-file directory, never the root itself
        if let Some(dir) = path.parent() {
            if dir.starts_with(&self.root) && dir != self.root {
                tokio::fs::remove_dir(dir).await.map_err(remove_failed)?;
            }
        }

        debug!(path = %path.display(), "Staged file removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stager() -> TempDirStager {
        TempDirStager::new(std::env::temp_dir().join(format!("adb-dispatch-test-{}", Uuid::new_v4())))
    }

    #[tokio::test]
    async fn test_stage_and_remove() {
        let stager = stager();

        let path = stager.stage("app.apk", b"PK\x03\x04").await.unwrap();
        assert!(path.starts_with(stager.root()));
        assert!(path.ends_with("app.apk"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"PK\x03\x04");

        stager.remove(&path).await.unwrap();
        assert!(!path.exists());
        assert!(!path.parent().unwrap().exists());
        assert!(stager.root().exists());

        tokio::fs::remove_dir(stager.root()).await.unwrap();
    }

    #[tokio::test]
    async fn test_same_name_staged_twice_is_distinct() {
        let stager = stager();

        let first = stager.stage("app.apk", b"one").await.unwrap();
        let second = stager.stage("app.apk", b"two").await.unwrap();
        assert_ne!(first, second);
        assert_eq!(tokio::fs::read(&first).await.unwrap(), b"one");

        stager.remove(&first).await.unwrap();
        stager.remove(&second).await.unwrap();
        tokio::fs::remove_dir(stager.root()).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_directory() {
        let stager = stager();

        // Nested name: the intermediate directory does not exist
        let result = stager.stage("nested/app.apk", b"data").await;
        assert!(matches!(result, Err(StageError::WriteFailed { .. })));

        let mut entries = tokio::fs::read_dir(stager.root()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
        tokio::fs::remove_dir(stager.root()).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_missing_file_fails() {
        let stager = stager();
        let result = stager.remove(&stager.root().join("missing.apk")).await;
        assert!(matches!(result, Err(StageError::RemoveFailed { .. })));
    }
}
