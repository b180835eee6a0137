//! Local filesystem backend
//!
//! Implements the file half of the backend boundary directly with tokio::fs.
//! Writes go to a sibling temp file first and are renamed into place, so a
//! reader never observes a half-written mirror.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{BackendError, FileBackend};
use crate::config::settings::{config_dir, SettingsError};

/// File backend rooted at the application data directory
pub struct LocalFileBackend {
    base: PathBuf,
}

impl LocalFileBackend {
    /// Backend whose default export directory is the Keyshelf data directory
    pub fn new() -> Result<Self, SettingsError> {
        Ok(Self { base: config_dir()? })
    }

    /// Backend with a custom default export directory (for testing)
    pub fn with_base(base: PathBuf) -> Self {
        Self { base }
    }
}

/// Write `content` to a sibling `<name>.tmp` file, flush it, and rename it
/// over `path`. The temp file is removed if the rename fails.
pub(crate) async fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no file name", path.display()),
        )
    })?;
    let mut temp_name = name.to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let mut file = fs::File::create(&temp_path).await?;
    file.write_all(content.as_bytes()).await?;
    file.sync_all().await?;
    drop(file);

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }
    Ok(())
}

#[async_trait]
impl FileBackend for LocalFileBackend {
    async fn default_export_dir(&self) -> Result<PathBuf, BackendError> {
        Ok(self.base.clone())
    }

    async fn ensure_dir_exists(&self, path: &Path) -> Result<bool, BackendError> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| BackendError::new("ensure_dir_exists", e.to_string()))?;
        Ok(true)
    }

    async fn write_file_content(&self, path: &Path, content: &str) -> Result<bool, BackendError> {
        write_atomic(path, content)
            .await
            .map_err(|e| BackendError::new("write_file_content", e.to_string()))?;

        debug!("Wrote {} bytes to {:?}", content.len(), path);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_ensure_dir_creates_nested() {
        let temp = tempdir().unwrap();
        let backend = LocalFileBackend::with_base(temp.path().to_path_buf());
        let nested = temp.path().join("a").join("b");

        assert!(backend.ensure_dir_exists(&nested).await.unwrap());
        assert!(nested.is_dir());
        // Existing directory is fine too
        assert!(backend.ensure_dir_exists(&nested).await.unwrap());
    }

    #[tokio::test]
    async fn test_write_overwrites_and_leaves_no_temp() {
        let temp = tempdir().unwrap();
        let backend = LocalFileBackend::with_base(temp.path().to_path_buf());
        let target = temp.path().join("ssh_keys.json");

        backend.write_file_content(&target, "first").await.unwrap();
        backend.write_file_content(&target, "second").await.unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "second");
        assert!(!temp.path().join("ssh_keys.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_into_missing_dir_fails() {
        let temp = tempdir().unwrap();
        let backend = LocalFileBackend::with_base(temp.path().to_path_buf());
        let target = temp.path().join("missing").join("ssh_keys.json");

        let err = backend.write_file_content(&target, "{}").await.unwrap_err();
        assert_eq!(err.operation, "write_file_content");
    }

    #[tokio::test]
    async fn test_write_atomic_rejects_path_without_file_name() {
        let err = write_atomic(Path::new("/"), "{}").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_default_export_dir_is_base() {
        let temp = tempdir().unwrap();
        let backend = LocalFileBackend::with_base(temp.path().to_path_buf());
        assert_eq!(backend.default_export_dir().await.unwrap(), temp.path());
    }
}
