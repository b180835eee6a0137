//! Backend boundary
//!
//! The privileged backend owns key generation, encryption at rest and all
//! file access. This crate only talks to it through the traits below, one
//! per concern, so each side can be swapped or faked independently.

pub mod local_fs;
#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::keys::types::{KeyGenerationParams, SshKeyRecord};

pub use local_fs::LocalFileBackend;

/// Any failure of an external call (IPC, backend-internal, IO behind it)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Backend call `{operation}` failed: {message}")]
pub struct BackendError {
    pub operation: &'static str,
    pub message: String,
}

impl BackendError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

// Make BackendError serializable for IPC replies
impl serde::Serialize for BackendError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Key store operations (authoritative list lives in the backend)
#[async_trait]
pub trait KeyBackend: Send + Sync {
    /// Full authoritative key list
    async fn get_all_keys(&self) -> Result<Vec<SshKeyRecord>, BackendError>;

    /// Create a key pair; the returned record carries the backend-assigned id
    async fn generate_ssh_key(
        &self,
        params: &KeyGenerationParams,
    ) -> Result<SshKeyRecord, BackendError>;

    /// Returns true iff a record with this id was deleted
    async fn delete_key(&self, id: &str) -> Result<bool, BackendError>;

    /// Import serialized records, returns the ones actually stored
    async fn import_keys(&self, raw_data: String) -> Result<Vec<SshKeyRecord>, BackendError>;

    /// Serialized export envelope of every stored key
    async fn export_all_keys(&self) -> Result<String, BackendError>;
}

/// File operations used by the auto-sync mirror
#[async_trait]
pub trait FileBackend: Send + Sync {
    /// Directory used when no export directory override is configured
    async fn default_export_dir(&self) -> Result<PathBuf, BackendError>;

    async fn ensure_dir_exists(&self, path: &Path) -> Result<bool, BackendError>;

    /// All-or-nothing write, replacing any previous content
    async fn write_file_content(&self, path: &Path, content: &str) -> Result<bool, BackendError>;
}

/// Master-key lifecycle
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn is_initialized(&self) -> Result<bool, BackendError>;

    async fn initialize_app(&self, master_key: &str) -> Result<bool, BackendError>;

    async fn authenticate(&self, master_key: &str) -> Result<bool, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display_and_serialize() {
        let err = BackendError::new("delete_key", "storage locked");
        assert_eq!(
            err.to_string(),
            "Backend call `delete_key` failed: storage locked"
        );

        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Backend call `delete_key` failed: storage locked\"");
    }
}
