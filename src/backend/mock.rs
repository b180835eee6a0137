//! In-memory backend for tests
//!
//! Implements every backend trait over plain vectors. Individual operations
//! can be made to fail by name, and file writes are recorded.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::{AuthBackend, BackendError, FileBackend, KeyBackend};
use crate::keys::types::{ExportEnvelope, KeyGenerationParams, SshKeyRecord, SshKeyType};

pub(crate) fn sample_key(id: &str) -> SshKeyRecord {
    SshKeyRecord {
        id: id.to_string(),
        name: format!("key {}", id),
        key_type: SshKeyType::Ed25519,
        key_size: 256,
        comment: "test@example.com".to_string(),
        public_key: format!("ssh-ed25519 AAAAC3Nz{}", id),
        private_key: "encrypted-blob".to_string(),
        fingerprint: format!("SHA256:{}", id),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        last_used: None,
    }
}

#[derive(Default)]
pub(crate) struct MockBackend {
    keys: Mutex<Vec<SshKeyRecord>>,
    failing: Mutex<HashSet<&'static str>>,
    next_id: Mutex<usize>,
    writes: Mutex<Vec<(PathBuf, String)>>,
    ensured: Mutex<Vec<PathBuf>>,
    refuse_dirs: Mutex<bool>,
    master_key: Mutex<Option<String>>,
    /// Overrides the real delete outcome when set
    delete_answer: Mutex<Option<bool>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys(keys: Vec<SshKeyRecord>) -> Self {
        let backend = Self::new();
        *backend.keys.lock() = keys;
        backend
    }

    pub fn fail_on(&self, operation: &'static str) {
        self.failing.lock().insert(operation);
    }

    pub fn heal(&self, operation: &'static str) {
        self.failing.lock().remove(operation);
    }

    pub fn refuse_dirs(&self) {
        *self.refuse_dirs.lock() = true;
    }

    pub fn answer_delete_with(&self, answer: bool) {
        *self.delete_answer.lock() = Some(answer);
    }

    pub fn stored_keys(&self) -> Vec<SshKeyRecord> {
        self.keys.lock().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }

    pub fn last_write(&self) -> Option<(PathBuf, String)> {
        self.writes.lock().last().cloned()
    }

    pub fn ensured_dirs(&self) -> Vec<PathBuf> {
        self.ensured.lock().clone()
    }

    pub fn default_dir(&self) -> PathBuf {
        PathBuf::from("/app-data")
    }

    fn check(&self, operation: &'static str) -> Result<(), BackendError> {
        if self.failing.lock().contains(operation) {
            Err(BackendError::new(operation, "injected failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyBackend for MockBackend {
    async fn get_all_keys(&self) -> Result<Vec<SshKeyRecord>, BackendError> {
        self.check("get_all_keys")?;
        Ok(self.keys.lock().clone())
    }

    async fn generate_ssh_key(
        &self,
        params: &KeyGenerationParams,
    ) -> Result<SshKeyRecord, BackendError> {
        self.check("generate_ssh_key")?;

        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            format!("generated-{}", *next)
        };
        let mut record = sample_key(&id);
        record.name = params.name.clone();
        record.key_type = params.key_type;
        record.key_size = params.key_size;
        record.comment = params.comment.clone();

        self.keys.lock().push(record.clone());
        Ok(record)
    }

    async fn delete_key(&self, id: &str) -> Result<bool, BackendError> {
        self.check("delete_key")?;
        let mut keys = self.keys.lock();
        let before = keys.len();
        keys.retain(|k| k.id != id);
        let deleted = keys.len() < before;
        Ok(self.delete_answer.lock().unwrap_or(deleted))
    }

    async fn import_keys(&self, raw_data: String) -> Result<Vec<SshKeyRecord>, BackendError> {
        self.check("import_keys")?;
        let incoming: Vec<SshKeyRecord> = serde_json::from_str(&raw_data)
            .map_err(|e| BackendError::new("import_keys", e.to_string()))?;

        let mut keys = self.keys.lock();
        let mut added = Vec::new();
        for key in incoming {
            if keys.iter().any(|k| k.id == key.id) {
                continue;
            }
            keys.push(key.clone());
            added.push(key);
        }
        Ok(added)
    }

    async fn export_all_keys(&self) -> Result<String, BackendError> {
        self.check("export_all_keys")?;
        ExportEnvelope::new(self.keys.lock().clone())
            .to_json()
            .map_err(|e| BackendError::new("export_all_keys", e.to_string()))
    }
}

#[async_trait]
impl FileBackend for MockBackend {
    async fn default_export_dir(&self) -> Result<PathBuf, BackendError> {
        self.check("default_export_dir")?;
        Ok(self.default_dir())
    }

    async fn ensure_dir_exists(&self, path: &Path) -> Result<bool, BackendError> {
        self.check("ensure_dir_exists")?;
        if *self.refuse_dirs.lock() {
            return Ok(false);
        }
        self.ensured.lock().push(path.to_path_buf());
        Ok(true)
    }

    async fn write_file_content(&self, path: &Path, content: &str) -> Result<bool, BackendError> {
        self.check("write_file_content")?;
        self.writes
            .lock()
            .push((path.to_path_buf(), content.to_string()));
        Ok(true)
    }
}

#[async_trait]
impl AuthBackend for MockBackend {
    async fn is_initialized(&self) -> Result<bool, BackendError> {
        self.check("is_initialized")?;
        Ok(self.master_key.lock().is_some())
    }

    async fn initialize_app(&self, master_key: &str) -> Result<bool, BackendError> {
        self.check("initialize_app")?;
        *self.master_key.lock() = Some(master_key.to_string());
        Ok(true)
    }

    async fn authenticate(&self, master_key: &str) -> Result<bool, BackendError> {
        self.check("authenticate")?;
        Ok(self.master_key.lock().as_deref() == Some(master_key))
    }
}
