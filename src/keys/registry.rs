//! Key Registry
//!
//! In-memory, ordered mirror of the backend's key store. Every mutation is
//! sent to the backend first and applied locally only after the backend
//! confirms it, so the list never shows a key the backend has not stored
//! and never keeps one the backend has deleted.
//!
//! Mutations are serialized by `op_lock`, held across the backend call.
//! After each confirmed mutation the post-mutation list is handed to the
//! auto-sync policy without waiting for the mirror write.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::auto_sync::AutoSyncPolicy;
use super::error::KeyError;
use super::import::{normalize_import_text, normalize_import_value, ImportBatch};
use super::types::{KeyGenerationParams, SshKeyRecord};
use crate::backend::KeyBackend;

#[derive(Debug, Default)]
struct RegistryState {
    keys: Vec<SshKeyRecord>,
    /// Compared by value on access; may name a key that no longer exists
    selected_id: Option<String>,
}

/// Result of an import
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    /// Records the backend stored, now appended to the registry
    pub accepted: Vec<SshKeyRecord>,
    /// Payload elements dropped by validation
    pub rejected_count: usize,
    /// Valid records the backend did not store (already present)
    pub skipped_count: usize,
}

pub struct KeyRegistry {
    backend: Arc<dyn KeyBackend>,
    auto_sync: Arc<AutoSyncPolicy>,
    state: RwLock<RegistryState>,
    op_lock: Mutex<()>,
}

impl KeyRegistry {
    pub fn new(backend: Arc<dyn KeyBackend>, auto_sync: Arc<AutoSyncPolicy>) -> Self {
        Self {
            backend,
            auto_sync,
            state: RwLock::new(RegistryState::default()),
            op_lock: Mutex::new(()),
        }
    }

    pub fn auto_sync(&self) -> &AutoSyncPolicy {
        &self.auto_sync
    }

    // ═══════════════════════════════════════════════════════════════════
    // Snapshots
    // ═══════════════════════════════════════════════════════════════════

    /// Keys in display order
    pub fn snapshot(&self) -> Vec<SshKeyRecord> {
        self.state.read().keys.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().keys.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<SshKeyRecord> {
        self.state.read().keys.iter().find(|k| k.id == id).cloned()
    }

    pub fn selected_id(&self) -> Option<String> {
        self.state.read().selected_id.clone()
    }

    /// The selected record, if the selection still names an existing key
    pub fn selected(&self) -> Option<SshKeyRecord> {
        let state = self.state.read();
        let id = state.selected_id.as_deref()?;
        state.keys.iter().find(|k| k.id == id).cloned()
    }

    /// Local selection change only; no backend call, no mirror write
    pub fn select(&self, id: Option<&str>) {
        self.state.write().selected_id = id.map(str::to_string);
    }

    // ═══════════════════════════════════════════════════════════════════
    // Backend-confirmed operations
    // ═══════════════════════════════════════════════════════════════════

    /// Replace the local list with the backend's. On failure the local list
    /// is left as it was.
    pub async fn load(&self) -> Result<usize, KeyError> {
        let _guard = self.op_lock.lock().await;

        let keys = match self.backend.get_all_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Failed to load keys, keeping current list: {}", e);
                return Err(e.into());
            }
        };

        let count = keys.len();
        self.state.write().keys = keys;
        info!("Loaded {} keys", count);
        Ok(count)
    }

    /// Generate a key and append it. Params are validated locally first.
    pub async fn generate(&self, params: KeyGenerationParams) -> Result<SshKeyRecord, KeyError> {
        params.validate()?;
        let _guard = self.op_lock.lock().await;

        let record = match self.backend.generate_ssh_key(&params).await {
            Ok(record) => record,
            Err(e) => {
                error!("Key generation failed: {}", e);
                return Err(e.into());
            }
        };

        let snapshot = {
            let mut state = self.state.write();
            state.keys.push(record.clone());
            state.keys.clone()
        };
        info!("Generated {} key {} ({})", record.key_type, record.id, record.name);

        self.auto_sync.trigger(snapshot);
        Ok(record)
    }

    /// Delete a key. Returns true only when the backend confirmed the
    /// deletion; backend failures are logged and reported as false.
    pub async fn delete(&self, id: &str) -> bool {
        let _guard = self.op_lock.lock().await;

        match self.backend.delete_key(id).await {
            Ok(true) => {}
            Ok(false) => {
                debug!("Backend did not delete key {}", id);
                return false;
            }
            Err(e) => {
                warn!("Failed to delete key {}: {}", id, e);
                return false;
            }
        }

        let snapshot = {
            let mut state = self.state.write();
            state.keys.retain(|k| k.id != id);
            if state.selected_id.as_deref() == Some(id) {
                state.selected_id = None;
            }
            state.keys.clone()
        };
        info!("Deleted key {}", id);

        self.auto_sync.trigger(snapshot);
        true
    }

    /// Import keys from raw payload text
    pub async fn import_many(&self, raw: &str) -> Result<ImportOutcome, KeyError> {
        let batch = normalize_import_text(raw)?;
        self.import_batch(batch).await
    }

    /// Import keys from an already decoded payload
    pub async fn import_value(&self, value: Value) -> Result<ImportOutcome, KeyError> {
        let batch = normalize_import_value(value)?;
        self.import_batch(batch).await
    }

    async fn import_batch(&self, batch: ImportBatch) -> Result<ImportOutcome, KeyError> {
        let ImportBatch {
            accepted,
            rejected_count,
        } = batch;
        let valid_count = accepted.len();
        let raw = serde_json::to_string(&accepted)?;

        let _guard = self.op_lock.lock().await;

        let stored = match self.backend.import_keys(raw).await {
            Ok(stored) => stored,
            Err(e) => {
                error!("Key import failed: {}", e);
                return Err(e.into());
            }
        };

        let (appended, snapshot) = {
            let mut state = self.state.write();
            let mut known: HashSet<String> = state.keys.iter().map(|k| k.id.clone()).collect();
            let mut appended = Vec::with_capacity(stored.len());

            for record in stored {
                if known.insert(record.id.clone()) {
                    state.keys.push(record.clone());
                    appended.push(record);
                } else {
                    debug!("Import returned already listed key {}, not appending", record.id);
                }
            }
            (appended, state.keys.clone())
        };

        info!(
            "Imported {} keys ({} rejected, {} skipped)",
            appended.len(),
            rejected_count,
            valid_count.saturating_sub(appended.len())
        );

        if !appended.is_empty() {
            self.auto_sync.trigger(snapshot);
        }

        Ok(ImportOutcome {
            skipped_count: valid_count.saturating_sub(appended.len()),
            accepted: appended,
            rejected_count,
        })
    }

    /// Serialized export envelope of every key, straight from the backend
    pub async fn export_all(&self) -> Result<String, KeyError> {
        Ok(self.backend.export_all_keys().await?)
    }
}
