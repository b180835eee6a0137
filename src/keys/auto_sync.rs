//! Auto-Sync Policy
//!
//! Mirrors the key registry to `{dir}/ssh_keys.json` after every confirmed
//! mutation. Writes are fire-and-forget for the caller: jobs are queued to a
//! single writer task, which keeps them in mutation order, and failures are
//! logged, never returned.
//!
//! ```text
//! Disabled ──reconfigure(enabled)──▶ Enabled { override_dir }
//!    ▲                                      │
//!    └──────reconfigure(disabled)───────────┘
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::types::{ExportEnvelope, SshKeyRecord};
use crate::backend::{BackendError, FileBackend};
use crate::config::settings::AutoSyncConfig;

/// File name of the mirror inside the export directory
pub const MIRROR_FILE_NAME: &str = "ssh_keys.json";

/// Policy state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Disabled,
    /// `override_dir: None` resolves to the backend's default directory
    Enabled { override_dir: Option<PathBuf> },
}

impl From<&AutoSyncConfig> for SyncState {
    fn from(config: &AutoSyncConfig) -> Self {
        if config.auto_export_enabled {
            SyncState::Enabled {
                override_dir: config.effective_dir().map(Path::to_path_buf),
            }
        } else {
            SyncState::Disabled
        }
    }
}

/// Mirror write failures (logged by the writer, never surfaced)
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Export directory {0:?} could not be created")]
    DirectoryUnavailable(PathBuf),

    #[error("Backend refused to write {0:?}")]
    WriteRejected(PathBuf),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

enum SyncJob {
    Write {
        override_dir: Option<PathBuf>,
        keys: Vec<SshKeyRecord>,
    },
    Flush(oneshot::Sender<()>),
}

/// Decides whether a mutation is mirrored and dispatches the write
pub struct AutoSyncPolicy {
    files: Arc<dyn FileBackend>,
    state: RwLock<SyncState>,
    queue: Mutex<Option<mpsc::UnboundedSender<SyncJob>>>,
}

impl AutoSyncPolicy {
    pub fn new(config: &AutoSyncConfig, files: Arc<dyn FileBackend>) -> Self {
        let state = SyncState::from(config);
        info!("Auto-sync initialized: {:?}", state);
        Self {
            files,
            state: RwLock::new(state),
            queue: Mutex::new(None),
        }
    }

    pub fn disabled(files: Arc<dyn FileBackend>) -> Self {
        Self::new(&AutoSyncConfig::default(), files)
    }

    /// Apply changed settings; affects mutations triggered from now on
    pub fn reconfigure(&self, config: &AutoSyncConfig) {
        let next = SyncState::from(config);
        let mut state = self.state.write();
        if *state != next {
            info!("Auto-sync reconfigured: {:?} -> {:?}", *state, next);
            *state = next;
        }
    }

    pub fn state(&self) -> SyncState {
        self.state.read().clone()
    }

    pub fn is_enabled(&self) -> bool {
        matches!(*self.state.read(), SyncState::Enabled { .. })
    }

    /// Queue a mirror write of `keys`, the list as it stands right after the
    /// triggering mutation. Returns whether a write was queued.
    pub fn trigger(&self, keys: Vec<SshKeyRecord>) -> bool {
        let override_dir = match &*self.state.read() {
            SyncState::Disabled => {
                debug!("Auto-sync disabled, skipping mirror write");
                return false;
            }
            SyncState::Enabled { override_dir } => override_dir.clone(),
        };

        self.dispatch(SyncJob::Write { override_dir, keys })
    }

    /// Wait until every job queued so far has been processed
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.dispatch(SyncJob::Flush(done_tx)) {
            let _ = done_rx.await;
        }
    }

    fn dispatch(&self, job: SyncJob) -> bool {
        let mut queue = self.queue.lock();

        let job = match queue.as_ref() {
            Some(tx) => match tx.send(job) {
                Ok(()) => return true,
                // Writer task is gone (runtime shut down); start a new one
                Err(mpsc::error::SendError(job)) => job,
            },
            None => job,
        };

        if matches!(job, SyncJob::Flush(_)) && queue.is_none() {
            // Nothing was ever queued
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Auto-sync needs a tokio runtime, mirror write dropped: {}", e);
                return false;
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let writer = MirrorWriter::new(self.files.clone());
        runtime.spawn(writer.run(rx));

        let queued = tx.send(job).is_ok();
        *queue = Some(tx);
        queued
    }
}

/// Background writer; caches only the resolved default directory
struct MirrorWriter {
    files: Arc<dyn FileBackend>,
    default_dir: Option<PathBuf>,
}

impl MirrorWriter {
    fn new(files: Arc<dyn FileBackend>) -> Self {
        Self {
            files,
            default_dir: None,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<SyncJob>) {
        while let Some(job) = rx.recv().await {
            match job {
                SyncJob::Write { override_dir, keys } => {
                    let count = keys.len();
                    match self.write(override_dir, keys).await {
                        Ok(path) => info!("Auto-sync wrote {} keys to {:?}", count, path),
                        Err(e) => error!("Auto-sync failed: {}", e),
                    }
                }
                SyncJob::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        debug!("Auto-sync writer stopped");
    }

    async fn write(
        &mut self,
        override_dir: Option<PathBuf>,
        keys: Vec<SshKeyRecord>,
    ) -> Result<PathBuf, SyncError> {
        let dir = self.resolve_dir(override_dir).await?;
        let json = ExportEnvelope::new(keys).to_json()?;
        let path = dir.join(MIRROR_FILE_NAME);

        if !self.files.write_file_content(&path, &json).await? {
            return Err(SyncError::WriteRejected(path));
        }
        Ok(path)
    }

    async fn resolve_dir(&mut self, override_dir: Option<PathBuf>) -> Result<PathBuf, SyncError> {
        let dir = match override_dir {
            Some(dir) => dir,
            None => match &self.default_dir {
                Some(dir) => dir.clone(),
                None => {
                    let dir = self.files.default_export_dir().await?;
                    self.default_dir = Some(dir.clone());
                    dir
                }
            },
        };

        // Checked on every write: the directory may vanish between mutations
        if !self.files.ensure_dir_exists(&dir).await? {
            return Err(SyncError::DirectoryUnavailable(dir));
        }

        Ok(dir)
    }
}
