//! Key Management Module
//!
//! Key record types, the in-memory registry, its JSON mirror, and import
//! payload normalization.

pub mod auto_sync;
pub mod error;
pub mod import;
pub mod registry;
pub mod types;

pub use auto_sync::{AutoSyncPolicy, SyncState, MIRROR_FILE_NAME};
pub use error::KeyError;
pub use import::{normalize_import_text, normalize_import_value, ImportBatch};
pub use registry::{ImportOutcome, KeyRegistry};
pub use types::{ExportEnvelope, KeyGenerationParams, SshKeyRecord, SshKeyType, EXPORT_VERSION};
