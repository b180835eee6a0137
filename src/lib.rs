//! Keyshelf - SSH key registry and SSH client configuration core
//!
//! The presentation layer and the privileged backend (key generation,
//! encryption at rest, file access) live elsewhere. This crate owns the
//! data rules in between:
//! - reconciling typed SSH host options with sparse directive maps
//! - keeping the in-memory key registry consistent with its JSON mirror
//! - normalizing import payloads while tolerating partially invalid input

pub mod auth;
pub mod backend;
pub mod config;
pub mod keys;

pub use auth::{AuthError, AuthSession, AuthState};
pub use backend::{AuthBackend, BackendError, FileBackend, KeyBackend, LocalFileBackend};
pub use keys::{AutoSyncPolicy, KeyError, KeyRegistry, SshKeyRecord};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging
///
/// Level defaults to `info` and can be overridden with `RUST_LOG`.
/// Calling this more than once is harmless.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
