//! Configuration Module
//!
//! SSH host option catalog and reconciliation, the host block model, and
//! persisted application settings.

pub mod reconcile;
pub mod settings;
pub mod ssh_config;
pub mod ssh_options;

pub use reconcile::{compact, expand, OptionEntry};
pub use settings::{config_dir, AutoSyncConfig, SettingsError, SettingsFile, SettingsStorage};
pub use ssh_config::{SshConfig, SshHostConfig};
pub use ssh_options::{classify, known_option_names, OptionKind};
