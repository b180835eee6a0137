//! Settings Storage
//!
//! Persists user settings (auto-export flag and directory) as JSON.
//! Location: ~/.keyshelf on macOS/Linux, %APPDATA%\Keyshelf on Windows

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::backend::local_fs::write_atomic;

/// Current settings file version
pub const SETTINGS_VERSION: u32 = 1;

/// Settings storage errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to determine config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings version {found} is newer than supported {supported}")]
    VersionTooNew { found: u32, supported: u32 },
}

/// Get the Keyshelf configuration directory
/// Returns %APPDATA%\Keyshelf on Windows, ~/.keyshelf on macOS/Linux
pub fn config_dir() -> Result<PathBuf, SettingsError> {
    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            return Ok(app_data.join("Keyshelf"));
        }
        dirs::home_dir()
            .map(|home| home.join(".keyshelf"))
            .ok_or(SettingsError::NoConfigDir)
    }

    #[cfg(not(windows))]
    {
        dirs::home_dir()
            .map(|home| home.join(".keyshelf"))
            .ok_or(SettingsError::NoConfigDir)
    }
}

/// Get the settings file path
pub fn settings_file() -> Result<PathBuf, SettingsError> {
    Ok(config_dir()?.join("settings.json"))
}

/// Auto-export configuration consumed by the auto-sync policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSyncConfig {
    #[serde(default)]
    pub auto_export_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_export_dir: Option<PathBuf>,
}

impl AutoSyncConfig {
    /// Export directory override, ignoring a blank value
    pub fn effective_dir(&self) -> Option<&Path> {
        self.auto_export_dir
            .as_deref()
            .filter(|dir| !dir.as_os_str().to_string_lossy().trim().is_empty())
    }
}

/// On-disk settings document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsFile {
    pub version: u32,
    #[serde(default)]
    pub auto_sync: AutoSyncConfig,
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            auto_sync: AutoSyncConfig::default(),
        }
    }
}

/// Reads and writes the settings document at a fixed path
pub struct SettingsStorage {
    path: PathBuf,
}

impl SettingsStorage {
    /// Storage at `settings_file()`
    pub fn new() -> Result<Self, SettingsError> {
        Ok(Self {
            path: settings_file()?,
        })
    }

    /// Storage at a custom path (for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as defaults. An unparsable file is copied aside
    /// and also reads as defaults; only a newer version is an error.
    pub async fn load(&self) -> Result<SettingsFile, SettingsError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SettingsFile::default()),
            Err(e) => return Err(e.into()),
        };

        let settings: SettingsFile = match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Unreadable settings at {:?}: {}", self.path, e);
                self.set_aside().await;
                return Ok(SettingsFile::default());
            }
        };

        if settings.version > SETTINGS_VERSION {
            return Err(SettingsError::VersionTooNew {
                found: settings.version,
                supported: SETTINGS_VERSION,
            });
        }

        debug!("Settings loaded, auto-export {}", settings.auto_sync.auto_export_enabled);
        Ok(settings)
    }

    pub async fn save(&self, settings: &SettingsFile) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        write_atomic(&self.path, &json).await?;

        info!("Settings saved to {:?}", self.path);
        Ok(())
    }

    /// Load, change the auto-sync section, save; returns the new config
    pub async fn update_auto_sync<F>(&self, f: F) -> Result<AutoSyncConfig, SettingsError>
    where
        F: FnOnce(&mut AutoSyncConfig),
    {
        let mut settings = self.load().await?;
        f(&mut settings.auto_sync);
        self.save(&settings).await?;
        Ok(settings.auto_sync)
    }

    /// Copy the settings file to `settings.json.backup.<timestamp>`
    pub async fn backup(&self) -> Result<PathBuf, SettingsError> {
        let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let backup_path = self.path.with_extension(format!("json.backup.{}", stamp));
        fs::copy(&self.path, &backup_path).await?;
        Ok(backup_path)
    }

    async fn set_aside(&self) {
        match self.backup().await {
            Ok(copy) => warn!("Kept unreadable settings as {:?}, using defaults", copy),
            Err(e) => error!("Could not copy unreadable settings aside: {}", e),
        }
    }
}
