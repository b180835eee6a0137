//! Key record types shared with the backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::KeyError;

/// Current export envelope version
pub const EXPORT_VERSION: &str = "1.0";

/// Supported key algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SshKeyType {
    #[serde(alias = "RSA", alias = "rsa")]
    Rsa,
    #[serde(alias = "ED25519", alias = "ed25519")]
    Ed25519,
    #[serde(alias = "ECDSA", alias = "ecdsa")]
    Ecdsa,
}

impl SshKeyType {
    /// Key sizes (bits) the backend can generate for this algorithm
    pub fn supported_sizes(&self) -> &'static [u32] {
        match self {
            SshKeyType::Rsa => &[2048, 3072, 4096],
            SshKeyType::Ed25519 => &[256],
            SshKeyType::Ecdsa => &[256, 384, 521],
        }
    }

    pub fn default_size(&self) -> u32 {
        match self {
            SshKeyType::Rsa => 4096,
            SshKeyType::Ed25519 | SshKeyType::Ecdsa => 256,
        }
    }
}

impl fmt::Display for SshKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SshKeyType::Rsa => "RSA",
            SshKeyType::Ed25519 => "Ed25519",
            SshKeyType::Ecdsa => "ECDSA",
        };
        f.write_str(name)
    }
}

/// One managed key pair
///
/// `id` is assigned by the backend and never changes. `fingerprint` is
/// derived by the backend and never edited here. `private_key` is the
/// encrypted blob as stored by the backend; this crate never looks inside.
/// `created_at` has no default, so a record without it does not decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SshKeyRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub key_type: SshKeyType,
    #[serde(default)]
    pub key_size: u32,
    #[serde(default)]
    pub comment: String,
    pub public_key: String,
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
}

/// Key generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyGenerationParams {
    pub name: String,
    pub key_type: SshKeyType,
    pub key_size: u32,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,
}

impl KeyGenerationParams {
    /// Params with the algorithm's default size and no comment
    pub fn new(name: impl Into<String>, key_type: SshKeyType) -> Self {
        Self {
            name: name.into(),
            key_type,
            key_size: key_type.default_size(),
            comment: String::new(),
            passphrase: None,
        }
    }

    /// Local form validation, run before anything reaches the backend
    pub fn validate(&self) -> Result<(), KeyError> {
        if self.name.trim().is_empty() {
            return Err(KeyError::Validation("key name must not be empty".to_string()));
        }

        if !self.key_type.supported_sizes().contains(&self.key_size) {
            return Err(KeyError::Validation(format!(
                "{} keys do not support a size of {} bits (supported: {:?})",
                self.key_type,
                self.key_size,
                self.key_type.supported_sizes()
            )));
        }

        Ok(())
    }
}

/// Versioned bulk export container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEnvelope {
    pub version: String,
    pub keys: Vec<SshKeyRecord>,
    pub exported_at: DateTime<Utc>,
}

impl ExportEnvelope {
    pub fn new(keys: Vec<SshKeyRecord>) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            keys,
            exported_at: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_type_aliases() {
        let parsed: Vec<SshKeyType> =
            serde_json::from_str(r#"["Rsa", "RSA", "ed25519", "ECDSA"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                SshKeyType::Rsa,
                SshKeyType::Rsa,
                SshKeyType::Ed25519,
                SshKeyType::Ecdsa
            ]
        );
        assert!(serde_json::from_str::<SshKeyType>(r#""Dsa""#).is_err());
    }

    #[test]
    fn test_record_optional_fields_default() {
        let record: SshKeyRecord = serde_json::from_str(
            r#"{"id": "a", "key_type": "Ed25519", "public_key": "ssh-ed25519 AAAA",
                "created_at": "2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(record.id, "a");
        assert!(record.name.is_empty());
        assert_eq!(record.key_size, 0);
        assert!(record.last_used.is_none());
    }

    #[test]
    fn test_record_requires_created_at() {
        let result = serde_json::from_str::<SshKeyRecord>(
            r#"{"id": "a", "key_type": "Ed25519", "public_key": "ssh-ed25519 AAAA"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_params() {
        assert!(KeyGenerationParams::new("work", SshKeyType::Ed25519)
            .validate()
            .is_ok());
        assert!(KeyGenerationParams::new("work", SshKeyType::Rsa)
            .validate()
            .is_ok());

        let blank = KeyGenerationParams::new("   ", SshKeyType::Ed25519);
        assert!(matches!(blank.validate(), Err(KeyError::Validation(_))));

        let mut odd = KeyGenerationParams::new("work", SshKeyType::Ecdsa);
        odd.key_size = 512;
        assert!(matches!(odd.validate(), Err(KeyError::Validation(_))));

        let mut small_rsa = KeyGenerationParams::new("legacy", SshKeyType::Rsa);
        small_rsa.key_size = 1024;
        assert!(small_rsa.validate().is_err());
    }

    #[test]
    fn test_envelope_json_shape() {
        let envelope = ExportEnvelope::new(Vec::new());
        let value: serde_json::Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();

        assert_eq!(value["version"], "1.0");
        assert!(value["keys"].as_array().unwrap().is_empty());
        assert!(value["exported_at"].is_string());
    }
}
