//! Key registry error types

use thiserror::Error;

use crate::backend::BackendError;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Invalid import format: {0}")]
    InvalidFormat(String),

    #[error("Import payload contains no keys")]
    NoValidKeys,

    #[error("All {rejected} keys in the import payload are invalid")]
    AllKeysInvalid { rejected: usize },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Make KeyError serializable for IPC replies
impl serde::Serialize for KeyError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
