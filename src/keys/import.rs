//! Import payload normalization
//!
//! Accepts three shapes, first match wins:
//! 1. export envelope: an object whose `keys` field is a list
//! 2. a bare list of records
//! 3. a single record object
//!
//! Every element is then checked on its own. Bad elements are counted and
//! dropped; only a payload with nothing usable is an error.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::KeyError;
use super::types::SshKeyRecord;

/// Fields a record must carry to be accepted
pub const REQUIRED_FIELDS: [&str; 3] = ["id", "key_type", "public_key"];

/// Outcome of normalizing an import payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBatch {
    pub accepted: Vec<SshKeyRecord>,
    pub rejected_count: usize,
}

impl ImportBatch {
    /// Some records were dropped; callers surface this as a warning
    pub fn is_partial(&self) -> bool {
        self.rejected_count > 0
    }
}

/// Normalize raw import text
pub fn normalize_import_text(raw: &str) -> Result<ImportBatch, KeyError> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| KeyError::InvalidFormat(format!("payload is not valid JSON: {}", e)))?;
    normalize_import_value(value)
}

/// Normalize an already decoded import payload
pub fn normalize_import_value(value: Value) -> Result<ImportBatch, KeyError> {
    let candidates = extract_candidates(value)?;
    let total = candidates.len();

    let mut accepted = Vec::with_capacity(total);
    let mut rejected_count = 0;

    for (index, candidate) in candidates.into_iter().enumerate() {
        match validate_record(candidate) {
            Ok(record) => accepted.push(record),
            Err(reason) => {
                debug!("Rejected import element {}: {}", index, reason);
                rejected_count += 1;
            }
        }
    }

    if accepted.is_empty() {
        return if rejected_count == 0 {
            Err(KeyError::NoValidKeys)
        } else {
            Err(KeyError::AllKeysInvalid {
                rejected: rejected_count,
            })
        };
    }

    if rejected_count > 0 {
        warn!(
            "Import accepted {} of {} keys ({} rejected)",
            accepted.len(),
            total,
            rejected_count
        );
    }

    Ok(ImportBatch {
        accepted,
        rejected_count,
    })
}

fn extract_candidates(value: Value) -> Result<Vec<Value>, KeyError> {
    match value {
        Value::Object(mut map) => {
            if matches!(map.get("keys"), Some(Value::Array(_))) {
                if let Some(Value::Array(keys)) = map.remove("keys") {
                    return Ok(keys);
                }
            }

            let object = Value::Object(map);
            if has_required_fields(&object) {
                Ok(vec![object])
            } else {
                Err(KeyError::InvalidFormat(
                    "object is neither an export envelope nor a key record".to_string(),
                ))
            }
        }
        Value::Array(items) => Ok(items),
        other => Err(KeyError::InvalidFormat(format!(
            "expected an object or a list, found {}",
            json_kind(&other)
        ))),
    }
}

fn has_required_fields(value: &Value) -> bool {
    REQUIRED_FIELDS
        .iter()
        .all(|field| matches!(value.get(field), Some(Value::String(s)) if !s.trim().is_empty()))
}

fn validate_record(value: Value) -> Result<SshKeyRecord, String> {
    if !value.is_object() {
        return Err(format!("expected an object, found {}", json_kind(&value)));
    }
    if let Some(missing) = REQUIRED_FIELDS.iter().find(|field| {
        !matches!(value.get(**field), Some(Value::String(s)) if !s.trim().is_empty())
    }) {
        return Err(format!("missing required field `{}`", missing));
    }

    serde_json::from_value(value).map_err(|e| e.to_string())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
