//! Option reconciliation
//!
//! `expand` turns a sparse directive map into the full, ordered row list a
//! host form renders; `compact` turns edited rows back into a sparse map.
//! For any map whose keys and values are non-empty and trimmed,
//! `compact(&expand(Some(&m), &[])) == m`.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::ssh_options::{classify, known_option_names, OptionKind};

/// One editable form row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionEntry {
    pub key: String,
    pub value: String,
}

impl OptionEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn kind(&self) -> OptionKind {
        classify(&self.key)
    }
}

/// Build the full row list:
/// 1. every catalog option, in catalog order
/// 2. every `extra` key not yet emitted, in the given order
/// 3. every remaining key of `existing`, sorted by name
///
/// Missing values are empty strings. Output depends only on the inputs.
pub fn expand(existing: Option<&HashMap<String, String>>, extra: &[String]) -> Vec<OptionEntry> {
    let lookup = |key: &str| -> String {
        existing
            .and_then(|map| map.get(key))
            .cloned()
            .unwrap_or_default()
    };

    let mut seen: HashSet<&str> = HashSet::new();
    let mut entries = Vec::with_capacity(known_option_names().len() + extra.len());

    for &key in known_option_names() {
        seen.insert(key);
        entries.push(OptionEntry::new(key, lookup(key)));
    }

    for key in extra {
        if seen.insert(key.as_str()) {
            entries.push(OptionEntry::new(key.as_str(), lookup(key)));
        }
    }

    if let Some(map) = existing {
        // HashMap iteration order is random; sort to keep output stable
        let mut leftover: Vec<(&String, &String)> = map
            .iter()
            .filter(|(key, _)| !seen.contains(key.as_str()))
            .collect();
        leftover.sort_by(|a, b| a.0.cmp(b.0));

        for (key, value) in leftover {
            entries.push(OptionEntry::new(key.as_str(), value.as_str()));
        }
    }

    entries
}

/// Collapse rows into a sparse map. Rows whose trimmed key or trimmed value
/// is empty are dropped; on duplicate keys the last row wins.
pub fn compact(entries: &[OptionEntry]) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for entry in entries {
        let key = entry.key.trim();
        let value = entry.value.trim();
        if !key.is_empty() && !value.is_empty() {
            out.insert(key.to_string(), value.to_string());
        }
    }
    out
}
