//! SSH client configuration model
//!
//! A `Host` block keeps HostName, User, Port and IdentityFile as dedicated
//! fields. Every other directive lives in `other_options`, and a promoted
//! directive must never appear in both places.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use super::reconcile::{compact, expand, OptionEntry};

/// One `Host` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshHostConfig {
    /// Host pattern, may contain `*` and `?` wildcards or several patterns
    pub host_pattern: String,
    /// Actual hostname (HostName directive)
    pub hostname: Option<String>,
    /// Username (User directive)
    pub user: Option<String>,
    /// Port number (Port directive)
    pub port: Option<u16>,
    /// Identity file path (IdentityFile directive)
    pub identity_file: Option<String>,
    /// Other directives, keyed by name as written
    #[serde(default)]
    pub other_options: HashMap<String, String>,
}

/// Directive names promoted out of `other_options`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Promoted {
    HostName,
    User,
    Port,
    IdentityFile,
}

impl Promoted {
    fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "hostname" => Some(Promoted::HostName),
            "user" => Some(Promoted::User),
            "port" => Some(Promoted::Port),
            "identityfile" | "identity_file" => Some(Promoted::IdentityFile),
            _ => None,
        }
    }
}

impl SshHostConfig {
    pub fn new(host_pattern: impl Into<String>) -> Self {
        Self {
            host_pattern: host_pattern.into(),
            ..Default::default()
        }
    }

    /// Build a host block from a sparse directive map, promoting the typed
    /// directives (matched case-insensitively). A port that does not parse
    /// as a number is dropped with a warning.
    pub fn from_options(host_pattern: impl Into<String>, options: HashMap<String, String>) -> Self {
        let mut host = Self::new(host_pattern);
        host.absorb(options);
        host
    }

    /// Re-apply promotion to `other_options`. Map entries override the
    /// dedicated fields they are promoted into.
    pub fn normalize(&mut self) {
        let options = std::mem::take(&mut self.other_options);
        self.absorb(options);
    }

    fn absorb(&mut self, options: HashMap<String, String>) {
        // Sorted so duplicate spellings ("Port"/"port") resolve the same way every time
        let mut options: Vec<(String, String)> = options.into_iter().collect();
        options.sort();

        for (key, value) in options {
            match Promoted::from_key(&key) {
                Some(Promoted::HostName) => self.hostname = Some(value),
                Some(Promoted::User) => self.user = Some(value),
                Some(Promoted::IdentityFile) => self.identity_file = Some(value),
                Some(Promoted::Port) => match value.trim().parse::<u16>() {
                    Ok(port) => self.port = Some(port),
                    Err(_) => warn!(
                        "Ignoring invalid {} value {:?} for host {}",
                        key, value, self.host_pattern
                    ),
                },
                None => {
                    self.other_options.insert(key, value);
                }
            }
        }
    }

    /// Every directive of this block as one sparse map, typed fields under
    /// their canonical names
    pub fn to_options(&self) -> HashMap<String, String> {
        let mut options = self.other_options.clone();
        if let Some(hostname) = &self.hostname {
            options.insert("HostName".to_string(), hostname.clone());
        }
        if let Some(user) = &self.user {
            options.insert("User".to_string(), user.clone());
        }
        if let Some(port) = self.port {
            options.insert("Port".to_string(), port.to_string());
        }
        if let Some(identity_file) = &self.identity_file {
            options.insert("IdentityFile".to_string(), identity_file.clone());
        }
        options
    }

    /// Full form rows for this block
    pub fn form_entries(&self, extra: &[String]) -> Vec<OptionEntry> {
        expand(Some(&self.to_options()), extra)
    }

    /// Replace every directive with the edited form rows
    pub fn apply_form_entries(&mut self, entries: &[OptionEntry]) {
        let pattern = std::mem::take(&mut self.host_pattern);
        *self = Self::from_options(pattern, compact(entries));
    }

    /// Get the effective hostname (hostname or pattern)
    pub fn effective_hostname(&self) -> &str {
        self.hostname.as_deref().unwrap_or(&self.host_pattern)
    }

    /// Get effective port (port or 22)
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(22)
    }

    /// Check if this is a wildcard pattern
    pub fn is_wildcard(&self) -> bool {
        self.host_pattern.contains('*') || self.host_pattern.contains('?')
    }
}

/// A whole client configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshConfig {
    pub hosts: Vec<SshHostConfig>,
    #[serde(default)]
    pub global_settings: HashMap<String, String>,
}

impl SshConfig {
    pub fn find_host(&self, host_pattern: &str) -> Option<&SshHostConfig> {
        self.hosts.iter().find(|h| h.host_pattern == host_pattern)
    }
}
