//! SSH host option catalog
//!
//! Common OpenSSH host-level directives, spelled the way the OpenSSH manual
//! capitalizes them. The order of `KNOWN_OPTIONS` is the default form order.
//! Names outside the catalog are legal and classify as free text.

use serde::Serialize;

/// Directive names in display order
pub const KNOWN_OPTIONS: [&str; 24] = [
    "HostName",
    "User",
    "Port",
    "IdentityFile",
    "ProxyJump",
    "ProxyCommand",
    "ForwardAgent",
    "ForwardX11",
    "StrictHostKeyChecking",
    "UserKnownHostsFile",
    "PreferredAuthentications",
    "ServerAliveInterval",
    "ServerAliveCountMax",
    "Compression",
    "IdentitiesOnly",
    "AddKeysToAgent",
    "ControlMaster",
    "ControlPath",
    "ControlPersist",
    "LocalForward",
    "RemoteForward",
    "SendEnv",
    "SetEnv",
    "LogLevel",
];

const BOOLEAN_VALUES: &[&str] = &["yes", "no"];

/// Value kind of a directive, used to pick a form control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum OptionKind {
    Text,
    Boolean,
    Enum(&'static [&'static str]),
}

impl OptionKind {
    /// Allowed values for closed kinds, lowercase
    pub fn values(&self) -> Option<&'static [&'static str]> {
        match self {
            OptionKind::Text => None,
            OptionKind::Boolean => Some(BOOLEAN_VALUES),
            OptionKind::Enum(values) => Some(values),
        }
    }

    /// Check a value against this kind (case-insensitive for closed kinds)
    pub fn accepts(&self, value: &str) -> bool {
        match self.values() {
            None => true,
            Some(values) => {
                let value = value.trim();
                values.iter().any(|v| v.eq_ignore_ascii_case(value))
            }
        }
    }
}

/// Value kind for a directive name; unknown names are free text
pub fn classify(option_name: &str) -> OptionKind {
    match option_name {
        "ForwardAgent" | "ForwardX11" | "Compression" | "IdentitiesOnly" => OptionKind::Boolean,
        "StrictHostKeyChecking" => OptionKind::Enum(&["yes", "no", "accept-new"]),
        "AddKeysToAgent" => OptionKind::Enum(&["yes", "no", "confirm"]),
        "ControlMaster" => OptionKind::Enum(&["yes", "no", "auto"]),
        "LogLevel" => OptionKind::Enum(&["quiet", "error", "info", "verbose", "debug"]),
        _ => OptionKind::Text,
    }
}

pub fn known_option_names() -> &'static [&'static str] {
    &KNOWN_OPTIONS
}

pub fn is_known_option(option_name: &str) -> bool {
    KNOWN_OPTIONS.contains(&option_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_is_stable_and_unique() {
        let names = known_option_names();
        assert_eq!(names.len(), 24);
        assert_eq!(names, known_option_names());
        assert_eq!(names[0], "HostName");

        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("ForwardAgent"), OptionKind::Boolean);
        assert_eq!(classify("HostName"), OptionKind::Text);
        assert_eq!(
            classify("StrictHostKeyChecking").values(),
            Some(&["yes", "no", "accept-new"][..])
        );
        // Case-sensitive: a different spelling is an unknown name
        assert_eq!(classify("forwardagent"), OptionKind::Text);
        assert_eq!(classify("CanonicalizeHostname"), OptionKind::Text);
    }

    #[test]
    fn test_every_typed_option_is_known() {
        let typed = known_option_names()
            .iter()
            .filter(|name| classify(name) != OptionKind::Text)
            .count();
        assert_eq!(typed, 8);

        assert!(is_known_option("LogLevel"));
        assert!(!is_known_option("loglevel"));
    }

    #[test]
    fn test_accepts() {
        assert!(OptionKind::Boolean.accepts("yes"));
        assert!(OptionKind::Boolean.accepts("No"));
        assert!(!OptionKind::Boolean.accepts("true"));
        assert!(classify("ControlMaster").accepts("auto"));
        assert!(!classify("ControlMaster").accepts("accept-new"));
        assert!(OptionKind::Text.accepts("anything at all"));
    }

    #[test]
    fn test_kind_serializes_for_forms() {
        let json = serde_json::to_value(classify("AddKeysToAgent")).unwrap();
        assert_eq!(json["type"], "enum");
        assert_eq!(json["values"][2], "confirm");

        let json = serde_json::to_value(OptionKind::Boolean).unwrap();
        assert_eq!(json["type"], "boolean");
    }
}
