//! Declared setup fields
//!
//! The setup document has a fixed set of fields. Their wire keys, input
//! kinds, defaults and pairing constraints live here so the validator and
//! the HTTP schema endpoint read the same table.

use serde::Serialize;

use crate::sync::SyncPolicy;

pub const PACKAGIST_SYNC: &str = "packagist_sync";
pub const DIST_SYNC_MODE: &str = "dist_sync_mode";
pub const GIT_PATH: &str = "git_path";
pub const GIT_PREFIX: &str = "git_prefix";
pub const LICENSE_PERSONAL: &str = "license_personal";
pub const LICENSE: &str = "license";
pub const SATIS_CONF: &str = "satis_conf";

/// Input kind of a setup field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Checkbox,
    Choice,
    Text,
    Textarea,
}

/// A single declared setup field
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SetupField {
    /// Wire key in the setup document
    pub key: &'static str,
    /// Short name used in error messages
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub default_value: Option<&'static str>,
    pub required: bool,
    pub placeholder: Option<&'static str>,
    /// Key of the field that must be set together with this one
    pub paired_with: Option<&'static str>,
}

pub const SETUP_FIELDS: &[SetupField] = &[
    SetupField {
        key: PACKAGIST_SYNC,
        name: "packagist sync",
        label: "Proxy packagist.org packages (enables the packagist proxy repository)",
        kind: FieldKind::Checkbox,
        default_value: Some("true"),
        required: false,
        placeholder: None,
        paired_with: None,
    },
    SetupField {
        key: DIST_SYNC_MODE,
        name: "sync mode",
        label: "Which zip archives should be pre-fetched by the sync job?",
        kind: FieldKind::Choice,
        default_value: Some("lazy"),
        required: true,
        placeholder: None,
        paired_with: None,
    },
    SetupField {
        key: GIT_PATH,
        name: "git path",
        label: "git path (where git clones are stored on this machine, must be writable by the service)",
        kind: FieldKind::Text,
        default_value: None,
        required: false,
        placeholder: Some("/home/git/mirrors/"),
        paired_with: Some(GIT_PREFIX),
    },
    SetupField {
        key: GIT_PREFIX,
        name: "git prefix",
        label: "git prefix URL (how clients reach the path above remotely)",
        kind: FieldKind::Text,
        default_value: None,
        required: false,
        placeholder: Some("git@mirror.example.com:mirrors/"),
        paired_with: Some(GIT_PATH),
    },
    SetupField {
        key: LICENSE_PERSONAL,
        name: "personal use",
        label: "This instance is for personal use",
        kind: FieldKind::Checkbox,
        default_value: Some("false"),
        required: false,
        placeholder: None,
        paired_with: None,
    },
    SetupField {
        key: LICENSE,
        name: "license",
        label: "License",
        kind: FieldKind::Textarea,
        default_value: None,
        required: false,
        placeholder: None,
        paired_with: None,
    },
    SetupField {
        key: SATIS_CONF,
        name: "satis config",
        label: "Additional repositories (satis configuration)",
        kind: FieldKind::Textarea,
        default_value: None,
        required: false,
        placeholder: Some(r#"{ "repositories": [ ... ] }"#),
        paired_with: None,
    },
];

/// Look up a declared field by wire key
pub fn field(key: &str) -> Option<&'static SetupField> {
    SETUP_FIELDS.iter().find(|f| f.key == key)
}

/// Every declared pair, each reported once in declaration order
pub fn paired_fields() -> impl Iterator<Item = (&'static SetupField, &'static SetupField)> {
    SETUP_FIELDS.iter().enumerate().filter_map(|(idx, first)| {
        let partner = first.paired_with?;
        SETUP_FIELDS[idx + 1..]
            .iter()
            .find(|f| f.key == partner)
            .map(|second| (first, second))
    })
}

/// Allowed values of a choice field as (value, label)
pub fn choices(key: &str) -> Vec<(&'static str, &'static str)> {
    match key {
        DIST_SYNC_MODE => SyncPolicy::ALL
            .iter()
            .map(|p| (p.as_str(), p.description()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Suggested git prefix for a mirror reached at `host`
///
/// `host` is a Host header value; any port is dropped since clients fetch
/// over ssh.
pub fn git_prefix_placeholder(host: &str) -> String {
    let host = host.trim();
    let name = if host.starts_with('[') {
        host.find(']').map_or(host, |end| &host[..=end])
    } else {
        host.split_once(':').map_or(host, |(name, _)| name)
    };
    format!("git@{}:mirrors/", name)
}
