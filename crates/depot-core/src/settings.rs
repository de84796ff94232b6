//! Candidate and normalized setup settings

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::schema::{GIT_PATH, GIT_PREFIX, LICENSE};
use crate::sync::SyncPolicy;
use crate::validate::ValidatedConfig;

/// Sync mode as submitted
///
/// An absent mode resolves to the default policy; a present but unknown
/// value is kept so the validator can reject it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncModeChoice {
    Policy(SyncPolicy),
    Unrecognized(String),
}

impl SyncModeChoice {
    pub fn from_input(value: Option<&str>) -> Self {
        match value {
            None => SyncModeChoice::Policy(SyncPolicy::default()),
            Some(v) => v
                .parse()
                .map(SyncModeChoice::Policy)
                .unwrap_or_else(|_| SyncModeChoice::Unrecognized(v.to_string())),
        }
    }

    pub fn policy(&self) -> Option<SyncPolicy> {
        match self {
            SyncModeChoice::Policy(p) => Some(*p),
            SyncModeChoice::Unrecognized(_) => None,
        }
    }
}

impl Default for SyncModeChoice {
    fn default() -> Self {
        SyncModeChoice::Policy(SyncPolicy::default())
    }
}

/// Structured fields extracted from a setup document
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateConfig {
    pub packagist_sync: bool,
    pub sync_mode: SyncModeChoice,
    /// Filesystem location of the git mirrors
    pub mirror_path: Option<String>,
    /// Address clients use to reach `mirror_path`
    pub mirror_prefix: Option<String>,
    pub license: Option<String>,
    pub personal_use: bool,
    /// Satis repository list, passed through untouched
    pub extra_repositories: Option<Value>,
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            packagist_sync: true,
            sync_mode: SyncModeChoice::default(),
            mirror_path: None,
            mirror_prefix: None,
            license: None,
            personal_use: false,
            extra_repositories: None,
        }
    }
}

impl CandidateConfig {
    /// Text value of a declared field, `None` when unset or blank
    pub fn text_field(&self, key: &str) -> Option<&str> {
        let value = match key {
            GIT_PATH => self.mirror_path.as_deref(),
            GIT_PREFIX => self.mirror_prefix.as_deref(),
            LICENSE => self.license.as_deref(),
            _ => None,
        };
        value.filter(|v| !v.is_empty())
    }
}

/// Stored form of the packagist proxy switch: `"proxy"` or `false`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackagistSync {
    Proxy,
    Disabled,
}

impl PackagistSync {
    pub fn is_enabled(&self) -> bool {
        matches!(self, PackagistSync::Proxy)
    }
}

impl From<bool> for PackagistSync {
    fn from(enabled: bool) -> Self {
        if enabled {
            PackagistSync::Proxy
        } else {
            PackagistSync::Disabled
        }
    }
}

impl Serialize for PackagistSync {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PackagistSync::Proxy => serializer.serialize_str("proxy"),
            PackagistSync::Disabled => serializer.serialize_bool(false),
        }
    }
}

impl<'de> Deserialize<'de> for PackagistSync {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Mode(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Flag(enabled) => Ok(enabled.into()),
            Repr::Mode(mode) if mode == "proxy" => Ok(PackagistSync::Proxy),
            Repr::Mode(mode) => Err(D::Error::custom(format!(
                "invalid packagist_sync value: {:?}",
                mode
            ))),
        }
    }
}

/// Canonical settings record consumed by the mirror workers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSettings {
    pub packagist_sync: PackagistSync,
    pub dist_sync_mode: SyncPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default)]
    pub license_personal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repositories: Option<Value>,
}

impl NormalizedSettings {
    /// Re-apply normalization. Stable: a normalized record maps to itself.
    pub fn normalized(self) -> Self {
        Self {
            git_path: non_empty(self.git_path.as_deref()),
            git_prefix: non_empty(self.git_prefix.as_deref()),
            license: non_empty(self.license.as_deref()),
            ..self
        }
    }

    /// Expand back into the candidate shape
    pub fn to_candidate(&self) -> CandidateConfig {
        CandidateConfig {
            packagist_sync: self.packagist_sync.is_enabled(),
            sync_mode: SyncModeChoice::Policy(self.dist_sync_mode),
            mirror_path: self.git_path.clone(),
            mirror_prefix: self.git_prefix.clone(),
            license: self.license.clone(),
            personal_use: self.license_personal,
            extra_repositories: self.repositories.clone(),
        }
    }
}

/// A persisted settings record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSettings {
    #[serde(flatten)]
    pub settings: NormalizedSettings,
    pub saved_at: DateTime<Utc>,
}

impl StoredSettings {
    pub fn new(settings: NormalizedSettings) -> Self {
        Self {
            settings,
            saved_at: Utc::now(),
        }
    }
}

/// Map an accepted configuration to its canonical settings record
pub fn normalize(validated: &ValidatedConfig) -> NormalizedSettings {
    let candidate = validated.candidate();

    NormalizedSettings {
        packagist_sync: candidate.packagist_sync.into(),
        dist_sync_mode: validated.sync_mode(),
        git_path: non_empty(candidate.mirror_path.as_deref()),
        git_prefix: non_empty(candidate.mirror_prefix.as_deref()),
        license: non_empty(candidate.license.as_deref()),
        license_personal: candidate.personal_use,
        repositories: candidate.extra_repositories.clone(),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
