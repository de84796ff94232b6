//! Archive synchronization policies

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for parsing a sync policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSyncPolicyError(String);

impl ParseSyncPolicyError {
    /// The rejected input
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParseSyncPolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unrecognized sync mode: {:?}", self.0)
    }
}

impl std::error::Error for ParseSyncPolicyError {}

/// Which package archives the mirror workers build ahead of demand
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum SyncPolicy {
    /// Archives are built on first request, nothing is precached
    #[default]
    #[serde(rename = "lazy")]
    Lazy,
    /// Versions newer than the newest one ever requested are precached
    #[serde(rename = "new", alias = "new-tags")]
    NewTags,
    /// Every known version is precached
    #[serde(rename = "all")]
    All,
}

impl SyncPolicy {
    pub const ALL: [SyncPolicy; 3] = [SyncPolicy::Lazy, SyncPolicy::NewTags, SyncPolicy::All];

    /// Wire value, as stored in settings
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPolicy::Lazy => "lazy",
            SyncPolicy::NewTags => "new",
            SyncPolicy::All => "all",
        }
    }

    /// Human readable description shown next to the choice
    pub fn description(&self) -> &'static str {
        match self {
            SyncPolicy::Lazy => {
                "Lazy: every archive is built on demand when a package version is first installed"
            }
            SyncPolicy::NewTags => {
                "New tags: tags newer than the newest version in use are pre-cached as soon as they are available"
            }
            SyncPolicy::All => "All: every release is pre-cached as it becomes available",
        }
    }

    /// Decide whether `version` should be built ahead of demand.
    ///
    /// `newest_requested` is the newest version of the same package that has
    /// ever been requested locally, if any.
    pub fn should_precache<V>(&self, version: &V, newest_requested: Option<&V>) -> bool
    where
        V: Ord + ?Sized,
    {
        match self {
            SyncPolicy::Lazy => false,
            SyncPolicy::NewTags => newest_requested.is_some_and(|newest| version > newest),
            SyncPolicy::All => true,
        }
    }
}

impl fmt::Display for SyncPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncPolicy {
    type Err = ParseSyncPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lazy" => Ok(SyncPolicy::Lazy),
            "new" | "new-tags" => Ok(SyncPolicy::NewTags),
            "all" => Ok(SyncPolicy::All),
            _ => Err(ParseSyncPolicyError(s.to_string())),
        }
    }
}
