//! Core error types

use serde::Serialize;
use thiserror::Error;

use crate::validate::ValidationReport;

/// A document that could not be decoded.
///
/// `headline` is a single display line; `detail` keeps the multi-line
/// diagnostic (offending source line, caret, parser message).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{headline}\n{detail}")]
pub struct ParseError {
    /// Which document failed, e.g. "setup document" or "satis config"
    pub label: String,
    pub line: usize,
    /// 1-based, counted in characters
    pub column: usize,
    pub headline: String,
    pub detail: String,
}

/// A rule violated by a candidate configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unrecognized sync mode: {0:?}")]
    UnrecognizedSyncMode(String),

    #[error("Both {first} and {second} must be set or empty")]
    UnpairedFields {
        first: &'static str,
        second: &'static str,
    },

    #[error("Missing license, obtain one or check the personal use box if it applies")]
    MissingLicense,

    #[error("Invalid license")]
    InvalidLicense,
}

impl ValidationError {
    /// Stable machine readable code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::UnrecognizedSyncMode(_) => "UNRECOGNIZED_SYNC_MODE",
            ValidationError::UnpairedFields { .. } => "UNPAIRED_FIELDS",
            ValidationError::MissingLicense => "MISSING_LICENSE",
            ValidationError::InvalidLicense => "INVALID_LICENSE",
        }
    }
}

/// The license verifier could not give a verdict
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("No license server is configured")]
    NotConfigured,

    #[error("License server unavailable: {0}")]
    Unavailable(String),

    #[error("Unexpected license server response: {0}")]
    UnexpectedResponse(String),
}

/// Settings persistence failure
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Outcome of a rejected setup submission
#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Configuration rejected: {}", .0.messages().join("; "))]
    Rejected(ValidationReport),

    #[error("License could not be verified: {0}")]
    Unverified(VerifyError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
