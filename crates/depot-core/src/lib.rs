//! Depot Core
//!
//! This crate holds the setup gate of the Depot package mirror: parsing of
//! setup documents, validation, the license gate, the archive sync policy
//! and the normalized settings consumed by the mirror workers.

pub mod document;
pub mod error;
pub mod license;
pub mod schema;
pub mod settings;
pub mod setup;
pub mod store;
pub mod sync;
pub mod validate;

pub use document::{decode_json, decode_utf8, parse_document};
pub use error::{ParseError, SetupError, StoreError, ValidationError, VerifyError};
pub use license::{
    InMemoryVerifier, LicenseGate, LicenseRejection, LicenseVerifier, UnconfiguredVerifier,
};
pub use settings::{
    CandidateConfig, NormalizedSettings, PackagistSync, StoredSettings, SyncModeChoice, normalize,
};
pub use setup::SetupService;
pub use store::{InMemorySettingsStore, SettingsStore};
pub use sync::{ParseSyncPolicyError, SyncPolicy};
pub use validate::{ConfigValidator, ValidatedConfig, ValidationReport};
