//! Setup submission flow
//!
//! parse -> validate -> normalize -> persist. Nothing is written unless the
//! whole submission is accepted.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::document::parse_document;
use crate::error::{ParseError, SetupError, StoreError};
use crate::license::LicenseVerifier;
use crate::settings::{StoredSettings, normalize};
use crate::store::SettingsStore;
use crate::validate::{ConfigValidator, ValidationReport};

/// Orchestrates setup submissions against a settings store
#[derive(Clone)]
pub struct SetupService {
    validator: ConfigValidator,
    store: Arc<dyn SettingsStore>,
}

impl SetupService {
    pub fn new(verifier: Arc<dyn LicenseVerifier>, store: Arc<dyn SettingsStore>) -> Self {
        Self {
            validator: ConfigValidator::new(verifier),
            store,
        }
    }

    /// Whether setup has been completed before
    pub async fn is_configured(&self) -> Result<bool, StoreError> {
        self.store.exists().await
    }

    /// Currently persisted settings
    pub async fn current(&self) -> Result<Option<StoredSettings>, StoreError> {
        self.store.load().await
    }

    /// Validate a document without persisting anything
    pub async fn check(&self, raw: &str) -> Result<ValidationReport, ParseError> {
        let candidate = parse_document(raw)?;
        Ok(self.validator.validate(&candidate).await)
    }

    /// Validate a document and, if accepted, persist its normalized settings
    pub async fn submit(&self, raw: &str) -> Result<StoredSettings, SetupError> {
        let candidate = parse_document(raw).inspect_err(|e| {
            warn!("Rejected setup document: {}", e.headline);
        })?;

        let report = self.validator.validate(&candidate).await;
        if report.errors().is_empty()
            && let Some(e) = report.unverified()
        {
            return Err(SetupError::Unverified(e.clone()));
        }

        let validated = report.accept(candidate).map_err(|report| {
            warn!("Rejected setup: {}", report.messages().join("; "));
            SetupError::Rejected(report)
        })?;

        let settings = normalize(&validated);
        debug!("Normalized settings: {:?}", settings.dist_sync_mode);

        let stored = self.store.save(settings).await?;
        info!(
            "Saved settings (sync mode: {}, packagist proxy: {})",
            stored.settings.dist_sync_mode,
            stored.settings.packagist_sync.is_enabled()
        );
        Ok(stored)
    }
}
