//! Setup validation
//!
//! Every rule is evaluated on every pass so a submitter sees all problems
//! at once.

use std::sync::Arc;
use tracing::debug;

use crate::error::{ValidationError, VerifyError};
use crate::license::{LicenseGate, LicenseRejection, LicenseVerifier};
use crate::schema;
use crate::settings::{CandidateConfig, SyncModeChoice};
use crate::sync::SyncPolicy;

/// Errors found in one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
    unverified: Option<VerifyError>,
}

impl ValidationReport {
    /// Accepted iff no rule failed and the license verdict was obtained
    pub fn is_accepted(&self) -> bool {
        self.errors.is_empty() && self.unverified.is_none()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Verifier failure, kept apart from `InvalidLicense`
    pub fn unverified(&self) -> Option<&VerifyError> {
        self.unverified.as_ref()
    }

    /// Display messages in rule order, verifier failure last
    pub fn messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(ToString::to_string)
            .chain(
                self.unverified
                    .iter()
                    .map(|e| format!("License could not be verified: {}", e)),
            )
            .collect()
    }

    fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Turn an accepted report into proof of validity for `candidate`
    pub fn accept(mut self, candidate: CandidateConfig) -> Result<ValidatedConfig, ValidationReport> {
        if !self.is_accepted() {
            return Err(self);
        }
        match candidate.sync_mode.policy() {
            Some(sync_mode) => Ok(ValidatedConfig {
                candidate,
                sync_mode,
            }),
            None => {
                // Report was produced for a different candidate
                if let SyncModeChoice::Unrecognized(value) = candidate.sync_mode {
                    self.push(ValidationError::UnrecognizedSyncMode(value));
                }
                Err(self)
            }
        }
    }
}

/// A candidate that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    candidate: CandidateConfig,
    sync_mode: SyncPolicy,
}

impl ValidatedConfig {
    pub fn candidate(&self) -> &CandidateConfig {
        &self.candidate
    }

    pub fn sync_mode(&self) -> SyncPolicy {
        self.sync_mode
    }
}

/// Applies the setup rules to candidate configurations
#[derive(Clone)]
pub struct ConfigValidator {
    verifier: Arc<dyn LicenseVerifier>,
}

impl ConfigValidator {
    pub fn new(verifier: Arc<dyn LicenseVerifier>) -> Self {
        Self { verifier }
    }

    /// Validate a candidate, collecting every violated rule
    pub async fn validate(&self, candidate: &CandidateConfig) -> ValidationReport {
        let mut report = ValidationReport::default();

        if let SyncModeChoice::Unrecognized(value) = &candidate.sync_mode {
            report.push(ValidationError::UnrecognizedSyncMode(value.clone()));
        }

        for error in check_pairs(candidate) {
            report.push(error);
        }

        let license = LicenseGate::check(
            candidate.license.as_deref(),
            candidate.personal_use,
            self.verifier.as_ref(),
        )
        .await;
        if let Err(rejection) = license {
            match rejection {
                LicenseRejection::Unverified(e) => report.unverified = Some(e),
                other => report.errors.extend(other.as_validation_error()),
            }
        }

        debug!(
            "Validation finished with {} error(s), verified: {}",
            report.errors.len(),
            report.unverified.is_none()
        );
        report
    }
}

/// Fields declared as a pair must be set together
fn check_pairs(candidate: &CandidateConfig) -> Vec<ValidationError> {
    schema::paired_fields()
        .filter(|(first, second)| {
            candidate.text_field(first.key).is_some() != candidate.text_field(second.key).is_some()
        })
        .map(|(first, second)| ValidationError::UnpairedFields {
            first: first.name,
            second: second.name,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;
    use crate::license::InMemoryVerifier;
    use crate::settings::normalize;

    fn validator() -> ConfigValidator {
        ConfigValidator::new(Arc::new(InMemoryVerifier::new(["GOOD-KEY"])))
    }

    fn unpaired() -> ValidationError {
        ValidationError::UnpairedFields {
            first: "git path",
            second: "git prefix",
        }
    }

    fn candidate(
        path: Option<&str>,
        prefix: Option<&str>,
        license: Option<&str>,
        personal_use: bool,
    ) -> CandidateConfig {
        CandidateConfig {
            mirror_path: path.map(str::to_string),
            mirror_prefix: prefix.map(str::to_string),
            license: license.map(str::to_string),
            personal_use,
            ..Default::default()
        }
    }

    #[test]
    fn test_unpaired_message() {
        assert_eq!(
            unpaired().to_string(),
            "Both git path and git prefix must be set or empty"
        );
    }

    #[tokio::test]
    async fn test_sync_mode_values() {
        let validator = validator();
        for mode in ["lazy", "new", "all"] {
            let c = CandidateConfig {
                sync_mode: SyncModeChoice::from_input(Some(mode)),
                personal_use: true,
                ..Default::default()
            };
            assert!(validator.validate(&c).await.is_accepted(), "{mode}");
        }
        for mode in ["", "nightly", "Lazy", "none"] {
            let c = CandidateConfig {
                sync_mode: SyncModeChoice::from_input(Some(mode)),
                personal_use: true,
                ..Default::default()
            };
            let report = validator.validate(&c).await;
            assert_eq!(
                report.errors(),
                &[ValidationError::UnrecognizedSyncMode(mode.to_string())]
            );
        }
    }

    #[tokio::test]
    async fn test_pairing_independent_of_other_fields() {
        let validator = validator();
        let mirror_values = [None, Some(""), Some("x")];
        let licenses = [None, Some("GOOD-KEY"), Some("BAD-KEY")];

        for path in mirror_values {
            for prefix in mirror_values {
                for license in licenses {
                    for personal_use in [false, true] {
                        let c = candidate(path, prefix, license, personal_use);
                        let report = validator.validate(&c).await;
                        let path_set = path.is_some_and(|p| !p.is_empty());
                        let prefix_set = prefix.is_some_and(|p| !p.is_empty());
                        assert_eq!(
                            report.errors().contains(&unpaired()),
                            path_set != prefix_set,
                            "path={path:?} prefix={prefix:?} license={license:?} personal={personal_use}"
                        );
                    }
                }
            }
        }
    }

    #[tokio::test]
    async fn test_license_rules() {
        let validator = validator();

        // Personal use never yields the missing-license error
        for license in [None, Some(""), Some("GOOD-KEY"), Some("BAD-KEY")] {
            let report = validator.validate(&candidate(None, None, license, true)).await;
            assert!(!report.errors().contains(&ValidationError::MissingLicense));
        }

        // No personal use and empty license always does
        for license in [None, Some("")] {
            let report = validator.validate(&candidate(None, None, license, false)).await;
            assert_eq!(report.errors(), &[ValidationError::MissingLicense]);
        }
    }

    #[tokio::test]
    async fn test_errors_accumulate() {
        let c = CandidateConfig {
            sync_mode: SyncModeChoice::from_input(Some("nightly")),
            mirror_path: Some("/srv/mirrors".to_string()),
            ..Default::default()
        };
        let report = validator().validate(&c).await;
        assert_eq!(
            report.errors(),
            &[
                ValidationError::UnrecognizedSyncMode("nightly".to_string()),
                unpaired(),
                ValidationError::MissingLicense,
            ]
        );
        assert_eq!(report.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_unverified_license_is_separate() {
        let validator = ConfigValidator::new(Arc::new(crate::license::UnconfiguredVerifier));
        let report = validator
            .validate(&candidate(None, None, Some("ABC"), false))
            .await;
        assert!(report.errors().is_empty());
        assert_eq!(report.unverified(), Some(&VerifyError::NotConfigured));
        assert!(!report.is_accepted());
        assert!(report.messages()[0].starts_with("License could not be verified"));
    }

    #[tokio::test]
    async fn test_accept_rejects_unrecognized_mode() {
        let c = CandidateConfig {
            sync_mode: SyncModeChoice::Unrecognized("nightly".to_string()),
            ..Default::default()
        };
        let report = ValidationReport::default().accept(c).unwrap_err();
        assert_eq!(
            report.errors(),
            &[ValidationError::UnrecognizedSyncMode("nightly".to_string())]
        );
    }

    #[tokio::test]
    async fn test_scenario_personal_use_defaults() {
        let doc = r#"{"dist_sync_mode": "lazy", "git_path": "", "git_prefix": "", "license_personal": true}"#;
        let c = parse_document(doc).unwrap();
        let report = validator().validate(&c).await;
        assert!(report.is_accepted());

        let settings = normalize(&report.accept(c).unwrap());
        assert_eq!(settings.git_path, None);
        assert_eq!(settings.git_prefix, None);
        assert_eq!(settings.packagist_sync, crate::settings::PackagistSync::Proxy);
        assert_eq!(settings.dist_sync_mode, SyncPolicy::Lazy);
    }

    #[tokio::test]
    async fn test_scenario_path_without_prefix() {
        let doc = r#"{"git_path": "/home/git/mirrors/", "git_prefix": "", "license_personal": true}"#;
        let report = validator().validate(&parse_document(doc).unwrap()).await;
        assert_eq!(report.errors(), &[unpaired()]);
    }

    #[tokio::test]
    async fn test_scenario_unknown_sync_mode() {
        let doc = r#"{"dist_sync_mode": "nightly", "license_personal": true}"#;
        let report = validator().validate(&parse_document(doc).unwrap()).await;
        assert_eq!(
            report.errors(),
            &[ValidationError::UnrecognizedSyncMode("nightly".to_string())]
        );
    }

    #[tokio::test]
    async fn test_scenario_rejected_license() {
        let doc = r#"{"license_personal": false, "license": "ABC"}"#;
        let report = validator().validate(&parse_document(doc).unwrap()).await;
        assert_eq!(report.errors(), &[ValidationError::InvalidLicense]);
        assert_eq!(report.unverified(), None);
    }

    #[tokio::test]
    async fn test_normalized_settings_revalidate_cleanly() {
        let validator = validator();
        let docs = [
            r#"{"license_personal": true}"#,
            r#"{"dist_sync_mode": "all", "git_path": "/srv", "git_prefix": "git@h:srv/", "license": "GOOD-KEY"}"#,
            r#"{"packagist_sync": false, "dist_sync_mode": "new", "license": "GOOD-KEY", "license_personal": true}"#,
        ];
        for doc in docs {
            let c = parse_document(doc).unwrap();
            let report = validator.validate(&c).await;
            let settings = normalize(&report.accept(c).unwrap());

            let expanded = settings.to_candidate();
            let again = validator.validate(&expanded).await;
            assert!(again.is_accepted(), "{doc}");
            assert_eq!(normalize(&again.accept(expanded).unwrap()), settings);
        }
    }
}
