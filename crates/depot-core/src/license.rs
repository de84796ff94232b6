//! License gate
//!
//! A setup may only activate for personal use or with a license key that
//! the external verifier accepts. The verifier is usually a network call;
//! timeouts and retries belong to its implementation, not to the gate.

use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{ValidationError, VerifyError};

/// Source of truth for license keys
#[async_trait]
pub trait LicenseVerifier: Send + Sync {
    /// `Ok(true)` if the key is valid, `Ok(false)` if it was rejected,
    /// `Err` if no verdict could be obtained.
    async fn verify(&self, license: &str) -> Result<bool, VerifyError>;
}

/// Why the gate refused a configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LicenseRejection {
    #[error("missing license")]
    Missing,

    #[error("invalid license")]
    Invalid,

    #[error(transparent)]
    Unverified(VerifyError),
}

impl LicenseRejection {
    /// The validation error this rejection surfaces as, if any.
    /// An unverified license is an operational failure, not a validation one.
    pub fn as_validation_error(&self) -> Option<ValidationError> {
        match self {
            LicenseRejection::Missing => Some(ValidationError::MissingLicense),
            LicenseRejection::Invalid => Some(ValidationError::InvalidLicense),
            LicenseRejection::Unverified(_) => None,
        }
    }
}

pub struct LicenseGate;

impl LicenseGate {
    /// Decide whether the license settings permit activation
    pub async fn check(
        license: Option<&str>,
        personal_use: bool,
        verifier: &dyn LicenseVerifier,
    ) -> Result<(), LicenseRejection> {
        let license = license.filter(|l| !l.is_empty());

        let Some(key) = license else {
            if personal_use {
                debug!("No license given, personal use declared");
                return Ok(());
            }
            return Err(LicenseRejection::Missing);
        };

        match verifier.verify(key).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                debug!("License rejected by verifier");
                Err(LicenseRejection::Invalid)
            }
            Err(e) => {
                warn!("License verification failed: {}", e);
                Err(LicenseRejection::Unverified(e))
            }
        }
    }
}

/// Verifier used when no license server is configured
pub struct UnconfiguredVerifier;

#[async_trait]
impl LicenseVerifier for UnconfiguredVerifier {
    async fn verify(&self, _license: &str) -> Result<bool, VerifyError> {
        Err(VerifyError::NotConfigured)
    }
}

/// Verifier backed by a fixed key set, for tests and air-gapped installs
pub struct InMemoryVerifier {
    keys: HashSet<String>,
}

impl InMemoryVerifier {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl LicenseVerifier for InMemoryVerifier {
    async fn verify(&self, license: &str) -> Result<bool, VerifyError> {
        Ok(self.keys.contains(license))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls so tests can assert when the verifier is consulted
    struct CountingVerifier {
        calls: AtomicUsize,
        verdict: Result<bool, VerifyError>,
    }

    impl CountingVerifier {
        fn new(verdict: Result<bool, VerifyError>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                verdict,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LicenseVerifier for CountingVerifier {
        async fn verify(&self, _license: &str) -> Result<bool, VerifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.verdict.clone()
        }
    }

    #[tokio::test]
    async fn test_missing_license_without_personal_use() {
        let verifier = CountingVerifier::new(Ok(true));
        for license in [None, Some("")] {
            let result = LicenseGate::check(license, false, &verifier).await;
            assert_eq!(result, Err(LicenseRejection::Missing));
        }
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_personal_use_without_license() {
        let verifier = CountingVerifier::new(Ok(false));
        assert_eq!(LicenseGate::check(None, true, &verifier).await, Ok(()));
        assert_eq!(LicenseGate::check(Some(""), true, &verifier).await, Ok(()));
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_license_is_verified_exactly_once() {
        let verifier = CountingVerifier::new(Ok(true));
        assert_eq!(LicenseGate::check(Some("ABC"), false, &verifier).await, Ok(()));
        assert_eq!(verifier.calls(), 1);
    }

    #[tokio::test]
    async fn test_rejected_license_is_invalid_even_for_personal_use() {
        let verifier = CountingVerifier::new(Ok(false));
        for personal_use in [false, true] {
            let result = LicenseGate::check(Some("ABC"), personal_use, &verifier).await;
            assert_eq!(result, Err(LicenseRejection::Invalid));
        }
    }

    #[tokio::test]
    async fn test_verifier_failure_is_not_acceptance() {
        let failure = VerifyError::Unavailable("connection refused".to_string());
        let verifier = CountingVerifier::new(Err(failure.clone()));

        let result = LicenseGate::check(Some("ABC"), false, &verifier).await;
        assert_eq!(result, Err(LicenseRejection::Unverified(failure)));
        assert_eq!(result.unwrap_err().as_validation_error(), None);
    }

    #[tokio::test]
    async fn test_unconfigured_verifier() {
        let result = LicenseGate::check(Some("ABC"), false, &UnconfiguredVerifier).await;
        assert_eq!(
            result,
            Err(LicenseRejection::Unverified(VerifyError::NotConfigured))
        );
    }

    #[tokio::test]
    async fn test_in_memory_verifier() {
        let verifier = InMemoryVerifier::new(["KEY-1", "KEY-2"]);
        assert_eq!(verifier.verify("KEY-1").await, Ok(true));
        assert_eq!(verifier.verify("KEY-3").await, Ok(false));
    }
}
