//! License client error types

use depot_core::VerifyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LicenseClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid license server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("License server returned error: {status} - {message}")]
    ServerError { status: u16, message: String },
}

impl From<LicenseClientError> for VerifyError {
    fn from(err: LicenseClientError) -> Self {
        match err {
            LicenseClientError::Http(e) if e.is_decode() => {
                VerifyError::UnexpectedResponse(e.to_string())
            }
            LicenseClientError::Http(e) => VerifyError::Unavailable(e.to_string()),
            LicenseClientError::InvalidUrl(e) => VerifyError::Unavailable(e.to_string()),
            LicenseClientError::ServerError { status, message } if status >= 500 => {
                VerifyError::Unavailable(format!("{} - {}", status, message))
            }
            other @ LicenseClientError::ServerError { .. } => {
                VerifyError::UnexpectedResponse(other.to_string())
            }
        }
    }
}
