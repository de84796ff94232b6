//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use depot_core::{SetupError, StoreError, ValidationReport};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Label for the rejection counter
    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::Setup(SetupError::Parse(_)) => "parse",
            ApiError::Setup(SetupError::Rejected(_)) => "invalid",
            ApiError::Setup(SetupError::Unverified(_)) => "unverified",
            ApiError::Setup(SetupError::Store(_)) | ApiError::Store(_) => "store",
            ApiError::NotFound(_) => "not_found",
        }
    }
}

/// A single entry of an error response body
#[derive(Debug, Serialize)]
pub struct ErrorEntry {
    pub code: &'static str,
    pub message: String,
    pub detail: Option<String>,
}

impl ErrorEntry {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
        }
    }

    /// One entry per failed rule, verifier failure last
    pub fn from_report(report: &ValidationReport) -> Vec<ErrorEntry> {
        report
            .errors()
            .iter()
            .map(|e| ErrorEntry::new(e.code(), e.to_string()))
            .chain(
                report
                    .unverified()
                    .map(|e| ErrorEntry::new("LICENSE_UNVERIFIED", e.to_string())),
            )
            .collect()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, errors) = match &self {
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                vec![ErrorEntry::new("NOT_FOUND", msg.clone())],
            ),
            ApiError::Setup(e) => match e {
                SetupError::Parse(parse) => (
                    StatusCode::BAD_REQUEST,
                    vec![ErrorEntry {
                        code: "PARSE_ERROR",
                        message: parse.headline.clone(),
                        detail: Some(parse.detail.clone()),
                    }],
                ),
                SetupError::Rejected(report) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, ErrorEntry::from_report(report))
                }
                SetupError::Unverified(verify) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    vec![ErrorEntry::new("LICENSE_UNVERIFIED", verify.to_string())],
                ),
                SetupError::Store(store) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec![ErrorEntry::new("STORE_ERROR", store.to_string())],
                ),
            },
            ApiError::Store(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                vec![ErrorEntry::new("STORE_ERROR", e.to_string())],
            ),
        };

        let body = axum::Json(json!({ "errors": errors }));

        (status, body).into_response()
    }
}
