//! Setup routes

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, header},
    routing::{get, post},
};
use depot_core::document::SETUP_DOCUMENT;
use depot_core::{SetupError, StoredSettings, decode_utf8};
use tracing::{info, warn};

use crate::error::{ApiError, ErrorEntry};
use crate::state::AppState;

use super::types::{SetupPageResponse, SetupSchemaResponse, ValidateSetupResponse};

/// Maximum accepted size of a setup document (1 MB)
pub const MAX_SETUP_DOCUMENT_SIZE: usize = 1024 * 1024;

fn request_host(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::HOST)?.to_str().ok()
}

/// GET /setup
async fn setup_page(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SetupPageResponse>, ApiError> {
    let current = state.setup.current().await?;

    Ok(Json(SetupPageResponse {
        configured: current.is_some(),
        fields: SetupSchemaResponse::build(request_host(&headers)).fields,
        current,
    }))
}

/// GET /api/v1/setup
async fn get_settings(State(state): State<AppState>) -> Result<Json<StoredSettings>, ApiError> {
    state
        .setup
        .current()
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No settings have been saved".to_string()))
}

/// GET /api/v1/setup/schema
async fn get_schema(headers: HeaderMap) -> Json<SetupSchemaResponse> {
    Json(SetupSchemaResponse::build(request_host(&headers)))
}

/// PUT /api/v1/setup
async fn submit_settings(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StoredSettings>, ApiError> {
    metrics::counter!("depot_setup_submissions_total").increment(1);

    let outcome = match decode_utf8(&body, SETUP_DOCUMENT) {
        Ok(raw) => state.setup.submit(raw).await,
        Err(e) => Err(SetupError::Parse(e)),
    };

    match outcome {
        Ok(stored) => {
            info!("Setup saved");
            Ok(Json(stored))
        }
        Err(e) => {
            let err = ApiError::from(e);
            warn!("Setup submission rejected ({})", err.reason());
            metrics::counter!("depot_setup_rejections_total", "reason" => err.reason())
                .increment(1);
            Err(err)
        }
    }
}

/// POST /api/v1/setup/validate
async fn validate_settings(
    State(state): State<AppState>,
    body: Bytes,
) -> Json<ValidateSetupResponse> {
    let report = match decode_utf8(&body, SETUP_DOCUMENT) {
        Ok(raw) => state.setup.check(raw).await,
        Err(e) => Err(e),
    };

    match report {
        Ok(report) => Json(ValidateSetupResponse {
            valid: report.is_accepted(),
            errors: ErrorEntry::from_report(&report),
            parse_error: None,
        }),
        Err(parse_error) => Json(ValidateSetupResponse {
            valid: false,
            errors: Vec::new(),
            parse_error: Some(parse_error),
        }),
    }
}

/// Create setup routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/setup", get(setup_page))
        .route("/api/v1/setup", get(get_settings).put(submit_settings))
        .route("/api/v1/setup/schema", get(get_schema))
        .route("/api/v1/setup/validate", post(validate_settings))
}
