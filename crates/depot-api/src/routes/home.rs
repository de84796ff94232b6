//! Landing route
//!
//! Sends the administrator to setup until a configuration has been saved.

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

use super::types::HomeResponse;

/// GET /
async fn home(State(state): State<AppState>) -> Result<Response, ApiError> {
    let Some(current) = state.setup.current().await? else {
        debug!("No settings saved yet, redirecting to setup");
        return Ok(Redirect::to("/setup").into_response());
    };

    Ok(Json(HomeResponse {
        page: "home",
        dist_sync_mode: current.settings.dist_sync_mode,
        packagist_proxy: current.settings.packagist_sync.is_enabled(),
        git_mirrors: current.settings.git_path.is_some(),
        saved_at: current.saved_at.to_rfc3339(),
    })
    .into_response())
}

/// Create landing routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(home))
}
