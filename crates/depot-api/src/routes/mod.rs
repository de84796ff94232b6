//! API routes

mod health;
mod home;
pub mod metrics;
pub mod setup;
pub mod types;

use axum::{Router, extract::DefaultBodyLimit};
use std::sync::Arc;

use crate::state::{AppState, MetricsHandle};

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        .merge(health::routes())
        .merge(home::routes())
        .merge(setup::routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(setup::MAX_SETUP_DOCUMENT_SIZE));

    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}
