//! Application state

use depot_core::SetupService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Handle used to render the Prometheus exposition
pub type MetricsHandle = PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub setup: Arc<SetupService>,
}

impl AppState {
    pub fn new(setup: Arc<SetupService>) -> Self {
        Self { setup }
    }
}
