//! Depot - Setup gate for a private package mirror

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;
mod store;

use crate::config::{Config, LoggingConfig};
use depot_api::{AppState, create_router};
use depot_core::{LicenseVerifier, SetupService, UnconfiguredVerifier};
use depot_license::{LicenseClient, LicenseClientConfig};
use store::FileSettingsStore;

/// Depot - Setup gate for a private package mirror
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "DEPOT_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "DEPOT_PORT")]
    port: Option<u16>,

    /// Settings file path
    #[arg(long, env = "DEPOT_SETTINGS")]
    settings: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(settings) = args.settings {
        config.settings.path = settings;
    }
    config.validate()?;

    init_logging(&config.logging);

    info!("Starting Depot v{}", env!("CARGO_PKG_VERSION"));

    // License verification
    let verifier: Arc<dyn LicenseVerifier> = match &config.license.server_url {
        Some(url) => Arc::new(
            LicenseClient::new(LicenseClientConfig {
                server_url: url.clone(),
                timeout: Duration::from_secs(config.license.timeout_secs),
            })
            .with_context(|| format!("Failed to create license client for {}", url))?,
        ),
        None => {
            warn!("No license server configured, only personal-use setups can be activated");
            Arc::new(UnconfiguredVerifier)
        }
    };

    // Settings store and setup service
    let store = Arc::new(FileSettingsStore::new(&config.settings.path));
    let settings_path = store.path().display().to_string();
    let setup = Arc::new(SetupService::new(verifier, store));

    if setup.is_configured().await? {
        info!("Using saved settings from {}", settings_path);
    } else {
        info!("No settings at {}, setup is required", settings_path);
    }

    // Metrics
    let metrics_handle = if config.metrics.enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(Arc::new(handle))
    } else {
        None
    };

    let app = create_router(AppState::new(setup), metrics_handle)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid bind address {}:{}",
                config.server.bind_address, config.server.port
            )
        })?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let json = logging.format == "json";

    tracing_subscriber::registry()
        .with((!json).then(|| fmt::layer()))
        .with(json.then(|| fmt::layer().json()))
        .with(filter)
        .init();
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
