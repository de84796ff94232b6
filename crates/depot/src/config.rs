//! Configuration loading and management

use anyhow::{Context, Result, bail};
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Prefix of environment overrides, e.g. `DEPOT__SERVER__PORT=9000`
const ENV_PREFIX: &str = "DEPOT";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["pretty", "json"];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub settings: SettingsConfig,
    pub license: LicenseConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Where the saved setup lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    #[serde(default = "default_settings_path")]
    pub path: String,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

/// License server configuration
///
/// Without a `server_url` only personal-use setups can be activated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseConfig {
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default = "default_license_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            timeout_secs: default_license_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_settings_path() -> String {
    "./data/settings.json".to_string()
}

fn default_license_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

/// Environment source for `DEPOT__SECTION__KEY` overrides
fn env_overrides() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

impl Config {
    /// Load configuration from a file, then apply environment overrides
    pub fn load(path: &str) -> Result<Self> {
        Self::load_with_env(path, env_overrides())
    }

    fn load_with_env(path: &str, env: Environment) -> Result<Self> {
        let mut builder = config::Config::builder();

        if Path::new(path).exists() {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
            info!("Loading configuration from {}", path);
        } else {
            info!("Config file not found at {}, using defaults", path);
        }

        let config = builder
            .add_source(env)
            .build()
            .with_context(|| format!("Failed to read config file: {}", path))?
            .try_deserialize()
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(config)
    }

    /// Check the loaded values, reporting every problem at once
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.server.port == 0 {
            problems.push("server.port must not be 0".to_string());
        }
        if self.settings.path.trim().is_empty() {
            problems.push("settings.path must not be empty".to_string());
        }
        if self.license.timeout_secs == 0 {
            problems.push("license.timeout_secs must be positive".to_string());
        }
        if let Some(url) = &self.license.server_url
            && url.trim().is_empty()
        {
            problems.push("license.server_url must not be empty when set".to_string());
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            problems.push(format!(
                "logging.level '{}' is not one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }
        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            problems.push(format!(
                "logging.format '{}' is not one of {}",
                self.logging.format,
                LOG_FORMATS.join(", ")
            ));
        }

        if !problems.is_empty() {
            bail!("Invalid configuration: {}", problems.join("; "));
        }
        Ok(())
    }
}
