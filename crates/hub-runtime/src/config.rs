//! # Hub Configuration
//!
//! Unified configuration for the gateway, logging and bootstrap.
//!
//! Sources, later ones winning:
//!
//! 1. Built-in defaults
//! 2. The TOML file named by `HUB_CONFIG`
//! 3. Individual `HUB_*` environment variables
//!
//! ## Security Requirements
//!
//! - `gateway.auth.secret` MUST be set (`HUB_AUTH_SECRET` or the config file)

use hub_02_gateway::GatewayConfig;
use hub_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Complete hub configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Gateway configuration.
    pub gateway: GatewayConfig,
    /// Logging configuration.
    pub telemetry: TelemetryConfig,
    /// JSON file holding the initial snapshot. Empty state when unset.
    pub initial_state: Option<PathBuf>,
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

impl HubConfig {
    /// Parse a TOML document.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigLoadError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `HUB_*` overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("HUB_WS_HOST") {
            self.gateway.websocket.host = parse_var("HUB_WS_HOST", value)?;
        }
        if let Some(value) = lookup("HUB_WS_PORT") {
            self.gateway.websocket.port = parse_var("HUB_WS_PORT", value)?;
        }
        if let Some(secret) = lookup("HUB_AUTH_SECRET") {
            self.gateway.auth.secret = secret;
        }
        if let Some(issuer) = lookup("HUB_AUTH_ISSUER") {
            self.gateway.auth.issuer = issuer;
        }
        if let Some(audience) = lookup("HUB_AUTH_AUDIENCE") {
            self.gateway.auth.audience = audience;
        }
        if let Some(value) = lookup("HUB_AUTH_TIMEOUT_SECS") {
            let secs: u64 = parse_var("HUB_AUTH_TIMEOUT_SECS", value)?;
            self.gateway.auth.timeout = Duration::from_secs(secs);
        }
        if let Some(path) = lookup("HUB_INITIAL_STATE") {
            self.initial_state = Some(PathBuf::from(path));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigLoadError> {
    value
        .parse()
        .map_err(|_| ConfigLoadError::InvalidEnv { var, value })
}

/// Load configuration from `HUB_CONFIG` (if set) and the environment.
pub fn load_config() -> Result<HubConfig, ConfigLoadError> {
    load_config_from(|key| std::env::var(key).ok())
}

/// [`load_config`] over an arbitrary variable source.
pub fn load_config_from<F>(lookup: F) -> Result<HubConfig, ConfigLoadError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match lookup("HUB_CONFIG") {
        Some(path) => HubConfig::from_toml_file(Path::new(&path))?,
        None => HubConfig::default(),
    };
    config.telemetry = merge_telemetry(config.telemetry, &lookup);
    config.apply_overrides(&lookup)?;
    Ok(config)
}

/// Environment telemetry settings override the file only where set.
fn merge_telemetry<F>(file: TelemetryConfig, lookup: &F) -> TelemetryConfig
where
    F: Fn(&str) -> Option<String>,
{
    let from_env = TelemetryConfig::from_lookup(lookup);
    TelemetryConfig {
        service_name: lookup("HUB_SERVICE_NAME")
            .map(|_| from_env.service_name.clone())
            .unwrap_or(file.service_name),
        log_level: lookup("HUB_LOG_LEVEL")
            .or_else(|| lookup("RUST_LOG"))
            .map(|_| from_env.log_level.clone())
            .unwrap_or(file.log_level),
        console_output: lookup("HUB_CONSOLE_OUTPUT")
            .map(|_| from_env.console_output)
            .unwrap_or(file.console_output),
        json_logs: lookup("HUB_JSON_LOGS")
            .map(|_| from_env.json_logs)
            .unwrap_or(file.json_logs || from_env.json_logs),
    }
}
