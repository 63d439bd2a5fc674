//! # Hub Telemetry
//!
//! Logging initialization for the Hearth hub.
//!
//! Every crate logs through `tracing`; this crate installs the global
//! subscriber once, at startup, with an `EnvFilter` and either a pretty
//! console layer or a JSON layer for log shippers.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hub_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(&TelemetryConfig::from_env()).expect("telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HUB_SERVICE_NAME` | `hearth-hub` | Service name attached to the startup log |
//! | `HUB_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `HUB_CONSOLE_OUTPUT` | `true` | Emit logs to stdout at all |
//! | `HUB_JSON_LOGS` | `true` in containers | JSON instead of pretty output |

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::{init_telemetry, TelemetryGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to install subscriber: {0}")]
    SubscriberInit(String),
}
