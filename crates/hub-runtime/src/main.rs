//! Hearth hub binary.

use anyhow::{Context, Result};
use hub_runtime::config::load_config;
use hub_runtime::HubRuntime;
use hub_telemetry::init_telemetry;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = load_config().context("Failed to load configuration")?;

    // Initialize logging
    let _telemetry = init_telemetry(&config.telemetry).context("Failed to initialize telemetry")?;

    // Create and start the hub runtime
    let mut runtime = HubRuntime::new(config)?;
    runtime.start().await?;

    // Keep the hub running
    info!("Hub is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    // Graceful shutdown
    runtime.shutdown().await;

    Ok(())
}
