//! # Hearth Hub Runtime
//!
//! The main entry point for the Hearth home-automation hub.
//!
//! ## Modular Structure
//!
//! - `config` - Configuration from file and environment
//! - `bootstrap` - Initial snapshot provider
//! - `modules` - Built-in domain modules (action registration)
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (from file/env)
//! 2. Initialize telemetry
//! 3. Register actions from every domain module, then freeze the registry
//! 4. Restore the initial snapshot
//! 5. Start the gateway
//! 6. On Ctrl-C, stop accepting and close open connections
//!
//! ```text
//!  domain modules ──register──► ActionRegistry ─┐
//!  initial state file ─────────────────────────┼─► StateMachine ◄── GatewayService ◄── clients
//!                                               │        │
//!                                               └── EventBus ──relay──► authenticated clients
//! ```

pub mod bootstrap;
pub mod config;
pub mod modules;

use std::sync::Arc;

use anyhow::{Context, Result};
use hub_01_state_machine::{ActionRegistryBuilder, StateMachine, StateMachineApi};
use hub_02_gateway::{GatewayService, JwtVerifier};
use shared_bus::EventBus;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::bootstrap::load_initial_state;
use crate::config::HubConfig;
use crate::modules::{builtin_modules, register_all};

/// The hub runtime: state machine plus gateway.
pub struct HubRuntime {
    machine: Arc<StateMachine>,
    gateway: Arc<GatewayService>,
    server: Option<JoinHandle<()>>,
}

impl HubRuntime {
    /// Build the state machine and gateway from configuration.
    pub fn new(config: HubConfig) -> Result<Self> {
        let mut builder = ActionRegistryBuilder::new();
        register_all(&mut builder, &builtin_modules())
            .context("Failed to register domain modules")?;
        let registry = builder.build();

        let initial = load_initial_state(config.initial_state.as_deref())
            .context("Failed to load initial state")?;

        let machine = Arc::new(StateMachine::new(registry, initial, EventBus::new()));

        let verifier = Arc::new(JwtVerifier::new(&config.gateway.auth));
        let gateway = GatewayService::new(
            config.gateway,
            Arc::clone(&machine) as Arc<dyn StateMachineApi>,
            verifier,
        )
        .context("Invalid gateway configuration")?;

        Ok(Self {
            machine,
            gateway: Arc::new(gateway),
            server: None,
        })
    }

    pub fn machine(&self) -> &Arc<StateMachine> {
        &self.machine
    }

    pub fn gateway(&self) -> &Arc<GatewayService> {
        &self.gateway
    }

    /// Bind the gateway and start serving in the background.
    pub async fn start(&mut self) -> Result<()> {
        let listener = self.gateway.bind().await.context("Failed to bind gateway")?;
        self.start_on(listener)
    }

    /// Serve on an already bound listener.
    pub fn start_on(&mut self, listener: TcpListener) -> Result<()> {
        info!("===========================================");
        info!("  Hearth Hub Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");
        info!(
            actions = self.machine.registry().len(),
            keys = self.machine.get_state().len(),
            "State machine ready"
        );

        let gateway = Arc::clone(&self.gateway);
        self.server = Some(tokio::spawn(async move {
            if let Err(e) = gateway.serve(listener).await {
                error!(error = %e, "Gateway stopped with error");
            }
        }));
        Ok(())
    }

    /// Graceful shutdown: stop the gateway and wait for it to drain.
    pub async fn shutdown(&mut self) {
        info!("Initiating graceful shutdown...");
        self.gateway.shutdown();

        if let Some(server) = self.server.take() {
            if let Err(e) = server.await {
                error!(error = %e, "Gateway task failed");
            }
        }

        info!(
            events_published = self.machine.bus().events_published(),
            listener_failures = self.machine.bus().listener_failures(),
            "Hub stopped"
        );
    }
}
