//! Gateway service - main entry point.
//!
//! Serves the WebSocket endpoint and a `/health` route on one listener.

use crate::auth::CredentialVerifier;
use crate::domain::{GatewayConfig, GatewayError};
use crate::ws::{ConnectionRegistry, WebSocketHandler};
use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use hub_01_state_machine::StateMachineApi;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Gateway service state
pub struct GatewayService {
    config: Arc<GatewayConfig>,
    machine: Arc<dyn StateMachineApi>,
    verifier: Arc<dyn CredentialVerifier>,
    connections: Arc<ConnectionRegistry>,
    shutdown_tx: watch::Sender<bool>,
}

/// Shared state for the route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<GatewayConfig>,
    machine: Arc<dyn StateMachineApi>,
    verifier: Arc<dyn CredentialVerifier>,
    connections: Arc<ConnectionRegistry>,
    shutdown: watch::Receiver<bool>,
}

impl GatewayService {
    /// Create a new gateway service
    pub fn new(
        config: GatewayConfig,
        machine: Arc<dyn StateMachineApi>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Result<Self, GatewayError> {
        // Validate configuration
        config.validate()?;

        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config: Arc::new(config),
            machine,
            verifier,
            connections: Arc::new(ConnectionRegistry::new()),
            shutdown_tx,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Live connection registry
    pub fn connections(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.connections)
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, GatewayError> {
        let addr = self.config.ws_addr();
        TcpListener::bind(addr)
            .await
            .map_err(|source| GatewayError::Bind { addr, source })
    }

    /// Bind and serve until [`GatewayService::shutdown`] is called.
    pub async fn start(&self) -> Result<(), GatewayError> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GatewayError> {
        let local_addr: Option<SocketAddr> = listener.local_addr().ok();
        info!(
            addr = ?local_addr,
            path = %self.config.websocket.path,
            "Starting WebSocket gateway"
        );

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
            })
            .await
            .map_err(GatewayError::Serve)?;

        info!("WebSocket gateway stopped");
        Ok(())
    }

    /// Trigger graceful shutdown; open connections are closed.
    pub fn shutdown(&self) {
        info!("Gateway shutdown requested");
        self.shutdown_tx.send_replace(true);
    }

    /// Build the router: WebSocket upgrade plus health check.
    pub fn router(&self) -> Router {
        let state = AppState {
            config: Arc::clone(&self.config),
            machine: Arc::clone(&self.machine),
            verifier: Arc::clone(&self.verifier),
            connections: Arc::clone(&self.connections),
            shutdown: self.shutdown_tx.subscribe(),
        };

        Router::new()
            .route(&self.config.websocket.path, get(handle_ws_upgrade))
            .route("/health", get(health_check))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

async fn handle_ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        let handler = WebSocketHandler::new(
            state.machine,
            state.verifier,
            state.connections,
            &state.config,
        );
        handler.handle(socket, state.shutdown)
    })
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "connections": state.connections.connection_count(),
        "authenticated": state.connections.authenticated_count(),
    }))
}
