//! HUB-02 Gateway - authenticated real-time access to the hub state machine.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      GATEWAY (hub-02)                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │   WebSocket /ws (port 8546)            GET /health            │
//! │          │                                                    │
//! │   ┌──────┴─────────────────────────────────────────┐          │
//! │   │ WebSocketHandler (one task per connection)      │          │
//! │   │   size limit → rate limit → parse → route       │          │
//! │   └──────┬───────────────────┬─────────────────────┘          │
//! │          │                   │                                │
//! │   ┌──────┴──────┐     ┌──────┴───────────────────┐            │
//! │   │  AuthGate   │     │ Connection               │            │
//! │   │ PENDING →   │────►│  subscriptions (RAII)    │            │
//! │   │ AUTH/CLOSED │     │  ConnectionHandle        │            │
//! │   └─────────────┘     │   (eligible? → relay)    │            │
//! │                       └──────┬───────────────────┘            │
//! └──────────────────────────────┼───────────────────────────────┘
//!                                │ dispatch / subscribe
//!                         hub-01-state-machine
//! ```
//!
//! # Delivery rule
//!
//! A connection may subscribe at any time, but relays reach it only while
//! its gate is AUTHENTICATED. The initial snapshot is the one exception: it
//! is sent on connect, in every phase.
//!
//! # Usage
//!
//! ```ignore
//! use hub_02_gateway::{GatewayConfig, GatewayService, JwtVerifier};
//!
//! let verifier = Arc::new(JwtVerifier::new(&config.auth));
//! let service = GatewayService::new(config, machine, verifier)?;
//! service.start().await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod auth;
pub mod domain;
pub mod service;
pub mod ws;

pub use auth::{AuthGate, AuthPhase, Claims, CredentialVerifier, JwtVerifier, UnauthorizedReason};
pub use domain::{AuthConfig, AuthError, ConfigError, ConnectionId, GatewayConfig, GatewayError, WebSocketConfig};
pub use service::GatewayService;
pub use ws::{ConnectionRegistry, ServerMessage};
