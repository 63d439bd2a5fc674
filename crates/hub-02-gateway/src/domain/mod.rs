//! Domain types for the gateway.

pub mod config;
pub mod connection_id;
pub mod error;

pub use config::{AuthConfig, ConfigError, GatewayConfig, WebSocketConfig};
pub use connection_id::ConnectionId;
pub use error::{AuthError, GatewayError};
