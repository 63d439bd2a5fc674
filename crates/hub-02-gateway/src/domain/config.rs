//! Gateway configuration with validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

/// Default WebSocket port
pub const DEFAULT_WS_PORT: u16 = 8546;

/// Default maximum inbound message size (1MB)
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Default rate limit (100 messages per second)
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Default time a connection may stay unauthenticated
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(15);

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// WebSocket server configuration
    pub websocket: WebSocketConfig,
    /// Credential verification and auth deadline
    pub auth: AuthConfig,
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.websocket.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        if !self.websocket.path.starts_with('/') {
            return Err(ConfigError::InvalidPath(self.websocket.path.clone()));
        }

        if self.websocket.max_message_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_message_size cannot be 0".into(),
            ));
        }

        if self.websocket.rate_limit == 0 {
            return Err(ConfigError::InvalidLimit("rate_limit cannot be 0".into()));
        }

        if self.websocket.outbound_buffer == 0 {
            return Err(ConfigError::InvalidLimit(
                "outbound_buffer cannot be 0".into(),
            ));
        }

        if self.auth.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "auth timeout cannot be 0".into(),
            ));
        }

        if self.auth.secret.is_empty() {
            return Err(ConfigError::MissingAuthParameter("secret"));
        }
        if self.auth.issuer.is_empty() {
            return Err(ConfigError::MissingAuthParameter("issuer"));
        }
        if self.auth.audience.is_empty() {
            return Err(ConfigError::MissingAuthParameter("audience"));
        }

        Ok(())
    }

    /// Get WebSocket server bind address
    pub fn ws_addr(&self) -> SocketAddr {
        SocketAddr::new(self.websocket.host, self.websocket.port)
    }
}

/// WebSocket server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8546)
    pub port: u16,
    /// Upgrade route (default: /ws)
    pub path: String,
    /// Maximum inbound message size in bytes
    pub max_message_size: usize,
    /// Rate limit (messages per second per connection)
    pub rate_limit: u32,
    /// Outbound frames queued per connection before relays are dropped
    pub outbound_buffer: usize,
    /// Max subscriptions per connection
    pub max_subscriptions_per_connection: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: DEFAULT_WS_PORT,
            path: "/ws".to_string(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            rate_limit: DEFAULT_RATE_LIMIT,
            outbound_buffer: 256,
            max_subscriptions_per_connection: 100,
        }
    }
}

/// Trust parameters for client credentials.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// How long a connection may stay unauthenticated
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// HMAC signing secret shared with the SSO issuer
    pub secret: String,
    /// Expected `iss` claim
    pub issuer: String,
    /// Expected `aud` claim
    pub audience: String,
    /// Allowed clock skew when checking `exp`, in seconds
    pub leeway: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_AUTH_TIMEOUT,
            // MUST be overridden in production
            secret: String::new(),
            issuer: "hearth-sso".to_string(),
            audience: "hearth-hub".to_string(),
            leeway: 30,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("timeout", &self.timeout)
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway", &self.leeway)
            .finish()
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("port cannot be 0")]
    InvalidPort,
    #[error("websocket path must start with '/': {0}")]
    InvalidPath(String),
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    #[error("auth {0} must be set")]
    MissingAuthParameter(&'static str),
}
