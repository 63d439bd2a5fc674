//! Gateway error types.

use crate::domain::config::ConfigError;
use std::net::SocketAddr;
use thiserror::Error;

/// Why a credential was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Signature, issuer, audience or expiry check failed.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// No credential arrived before the deadline.
    #[error("authentication timed out")]
    Timeout,
}

/// Gateway lifecycle errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
