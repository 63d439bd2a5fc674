//! WebSocket module for real-time state streaming.
//!
//! Supports:
//! - `action` forwarding to the dispatcher
//! - `subscribe` / `unsubscribe` on any topic, with `*` relayed on `all-events`
//! - `authenticate` against the connection's auth gate
//! - Message size limits and rate limiting

pub mod connection;
pub mod handler;
pub mod messages;
pub mod registry;

pub use connection::{Connection, SubscribeError};
pub use handler::WebSocketHandler;
pub use messages::{ClientMessage, ServerMessage, ALL_EVENTS};
pub use registry::{ConnectionHandle, ConnectionRegistry};
