//! Wire frames.
//!
//! Every frame in either direction is a JSON object `{ "event": .., "data": .. }`.
//!
//! | Direction | event | data |
//! |-----------|-------|------|
//! | in | `action` | `{ action, data }` |
//! | in | `subscribe` / `unsubscribe` | `{ event }` |
//! | in | `authenticate` | `{ token }` |
//! | out | `initial-state` | `{ state }` |
//! | out | `authenticated` | `null` |
//! | out | `unauthorized` | `{ type: TIMEOUT \| INVALID_TOKEN }` |
//! | out | `<subscribed name>` | published payload |
//! | out | `all-events` | `{ event: topic, data: payload }` |
//! | out | `error` | `{ message }` |

use crate::auth::UnauthorizedReason;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use shared_types::{State, Topic};

/// Channel used for relays of `*` subscriptions.
pub const ALL_EVENTS: &str = "all-events";

/// Inbound client frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    Action {
        action: String,
        #[serde(default)]
        data: Value,
    },
    Subscribe {
        event: String,
    },
    Unsubscribe {
        event: String,
    },
    Authenticate {
        token: String,
    },
}

/// Outbound frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerMessage {
    pub event: String,
    pub data: Value,
}

impl ServerMessage {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    pub fn initial_state(state: &State) -> Self {
        Self::new("initial-state", json!({ "state": state }))
    }

    pub fn authenticated() -> Self {
        Self::new("authenticated", Value::Null)
    }

    pub fn unauthorized(reason: UnauthorizedReason) -> Self {
        Self::new("unauthorized", json!({ "type": reason }))
    }

    /// Relay of a named subscription.
    pub fn relay(event: &str, payload: &Value) -> Self {
        Self::new(event, payload.clone())
    }

    /// Relay of a `*` subscription, tagged with the concrete topic.
    pub fn all_events(topic: &Topic, payload: &Value) -> Self {
        Self::new(
            ALL_EVENTS,
            json!({ "event": topic.as_str(), "data": payload }),
        )
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new("error", json!({ "message": message.into() }))
    }

    /// Render as a text frame.
    pub fn to_text(&self) -> String {
        let mut frame = Map::new();
        frame.insert("event".into(), Value::String(self.event.clone()));
        frame.insert("data".into(), self.data.clone());
        Value::Object(frame).to_string()
    }
}
