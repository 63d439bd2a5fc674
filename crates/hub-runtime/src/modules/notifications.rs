//! # Notifications
//!
//! Owns the `notifications` key: an ordered list of user-facing notices.
//!
//! | Action | Payload |
//! |--------|---------|
//! | `NOTIFICATIONS:CREATE` | `{ id, title, createdAt, body?, level? }` |
//! | `NOTIFICATIONS:DISMISS` | `{ id }` |
//!
//! The caller stamps `id` and `createdAt` (RFC 3339); the reducers only read
//! the payload.

use chrono::{DateTime, SecondsFormat, Utc};
use hub_01_state_machine::{ActionModule, ActionRegistryBuilder, RegistryError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_types::State;

/// Top-level state key.
pub const STATE_KEY: &str = "notifications";

pub const CREATE: &str = "NOTIFICATIONS:CREATE";
pub const DISMISS: &str = "NOTIFICATIONS:DISMISS";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotification {
    pub id: String,
    pub title: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub level: Level,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DismissNotification {
    pub id: String,
}

pub struct NotificationsModule;

impl ActionModule for NotificationsModule {
    fn name(&self) -> &'static str {
        STATE_KEY
    }

    fn register(&self, registry: &mut ActionRegistryBuilder) -> Result<(), RegistryError> {
        registry
            .register_typed(CREATE, create, |p: &CreateNotification| {
                !p.id.is_empty() && !p.title.trim().is_empty()
            })?
            .register_typed(DISMISS, dismiss, |p: &DismissNotification| !p.id.is_empty())?;
        Ok(())
    }
}

fn entries(state: &State) -> Vec<Value> {
    state
        .get(STATE_KEY)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn create(state: &State, payload: CreateNotification) -> State {
    let mut list = entries(state);
    // Same id replaces the existing entry.
    list.retain(|entry| entry["id"] != json!(payload.id));
    list.push(json!({
        "id": payload.id,
        "title": payload.title,
        "body": payload.body,
        "level": payload.level,
        "createdAt": payload.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    }));

    let mut next = state.clone();
    next.insert(STATE_KEY.into(), Value::Array(list));
    next
}

fn dismiss(state: &State, payload: DismissNotification) -> State {
    let mut list = entries(state);
    let before = list.len();
    list.retain(|entry| entry["id"] != json!(payload.id));
    if list.len() == before {
        return state.clone();
    }

    let mut next = state.clone();
    next.insert(STATE_KEY.into(), Value::Array(list));
    next
}
