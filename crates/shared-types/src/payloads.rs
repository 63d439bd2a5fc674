//! # Event Payloads
//!
//! Builders for the payloads the state machine publishes after a commit.
//! Payloads are plain JSON so that gateway relays can forward them
//! verbatim.

use crate::action::ActionId;
use crate::diff::Diff;
use crate::state::State;
use serde_json::{Map, Value};

/// Payload of `update:<key>`: `{ state: diff }`.
///
/// Every key topic receives the complete diff, not only its own entry.
pub fn key_update_payload(diff: &Diff) -> Value {
    let mut payload = Map::new();
    payload.insert("state".into(), diff.to_value());
    Value::Object(payload)
}

/// Payload of `update`: `{ state: diff, action, diff: [keys] }`.
pub fn state_update_payload(diff: &Diff, action: &ActionId) -> Value {
    let mut payload = Map::new();
    payload.insert("state".into(), diff.to_value());
    payload.insert("action".into(), Value::String(action.to_string()));
    payload.insert("diff".into(), diff.keys_value());
    Value::Object(payload)
}

/// Payload of `action:<ID>`: `{ state: snapshot, action, actionData, diff: [keys] }`.
pub fn action_applied_payload(
    snapshot: &State,
    action: &ActionId,
    action_data: &Value,
    diff: &Diff,
) -> Value {
    let mut payload = Map::new();
    payload.insert("state".into(), Value::Object(snapshot.clone()));
    payload.insert("action".into(), Value::String(action.to_string()));
    payload.insert("actionData".into(), action_data.clone());
    payload.insert("diff".into(), diff.keys_value());
    Value::Object(payload)
}
