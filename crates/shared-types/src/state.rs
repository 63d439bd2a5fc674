//! # State Snapshots
//!
//! The whole application state is a JSON object keyed by top-level domain
//! keys (`lights`, `spotify`, `bahn`, ...). Top-level keys are the unit of
//! diffing and of topic-scoped subscription.

use crate::errors::StateError;
use serde_json::{Map, Value};
use std::sync::Arc;

/// The application state: top-level key to arbitrary value.
pub type State = Map<String, Value>;

/// An immutable, shared point-in-time view of the state.
pub type Snapshot = Arc<State>;

/// Convert a parsed JSON document into a [`State`].
///
/// Only objects are accepted; the initial snapshot provider uses this to
/// reject e.g. a bare array at bootstrap.
pub fn state_from_value(value: Value) -> Result<State, StateError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StateError::NotAnObject {
            found: kind_of(&other),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
