//! # Diff
//!
//! The set of top-level keys whose values changed across one dispatch,
//! each mapped to its new value. A removed key maps to `None` and is
//! rendered as `null` on the wire.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Changed top-level keys and their new values.
///
/// Keys iterate in sorted order, which fixes the order of the
/// `update:<key>` publishes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diff(BTreeMap<String, Option<Value>>);

impl Diff {
    /// An empty diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a changed key. `None` marks a removal.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<Value>) {
        self.0.insert(key.into(), value);
    }

    /// True if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of changed keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if `key` changed.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The new value of a changed key. `Some(None)` means the key was removed.
    pub fn get(&self, key: &str) -> Option<Option<&Value>> {
        self.0.get(key).map(Option::as_ref)
    }

    /// Changed keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// The diff as a JSON object; removed keys become `null`.
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .0
            .iter()
            .map(|(key, value)| (key.clone(), value.clone().unwrap_or(Value::Null)))
            .collect();
        Value::Object(map)
    }

    /// The changed keys as a JSON array of strings.
    pub fn keys_value(&self) -> Value {
        Value::Array(self.keys().map(|key| Value::String(key.to_string())).collect())
    }
}
