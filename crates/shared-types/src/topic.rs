//! # Topics
//!
//! Topics are colon-delimited event names. The state machine publishes
//! three families:
//!
//! | Topic | Published |
//! |-------|-----------|
//! | `update:<key>` | once per changed top-level key |
//! | `update` | once per committed dispatch |
//! | `action:<ACTION_ID>` | once per committed dispatch |
//!
//! Applications may publish any other name. The single pattern `*` matches
//! every publish.

use crate::action::ActionId;
use crate::errors::TopicError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The wildcard topic pattern.
pub const WILDCARD: &str = "*";

/// Prefix of the per-action topic.
pub const ACTION_PREFIX: &str = "action";

/// Name (and prefix) of the state update topics.
pub const UPDATE: &str = "update";

/// A topic name or the `*` pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Build a topic from an arbitrary application-defined name.
    pub fn new(name: impl Into<String>) -> Result<Self, TopicError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TopicError::Empty);
        }
        Ok(Self(name))
    }

    /// The `*` pattern.
    pub fn wildcard() -> Self {
        Self(WILDCARD.to_string())
    }

    /// `update`
    pub fn update() -> Self {
        Self(UPDATE.to_string())
    }

    /// `update:<key>`
    pub fn update_key(key: &str) -> Self {
        Self(format!("{UPDATE}:{key}"))
    }

    /// `action:<ACTION_ID>`
    pub fn action(id: &ActionId) -> Self {
        Self(format!("{ACTION_PREFIX}:{id}"))
    }

    /// True for the `*` pattern.
    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD
    }

    /// The topic as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for Topic {
    type Error = TopicError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for Topic {
    type Error = TopicError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
