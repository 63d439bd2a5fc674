//! # Action Identifiers
//!
//! Actions are named `NAMESPACE:VERB` (e.g. `NOTIFICATIONS:CREATE`). Ids are
//! case-folded to uppercase before lookup and before being used as the
//! suffix of an `action:<ID>` topic.

use crate::errors::ActionIdError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Segment separator inside an action id.
pub const ACTION_SEPARATOR: char = ':';

/// A normalized (uppercased) action identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    /// Parse and validate an id for registration.
    ///
    /// Rejects empty ids, empty colon segments and embedded whitespace.
    /// Any number of segments is accepted so domain modules stay free to
    /// nest namespaces.
    pub fn parse(raw: &str) -> Result<Self, ActionIdError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ActionIdError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(ActionIdError::Whitespace {
                id: trimmed.to_string(),
            });
        }
        if trimmed.split(ACTION_SEPARATOR).any(str::is_empty) {
            return Err(ActionIdError::EmptySegment {
                id: trimmed.to_string(),
            });
        }
        Ok(Self::normalize(trimmed))
    }

    /// Normalize an id for lookup without validating it.
    ///
    /// Dispatch uses this: a malformed id simply never matches a registered
    /// action and is reported as unknown.
    pub fn normalize(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the first separator, if there is one.
    pub fn namespace(&self) -> Option<&str> {
        self.0
            .split_once(ACTION_SEPARATOR)
            .map(|(namespace, _)| namespace)
    }

    /// The part after the first separator, or the whole id.
    pub fn verb(&self) -> &str {
        self.0
            .split_once(ACTION_SEPARATOR)
            .map_or(self.0.as_str(), |(_, verb)| verb)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ActionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
