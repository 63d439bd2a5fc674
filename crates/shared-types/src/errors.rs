//! # Error Types
//!
//! Defines error types shared across crates.

use thiserror::Error;

/// Errors raised when an action identifier is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionIdError {
    /// The identifier was empty after trimming.
    #[error("Action id is empty")]
    Empty,

    /// A colon-delimited segment was empty (e.g. `LIGHTS:` or `:ON`).
    #[error("Action id {id:?} has an empty segment")]
    EmptySegment { id: String },

    /// The identifier contained whitespace.
    #[error("Action id {id:?} contains whitespace")]
    Whitespace { id: String },
}

/// Errors raised when a topic name is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicError {
    /// The topic name was empty.
    #[error("Topic is empty")]
    Empty,
}

/// Errors raised when a document cannot be used as a state snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The document's root was not a JSON object.
    #[error("State root must be an object, got {found}")]
    NotAnObject { found: &'static str },
}
