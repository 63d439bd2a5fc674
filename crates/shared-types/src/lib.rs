//! # Shared Types Crate
//!
//! This crate contains the value types that flow between the state machine,
//! the event bus and the gateway.
//!
//! ## Design Principles
//!
//! - **Snapshots are immutable**: a [`Snapshot`] is an `Arc<State>`; a dispatch
//!   never edits one in place, it swaps in a new one.
//! - **Normalized identity**: an [`ActionId`] is always uppercase, so lookups
//!   and the `action:<ID>` topic agree regardless of how a caller spelled it.
//! - **Top-level diffs**: a [`Diff`] is keyed by top-level state keys only.

pub mod action;
pub mod diff;
pub mod errors;
pub mod payloads;
pub mod state;
pub mod topic;

pub use action::ActionId;
pub use diff::Diff;
pub use errors::*;
pub use payloads::*;
pub use state::{Snapshot, State};
pub use topic::Topic;
