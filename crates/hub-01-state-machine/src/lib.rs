//! # hub-01-state-machine
//!
//! The single source of truth for the hub: one in-memory snapshot, replaced
//! wholesale by every successful action.
//!
//! ## Role in System
//!
//! - **Action Registry**: domain modules register `{mutator, validator}`
//!   pairs under an [`ActionId`](shared_types::ActionId) at startup.
//! - **Dispatcher**: validates, applies, commits, diffs and publishes.
//! - **Diff Engine**: reports which top-level keys changed.
//!
//! ## Dispatch Flow
//!
//! ```text
//! dispatch(id, payload)
//!     │
//!     ├─ normalize id ── unknown? ──→ UnknownAction (logged, dropped)
//!     ├─ validator(payload) ─ false? → ValidationFailed (logged, dropped)
//!     ├─ mutator(snapshot, payload) → candidate
//!     ├─ commit candidate (atomic swap)
//!     ├─ diff(old, new)
//!     └─ publish: update:<key>... → update → action:<ID>
//! ```
//!
//! ## Serialization
//!
//! Dispatches are serialized by a reentrant lock: other threads wait, while
//! a listener running on the dispatching thread may dispatch again. The
//! nested dispatch sees the already committed snapshot.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::*;
pub use ports::*;
pub use service::{DispatchOutcome, StateMachine};
