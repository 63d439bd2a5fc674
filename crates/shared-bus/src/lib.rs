//! # Shared Bus - Topic Event Bus
//!
//! A synchronous publish/subscribe mechanism over colon-delimited topic
//! names, with one special pattern: `*` receives every publish together
//! with the concrete topic it was published under.
//!
//! ```text
//! ┌──────────────┐                      ┌──────────────┐
//! │ StateMachine │                      │   Gateway    │
//! │              │    publish()         │  connection  │
//! │              │ ──────┐              │              │
//! └──────────────┘       │              └──────────────┘
//!                        ▼                      ↑
//!                  ┌──────────────┐             │
//!                  │  Event Bus   │ ────────────┘
//!                  │              │  subscribe() / subscribe_all()
//!                  └──────────────┘
//! ```
//!
//! ## Delivery Rules
//!
//! - `publish` runs every matching listener on the calling thread, in
//!   registration order, before it returns. Nothing is queued.
//! - A listener that returns an error or panics is logged and counted; the
//!   remaining listeners of the same publish still run.
//! - No replay: a subscription only sees publishes made after it was created.
//! - Listeners may publish, subscribe or unsubscribe from inside a callback.
//!   The set of listeners for a publish is fixed when the publish starts.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use publisher::EventBus;
pub use subscriber::{ListenerResult, Subscription, TopicListener, WildcardListener};
