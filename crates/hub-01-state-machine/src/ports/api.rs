use crate::domain::DispatchError;
use crate::service::DispatchOutcome;
use serde_json::Value;
use shared_bus::{Subscription, TopicListener, WildcardListener};
use shared_types::{Snapshot, Topic};

/// What the gateway (and any other driver) needs from the state machine.
pub trait StateMachineApi: Send + Sync {
    // === Mutation ===

    /// The single mutation entry point. Failures are already logged.
    fn dispatch(&self, action: &str, payload: &Value) -> Result<DispatchOutcome, DispatchError>;

    // === Reads ===

    /// Current snapshot; treat as read-only.
    fn get_state(&self) -> Snapshot;

    // === Events ===

    fn subscribe(&self, topic: Topic, listener: TopicListener) -> Subscription;

    /// Listen on `*`; the listener receives the concrete topic.
    fn subscribe_all(&self, listener: WildcardListener) -> Subscription;

    /// Publish an application-defined event.
    fn emit(&self, topic: &Topic, payload: &Value) -> usize;
}
