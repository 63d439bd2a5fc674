//! # State Machine Service
//!
//! Owns the registry, the store and the bus, and serializes dispatches.

use crate::domain::{diff, ActionRegistry, Commit, DispatchError, StateStore};
use crate::ports::StateMachineApi;
use parking_lot::ReentrantMutex;
use serde_json::Value;
use shared_bus::{EventBus, ListenerResult, Subscription, TopicListener, WildcardListener};
use shared_types::{
    action_applied_payload, key_update_payload, state_update_payload, ActionId, Diff, Snapshot,
    State, Topic,
};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Result of a committed dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Normalized action id.
    pub action: ActionId,
    /// Top-level keys that changed, sorted.
    pub changed: Vec<String>,
}

impl DispatchOutcome {
    /// True when the mutator returned a structurally equal snapshot.
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Dispatch counters.
#[derive(Debug, Default)]
pub struct DispatchStats {
    pub committed: AtomicU64,
    pub unknown: AtomicU64,
    pub rejected: AtomicU64,
}

/// The hub state machine: store, dispatcher and event bus in one owner.
pub struct StateMachine {
    registry: ActionRegistry,
    store: StateStore,
    bus: EventBus,
    dispatch_lock: ReentrantMutex<()>,
    stats: DispatchStats,
}

impl StateMachine {
    /// Build the state machine over a frozen registry and the bootstrap
    /// snapshot.
    pub fn new(registry: ActionRegistry, initial: State, bus: EventBus) -> Self {
        info!(
            actions = registry.len(),
            keys = initial.len(),
            "State machine initialized"
        );
        Self {
            registry,
            store: StateStore::new(initial),
            bus,
            dispatch_lock: ReentrantMutex::new(()),
            stats: DispatchStats::default(),
        }
    }

    /// Validate, apply, commit, diff and publish one action.
    ///
    /// Unknown actions and rejected payloads are logged and returned as
    /// errors without touching the snapshot or publishing anything.
    pub fn dispatch(&self, action: &str, payload: &Value) -> Result<DispatchOutcome, DispatchError> {
        let _serialized = self.dispatch_lock.lock();

        let id = ActionId::normalize(action);
        let Some(descriptor) = self.registry.get(&id) else {
            self.stats.unknown.fetch_add(1, Ordering::Relaxed);
            warn!(action = %id, "Dropping dispatch of unknown action");
            return Err(DispatchError::UnknownAction(id));
        };

        if !descriptor.validate(payload) {
            self.stats.rejected.fetch_add(1, Ordering::Relaxed);
            warn!(action = %id, "Dropping dispatch, payload failed validation");
            return Err(DispatchError::ValidationFailed(id));
        }

        let candidate = descriptor.apply(&self.store.read(), payload);
        let changed = self.commit_and_publish(&id, payload, candidate);
        self.stats.committed.fetch_add(1, Ordering::Relaxed);

        Ok(DispatchOutcome {
            action: id,
            changed: changed.keys().map(str::to_string).collect(),
        })
    }

    /// Swap in `candidate`, then publish `update:<key>`, `update` and
    /// `action:<ID>` in that order.
    fn commit_and_publish(&self, id: &ActionId, payload: &Value, candidate: State) -> Diff {
        let Commit { previous, current } = self.store.commit(candidate);
        let changed = diff(&previous, &current);

        debug!(
            action = %id,
            namespace = id.namespace().unwrap_or_default(),
            verb = id.verb(),
            changed = changed.len(),
            "Snapshot committed"
        );

        if !changed.is_empty() {
            let key_payload = key_update_payload(&changed);
            for key in changed.keys() {
                self.bus.publish(&Topic::update_key(key), &key_payload);
            }
        }
        self.bus
            .publish(&Topic::update(), &state_update_payload(&changed, id));
        self.bus.publish(
            &Topic::action(id),
            &action_applied_payload(&current, id, payload, &changed),
        );

        changed
    }

    /// Current snapshot; treat as read-only.
    pub fn get_state(&self) -> Snapshot {
        self.store.read()
    }

    pub fn subscribe<F>(&self, topic: Topic, listener: F) -> Subscription
    where
        F: Fn(&Value) -> ListenerResult + Send + Sync + 'static,
    {
        self.bus.subscribe(topic, listener)
    }

    pub fn subscribe_all<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Topic, &Value) -> ListenerResult + Send + Sync + 'static,
    {
        self.bus.subscribe_all(listener)
    }

    /// Publish an application-defined event through the state machine's bus.
    pub fn emit(&self, topic: &Topic, payload: &Value) -> usize {
        self.bus.publish(topic, payload)
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }
}

impl StateMachineApi for StateMachine {
    fn dispatch(&self, action: &str, payload: &Value) -> Result<DispatchOutcome, DispatchError> {
        StateMachine::dispatch(self, action, payload)
    }

    fn get_state(&self) -> Snapshot {
        StateMachine::get_state(self)
    }

    fn subscribe(&self, topic: Topic, listener: TopicListener) -> Subscription {
        self.bus.subscribe(topic, listener)
    }

    fn subscribe_all(&self, listener: WildcardListener) -> Subscription {
        self.bus.subscribe_all(listener)
    }

    fn emit(&self, topic: &Topic, payload: &Value) -> usize {
        StateMachine::emit(self, topic, payload)
    }
}
