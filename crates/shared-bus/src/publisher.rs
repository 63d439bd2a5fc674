//! # Event Publisher
//!
//! Defines the publishing side of the event bus.

use crate::subscriber::{Callback, ListenerResult, Registry, Subscription};
use serde_json::Value;
use shared_types::Topic;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

/// Counters kept by the bus.
#[derive(Debug, Default)]
struct BusStats {
    events_published: AtomicU64,
    listener_failures: AtomicU64,
}

/// In-memory, synchronous event bus.
///
/// Cloning is cheap; clones share listeners and counters. Suitable for a
/// single process; there is no cross-process fan-out.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Registry>,
    stats: Arc<BusStats>,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one topic.
    ///
    /// Subscribing to `*` through this method registers a wildcard listener
    /// that only sees the payload; use [`EventBus::subscribe_all`] to also
    /// receive the topic.
    pub fn subscribe<F>(&self, topic: Topic, listener: F) -> Subscription
    where
        F: Fn(&Value) -> ListenerResult + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(move |_: &Topic, payload: &Value| listener(payload));
        self.register(topic, callback)
    }

    /// Subscribe to every topic. The listener receives `(topic, payload)`.
    pub fn subscribe_all<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Topic, &Value) -> ListenerResult + Send + Sync + 'static,
    {
        self.register(Topic::wildcard(), Arc::new(listener))
    }

    fn register(&self, topic: Topic, callback: Callback) -> Subscription {
        let id = self.registry.insert(&topic, callback);
        debug!(topic = %topic, subscription = id, "New subscription created");
        Subscription::new(id, topic, &self.registry)
    }

    /// Publish `payload` under `topic`.
    ///
    /// Runs every matching listener before returning and reports how many
    /// were invoked, including ones that failed.
    pub fn publish(&self, topic: &Topic, payload: &Value) -> usize {
        self.stats.events_published.fetch_add(1, Ordering::Relaxed);

        let listeners = self.registry.matching(topic);
        for entry in &listeners {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (entry.callback)(topic, payload)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    self.stats.listener_failures.fetch_add(1, Ordering::Relaxed);
                    error!(
                        topic = %topic,
                        subscription = entry.id,
                        error = %e,
                        "Listener failed"
                    );
                }
                Err(panic) => {
                    self.stats.listener_failures.fetch_add(1, Ordering::Relaxed);
                    error!(
                        topic = %topic,
                        subscription = entry.id,
                        panic = panic_message(panic.as_ref()),
                        "Listener panicked"
                    );
                }
            }
        }

        debug!(topic = %topic, listeners = listeners.len(), "Event published");
        listeners.len()
    }

    /// Total publishes, whether or not anyone was listening.
    pub fn events_published(&self) -> u64 {
        self.stats.events_published.load(Ordering::Relaxed)
    }

    /// Total listener invocations that returned an error or panicked.
    pub fn listener_failures(&self) -> u64 {
        self.stats.listener_failures.load(Ordering::Relaxed)
    }

    /// Active registrations across all topics, wildcard included.
    pub fn listener_count(&self) -> usize {
        self.registry.len()
    }

    /// Active registrations for exactly `topic` (`*` counts wildcard ones).
    pub fn topic_listener_count(&self, topic: &Topic) -> usize {
        self.registry.len_for(topic)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .field("events_published", &self.events_published())
            .finish()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
