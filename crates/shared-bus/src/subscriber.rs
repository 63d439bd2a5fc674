//! # Event Subscriber
//!
//! Defines the subscription side of the event bus.

use parking_lot::RwLock;
use serde_json::Value;
use shared_types::Topic;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

/// What a listener returns. An `Err` is logged and counted by the bus.
pub type ListenerResult = anyhow::Result<()>;

/// A boxed listener for a single topic.
pub type TopicListener = Box<dyn Fn(&Value) -> ListenerResult + Send + Sync>;

/// A boxed listener for the `*` pattern; receives the concrete topic too.
pub type WildcardListener = Box<dyn Fn(&Topic, &Value) -> ListenerResult + Send + Sync>;

pub(crate) type Callback = Arc<dyn Fn(&Topic, &Value) -> ListenerResult + Send + Sync>;

/// One registration. Ids increase monotonically across the whole bus, so
/// sorting by id yields registration order.
#[derive(Clone)]
pub(crate) struct Entry {
    pub(crate) id: u64,
    pub(crate) callback: Callback,
}

/// Listener tables shared by the bus and its subscription handles.
#[derive(Default)]
pub(crate) struct Registry {
    next_id: AtomicU64,
    topics: RwLock<HashMap<Topic, Vec<Entry>>>,
    wildcard: RwLock<Vec<Entry>>,
}

impl Registry {
    pub(crate) fn insert(&self, topic: &Topic, callback: Callback) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let entry = Entry { id, callback };
        if topic.is_wildcard() {
            self.wildcard.write().push(entry);
        } else {
            self.topics
                .write()
                .entry(topic.clone())
                .or_default()
                .push(entry);
        }
        id
    }

    pub(crate) fn remove(&self, topic: &Topic, id: u64) -> bool {
        if topic.is_wildcard() {
            let mut wildcard = self.wildcard.write();
            let before = wildcard.len();
            wildcard.retain(|entry| entry.id != id);
            return wildcard.len() != before;
        }

        let mut topics = self.topics.write();
        let Some(entries) = topics.get_mut(topic) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            topics.remove(topic);
        }
        removed
    }

    /// Listeners for `topic` plus wildcard listeners, in registration order.
    ///
    /// The locks are released before returning so callbacks can re-enter
    /// the bus.
    pub(crate) fn matching(&self, topic: &Topic) -> Vec<Entry> {
        let exact = if topic.is_wildcard() {
            Vec::new()
        } else {
            self.topics.read().get(topic).cloned().unwrap_or_default()
        };
        let wildcard = self.wildcard.read().clone();
        merge_by_id(exact, wildcard)
    }

    pub(crate) fn len(&self) -> usize {
        let exact: usize = self.topics.read().values().map(Vec::len).sum();
        exact + self.wildcard.read().len()
    }

    pub(crate) fn len_for(&self, topic: &Topic) -> usize {
        if topic.is_wildcard() {
            return self.wildcard.read().len();
        }
        self.topics.read().get(topic).map_or(0, Vec::len)
    }
}

/// Merge two id-sorted lists into one id-sorted list.
fn merge_by_id(left: Vec<Entry>, right: Vec<Entry>) -> Vec<Entry> {
    if right.is_empty() {
        return left;
    }
    if left.is_empty() {
        return right;
    }

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => l.id < r.id,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        merged.extend(next);
    }
    merged
}

/// A subscription handle.
///
/// Dropping the handle unsubscribes. Use [`Subscription::detach`] to keep
/// the registration for the lifetime of the bus.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    topic: Topic,
    registry: Weak<Registry>,
    active: AtomicBool,
    detached: bool,
}

impl Subscription {
    pub(crate) fn new(id: u64, topic: Topic, registry: &Arc<Registry>) -> Self {
        Self {
            id,
            topic,
            registry: Arc::downgrade(registry),
            active: AtomicBool::new(true),
            detached: false,
        }
    }

    /// Registration id, unique per bus.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The topic (or `*`) this subscription listens on.
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// False once [`Subscription::unsubscribe`] ran.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Remove exactly this registration. Calling it again is harmless.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        if registry.remove(&self.topic, self.id) {
            debug!(topic = %self.topic, subscription = self.id, "Subscription removed");
        }
    }

    /// Keep the registration alive after this handle is dropped.
    pub fn detach(mut self) {
        self.detached = true;
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.detached {
            self.unsubscribe();
        }
    }
}
