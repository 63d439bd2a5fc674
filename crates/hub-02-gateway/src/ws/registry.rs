//! Live connections and their broadcast eligibility.

use crate::domain::ConnectionId;
use crate::ws::messages::ServerMessage;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// The shared half of a connection: what bus listeners hold to reach it.
///
/// Relays are pushed with `try_send` because bus listeners run
/// synchronously inside `dispatch` and must never wait on a socket.
#[derive(Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    eligible: AtomicBool,
    outbound: mpsc::Sender<ServerMessage>,
    dropped: AtomicU64,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, outbound: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            id,
            eligible: AtomicBool::new(false),
            outbound,
            dropped: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// True once the connection authenticated and until it closes.
    pub fn is_eligible(&self) -> bool {
        self.eligible.load(Ordering::Acquire)
    }

    pub fn set_eligible(&self, eligible: bool) {
        self.eligible.store(eligible, Ordering::Release);
    }

    /// Broadcast fan-out. Suppressed unless the connection is eligible.
    pub fn deliver(&self, message: ServerMessage) -> bool {
        if !self.is_eligible() {
            debug!(
                connection_id = %self.id,
                event = %message.event,
                "Suppressing relay to unauthenticated connection"
            );
            return false;
        }
        self.send(message)
    }

    /// Direct reply to this client, regardless of auth phase.
    pub fn send(&self, message: ServerMessage) -> bool {
        match self.outbound.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(message)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    connection_id = %self.id,
                    event = %message.event,
                    "Outbound buffer full, dropping frame"
                );
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Frames dropped because the client was not draining fast enough.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// All open connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, handle: Arc<ConnectionHandle>) {
        self.connections.insert(handle.id(), handle);
    }

    pub fn remove(&self, id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.connections.remove(id).map(|(_, handle)| handle)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Connections currently eligible for broadcasts.
    pub fn authenticated_count(&self) -> usize {
        self.connections
            .iter()
            .filter(|entry| entry.value().is_eligible())
            .count()
    }
}
