//! # State Store
//!
//! Holds exactly one current snapshot. Readers get a shared `Arc` view and
//! can never observe a half-applied dispatch: a commit swaps the whole
//! snapshot under a write lock.

use parking_lot::RwLock;
use shared_types::{Snapshot, State};
use std::sync::Arc;

/// The snapshot pair produced by a commit.
#[derive(Debug, Clone)]
pub struct Commit {
    pub previous: Snapshot,
    pub current: Snapshot,
}

/// Exclusively-owned current snapshot.
#[derive(Debug)]
pub struct StateStore {
    current: RwLock<Snapshot>,
}

impl StateStore {
    /// Build the store from the bootstrap snapshot.
    pub fn new(initial: State) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// Shared read-only view of the current snapshot.
    pub fn read(&self) -> Snapshot {
        self.current.read().clone()
    }

    /// Replace the current snapshot.
    ///
    /// `next` is moved in, so no caller keeps a mutable path into the
    /// committed snapshot. Only the dispatcher commits.
    pub(crate) fn commit(&self, next: State) -> Commit {
        let current = Arc::new(next);
        let previous = std::mem::replace(&mut *self.current.write(), Arc::clone(&current));
        Commit { previous, current }
    }
}
