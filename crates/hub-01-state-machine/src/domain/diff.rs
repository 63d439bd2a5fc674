//! Top-level diff between two snapshots.

use shared_types::{Diff, State};

/// Keys whose values differ between `old` and `new`.
///
/// Values are compared by structural equality, so a nested change shows up
/// as a change of its owning top-level key. A key missing from `new` is
/// reported as removed.
pub fn diff(old: &State, new: &State) -> Diff {
    let mut changed = Diff::new();

    for (key, value) in new {
        if old.get(key) != Some(value) {
            changed.insert(key.clone(), Some(value.clone()));
        }
    }
    for key in old.keys() {
        if !new.contains_key(key) {
            changed.insert(key.clone(), None);
        }
    }

    changed
}
