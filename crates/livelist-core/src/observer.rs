//! Weakly-referenced observer registry.
//!
//! [`ObserverSet`] stores `Weak` handles only. An observer's lifetime belongs
//! to whoever holds its `Arc`; once that is dropped the entry is pruned on the
//! next access. Membership is by allocation identity, so registering the same
//! observer twice keeps one entry.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Unordered set of weakly-held observers.
pub struct ObserverSet<O: ?Sized> {
    entries: Mutex<Vec<Weak<O>>>,
}

impl<O: ?Sized> ObserverSet<O> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Insert `observer`. Returns `false` if it was already present.
    pub fn insert(&self, observer: &Arc<O>) -> bool {
        let mut entries = self.live_entries();
        if entries.iter().any(|entry| same_allocation(entry, observer)) {
            return false;
        }
        entries.push(Arc::downgrade(observer));
        true
    }

    /// Remove `observer`. Returns `false` if it was not present.
    pub fn remove(&self, observer: &Arc<O>) -> bool {
        let mut entries = self.live_entries();
        let before = entries.len();
        entries.retain(|entry| !same_allocation(entry, observer));
        entries.len() != before
    }

    pub fn contains(&self, observer: &Arc<O>) -> bool {
        self.live_entries()
            .iter()
            .any(|entry| same_allocation(entry, observer))
    }

    /// Number of live observers.
    pub fn len(&self) -> usize {
        self.live_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Strong handles to every live observer, in no particular order.
    ///
    /// The lock is released before this returns, so callers may notify the
    /// snapshot while observers register or unregister.
    pub fn snapshot(&self) -> Vec<Arc<O>> {
        self.live_entries()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Weak<O>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the entries after dropping any whose observer is gone.
    fn live_entries(&self) -> MutexGuard<'_, Vec<Weak<O>>> {
        let mut entries = self.lock();
        entries.retain(|entry| entry.strong_count() > 0);
        entries
    }
}

impl<O: ?Sized> Default for ObserverSet<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: ?Sized> std::fmt::Debug for ObserverSet<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverSet")
            .field("len", &self.len())
            .finish()
    }
}

// Callers prune dead entries under the same lock first, so every compared
// address belongs to a live allocation and cannot have been reused.
fn same_allocation<O: ?Sized>(entry: &Weak<O>, observer: &Arc<O>) -> bool {
    std::ptr::addr_eq(entry.as_ptr(), Arc::as_ptr(observer))
}
