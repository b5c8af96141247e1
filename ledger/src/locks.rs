//! Per-holder and per-delegate mutual exclusion.
//!
//! Batches touching the same delegate's proxy are serialized; batches with
//! disjoint holders and delegates run concurrently.

use multidelegate_types::{Address, DelegateId};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What a lock protects. Ordered so every batch acquires in the same order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockKey {
    Holder(Address),
    Delegate(DelegateId),
}

#[derive(Default)]
pub struct LockTable {
    locks: Mutex<HashMap<LockKey, Arc<Mutex<()>>>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutexes for `keys`, in key order, created on first use.
    pub fn handles(&self, keys: &BTreeSet<LockKey>) -> Vec<Arc<Mutex<()>>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        keys.iter()
            .map(|key| locks.entry(*key).or_insert_with(|| Arc::new(Mutex::new(()))).clone())
            .collect()
    }

    /// Number of locks currently tracked.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop locks nobody is holding or waiting on.
    pub fn prune(&self) {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}

/// Lock every handle in order. The guards release on drop.
pub fn acquire(handles: &[Arc<Mutex<()>>]) -> Vec<MutexGuard<'_, ()>> {
    handles
        .iter()
        .map(|lock| lock.lock().unwrap_or_else(PoisonError::into_inner))
        .collect()
}
