//! Scalar store: one value per key.
//!
//! One `ScalarStore` lives in every shard. All operations run under the
//! store's mutex; there is no reader/writer split because reads evict
//! expired entries.

use crate::storage::entry::Entry;
use crate::storage::error::{StoreError, StoreResult};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Key to (value, deadline) map for a single shard.
#[derive(Debug, Default)]
pub struct ScalarStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl ScalarStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or overwrites `key`, expiring `ttl` from now.
    ///
    /// Returns `true` if the key was new.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>, ttl: Duration) -> bool {
        let mut entries = self.lock();
        entries.insert(key.into(), Entry::new(value, ttl)).is_none()
    }

    /// Gets the value for a key.
    ///
    /// An entry found past its deadline is removed and reported as absent.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.lock();
        let entry = entries.get(key)?;

        if entry.is_expired() {
            entries.remove(key);
            debug!(key = %key, "Evicted expired key on read");
            return None;
        }

        Some(entry.value.clone())
    }

    /// Returns every live key in this shard, in no particular order.
    ///
    /// Expired entries met during the walk are removed.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();

        entries.retain(|_, entry| !entry.is_expired_at(now));

        let evicted = before - entries.len();
        if evicted > 0 {
            debug!(evicted = evicted, "Evicted expired keys during walk");
        }

        entries.keys().cloned().collect()
    }

    /// Number of entries held by this shard.
    ///
    /// This does not purge: entries that expired but were never touched
    /// are still counted.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes a key.
    pub fn remove(&self, key: &str) -> StoreResult<()> {
        self.lock()
            .remove(key)
            .map(|_| ())
            .ok_or(StoreError::KeyNotFound)
    }
}
