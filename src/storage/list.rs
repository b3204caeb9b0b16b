//! List store: per-key ordered lists addressed by position.
//!
//! Each key owns a [`NodeList`] of entries in insertion order. Setting a
//! value that is already in the list refreshes that node's deadline instead
//! of appending a duplicate, so a list never holds the same value twice.
//! A list whose last node goes away is removed together with its key.
//!
//! Expiry is judged per node: `get` looks only at the addressed node,
//! `keys` sweeps the whole list, `len` counts nodes without sweeping.

use crate::storage::entry::Entry;
use crate::storage::error::{SetOutcome, StoreError, StoreResult};
use crate::storage::linked::NodeList;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Key to ordered list map for a single shard.
#[derive(Debug, Default)]
pub struct ListStore {
    lists: Mutex<HashMap<String, NodeList<Entry>>>,
}

impl ListStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, NodeList<Entry>>> {
        self.lists.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `value` to the list at `key`, or refreshes its deadline if the
    /// list already holds it.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>, ttl: Duration) -> SetOutcome {
        let value = value.into();
        let mut lists = self.lock();
        let list = lists.entry(key.into()).or_default();

        if let Some(entry) = list
            .find(|entry| entry.value == value)
            .and_then(|id| list.get_mut(id))
        {
            let outcome = if entry.is_expired() {
                SetOutcome::ReplacedExpired
            } else {
                SetOutcome::Updated
            };
            entry.refresh(ttl);
            return outcome;
        }

        list.push_back(Entry::new(value, ttl));
        SetOutcome::Inserted
    }

    /// Gets the value at zero-based `index`.
    ///
    /// If the addressed node has expired it is unlinked and `None` is
    /// returned, even when later nodes are still live.
    pub fn get(&self, key: &str, index: usize) -> Option<String> {
        let mut lists = self.lock();
        let list = lists.get_mut(key)?;
        let id = list.nth(index)?;
        let entry = list.get(id)?;

        if entry.is_expired() {
            list.remove(id);
            if list.is_empty() {
                lists.remove(key);
            }
            debug!(key = %key, index = index, "Evicted expired list node on read");
            return None;
        }

        Some(entry.value.clone())
    }

    /// Number of nodes in the list, or `None` if the key is absent.
    ///
    /// This does not purge expired nodes.
    pub fn len(&self, key: &str) -> Option<usize> {
        self.lock().get(key).map(NodeList::len)
    }

    /// All live values in list order. Expired nodes met on the way are
    /// unlinked. An absent key yields an empty list.
    pub fn keys(&self, key: &str) -> Vec<String> {
        let now = Instant::now();
        let mut lists = self.lock();
        let Some(list) = lists.get_mut(key) else {
            return Vec::new();
        };

        let evicted = list.retain(|entry| !entry.is_expired_at(now));
        if evicted > 0 {
            debug!(key = %key, evicted = evicted, "Evicted expired list nodes during walk");
        }

        let values: Vec<String> = list.iter().map(|(_, entry)| entry.value.clone()).collect();
        if values.is_empty() {
            lists.remove(key);
        }
        values
    }

    /// Removes the node at zero-based `index`.
    ///
    /// Removing the only node removes the key.
    pub fn remove(&self, key: &str, index: usize) -> StoreResult<()> {
        let mut lists = self.lock();
        let list = lists.get_mut(key).ok_or(StoreError::KeyNotFound)?;

        let len = list.len();
        let id = list
            .nth(index)
            .ok_or(StoreError::IndexOutOfRange { index, len })?;
        list.remove(id);

        if list.is_empty() {
            lists.remove(key);
        }
        Ok(())
    }
}
