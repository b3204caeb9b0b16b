//! Dictionary store: named dictionaries of key/value pairs.
//!
//! A dictionary appears on its first `set` and disappears when its last key
//! is removed or found expired. The outer map never holds an empty
//! dictionary.

use crate::storage::entry::Entry;
use crate::storage::error::{SetOutcome, StoreError, StoreResult};
use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

type Dictionary = HashMap<String, Entry>;

/// Dictionary name to dictionary map for a single shard.
#[derive(Debug, Default)]
pub struct DictStore {
    dicts: Mutex<HashMap<String, Dictionary>>,
}

impl DictStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Dictionary>> {
        self.dicts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets `key` inside dictionary `name`, creating the dictionary if needed.
    ///
    /// Overwriting a key that had already expired still succeeds; the
    /// outcome reports `ReplacedExpired` so callers can tell.
    pub fn set(
        &self,
        name: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        ttl: Duration,
    ) -> SetOutcome {
        let mut dicts = self.lock();
        let dict = dicts.entry(name.into()).or_default();

        match dict.entry(key.into()) {
            MapEntry::Vacant(slot) => {
                slot.insert(Entry::new(value, ttl));
                SetOutcome::Inserted
            }
            MapEntry::Occupied(mut slot) => {
                let outcome = if slot.get().is_expired() {
                    SetOutcome::ReplacedExpired
                } else {
                    SetOutcome::Updated
                };
                slot.insert(Entry::new(value, ttl));
                outcome
            }
        }
    }

    /// Gets `key` from dictionary `name`.
    ///
    /// An expired entry is removed (and the dictionary with it, if it was
    /// the last key) and reported as absent.
    pub fn get(&self, name: &str, key: &str) -> Option<String> {
        let mut dicts = self.lock();
        let dict = dicts.get_mut(name)?;
        let entry = dict.get(key)?;

        if entry.is_expired() {
            dict.remove(key);
            if dict.is_empty() {
                dicts.remove(name);
            }
            debug!(dict = %name, key = %key, "Evicted expired dictionary key on read");
            return None;
        }

        Some(entry.value.clone())
    }

    /// Counts the live keys of dictionary `name`, evicting expired ones.
    ///
    /// Returns `None` if the dictionary does not exist, including when the
    /// walk evicted every key it had.
    pub fn len(&self, name: &str) -> Option<usize> {
        let mut dicts = self.lock();
        let dict = dicts.get_mut(name)?;

        purge(dict, Instant::now());

        if dict.is_empty() {
            dicts.remove(name);
            return None;
        }

        Some(dict.len())
    }

    /// Lists the live keys of dictionary `name`, evicting expired ones.
    ///
    /// An unknown dictionary yields an empty list.
    pub fn keys(&self, name: &str) -> Vec<String> {
        let mut dicts = self.lock();
        let Some(dict) = dicts.get_mut(name) else {
            return Vec::new();
        };

        purge(dict, Instant::now());

        let keys: Vec<String> = dict.keys().cloned().collect();
        if keys.is_empty() {
            dicts.remove(name);
        }
        keys
    }

    /// Removes one key, or the whole dictionary when `key` is `None`.
    ///
    /// Removing the last key removes the dictionary as well.
    pub fn remove(&self, name: &str, key: Option<&str>) -> StoreResult<()> {
        let mut dicts = self.lock();
        let dict = dicts.get_mut(name).ok_or(StoreError::DictionaryNotFound)?;

        let Some(key) = key else {
            dicts.remove(name);
            return Ok(());
        };

        dict.remove(key).ok_or(StoreError::KeyNotFound)?;
        if dict.is_empty() {
            dicts.remove(name);
        }
        Ok(())
    }

    /// Number of dictionaries held by this shard.
    pub fn dictionaries(&self) -> usize {
        self.lock().len()
    }
}

fn purge(dict: &mut Dictionary, now: Instant) {
    let before = dict.len();
    dict.retain(|_, entry| !entry.is_expired_at(now));
    let evicted = before - dict.len();
    if evicted > 0 {
        debug!(evicted = evicted, "Evicted expired dictionary keys during walk");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const LONG: Duration = Duration::from_secs(600);

    #[test]
    fn test_set_creates_dictionary() {
        let store = DictStore::new();
        assert_eq!(store.set("d", "k", "v", LONG), SetOutcome::Inserted);
        assert_eq!(store.get("d", "k"), Some("v".to_string()));
        assert_eq!(store.len("d"), Some(1));
        assert_eq!(store.dictionaries(), 1);
    }

    #[test]
    fn test_set_overwrites_live_key() {
        let store = DictStore::new();
        store.set("d", "k", "v1", LONG);
        assert_eq!(store.set("d", "k", "v2", LONG), SetOutcome::Updated);
        assert_eq!(store.get("d", "k"), Some("v2".to_string()));
        assert_eq!(store.len("d"), Some(1));
    }

    #[test]
    fn test_set_over_expired_key_replaces() {
        let store = DictStore::new();
        store.set("d", "k", "old", Duration::from_millis(20));
        thread::sleep(Duration::from_millis(30));

        assert_eq!(store.set("d", "k", "new", LONG), SetOutcome::ReplacedExpired);
        assert_eq!(store.get("d", "k"), Some("new".to_string()));
    }

    #[test]
    fn test_dictionaries_are_isolated() {
        let store = DictStore::new();
        store.set("d1", "k", "v", LONG);
        assert_eq!(store.get("d2", "k"), None);
        assert_eq!(store.get("d1", "other"), None);
    }

    #[test]
    fn test_expired_get_removes_empty_dictionary() {
        let store = DictStore::new();
        store.set("d", "k", "v", Duration::from_millis(50));
        thread::sleep(Duration::from_millis(60));

        assert_eq!(store.dictionaries(), 1);
        assert_eq!(store.get("d", "k"), None);
        assert_eq!(store.dictionaries(), 0);
        assert_eq!(store.len("d"), None);
    }

    #[test]
    fn test_len_purges_expired_keys() {
        let store = DictStore::new();
        store.set("d", "live", "v", LONG);
        store.set("d", "stale", "v", Duration::from_millis(20));
        thread::sleep(Duration::from_millis(30));

        assert_eq!(store.len("d"), Some(1));
        assert_eq!(store.keys("d"), vec!["live".to_string()]);
    }

    #[test]
    fn test_len_unknown_dictionary() {
        let store = DictStore::new();
        assert_eq!(store.len("nope"), None);
    }

    #[test]
    fn test_keys() {
        let store = DictStore::new();
        store.set("d", "random key", "hello world", LONG);
        store.set("d", "world", "yesterday", LONG);
        store.set("d", "tomorrow", "red", LONG);

        let mut keys = store.keys("d");
        keys.sort();
        assert_eq!(keys, vec!["random key", "tomorrow", "world"]);
        assert!(store.keys("unknown").is_empty());
    }

    #[test]
    fn test_keys_all_expired_removes_dictionary() {
        let store = DictStore::new();
        store.set("d", "a", "v", Duration::from_millis(10));
        store.set("d", "b", "v", Duration::from_millis(10));
        thread::sleep(Duration::from_millis(20));

        assert!(store.keys("d").is_empty());
        assert_eq!(store.dictionaries(), 0);
    }

    #[test]
    fn test_remove_key() {
        let store = DictStore::new();
        store.set("d", "a", "1", LONG);
        store.set("d", "b", "2", LONG);

        assert_eq!(store.remove("d", Some("a")), Ok(()));
        assert_eq!(store.get("d", "a"), None);
        assert_eq!(store.len("d"), Some(1));
        assert_eq!(store.remove("d", Some("a")), Err(StoreError::KeyNotFound));
    }

    #[test]
    fn test_remove_last_key_removes_dictionary() {
        let store = DictStore::new();
        store.set("d", "a", "1", LONG);
        assert_eq!(store.remove("d", Some("a")), Ok(()));
        assert_eq!(store.dictionaries(), 0);
        assert_eq!(
            store.remove("d", Some("a")),
            Err(StoreError::DictionaryNotFound)
        );
    }

    #[test]
    fn test_remove_whole_dictionary() {
        let store = DictStore::new();
        store.set("d", "a", "1", LONG);
        store.set("d", "b", "2", LONG);

        assert_eq!(store.remove("d", None), Ok(()));
        assert_eq!(store.len("d"), None);
        assert_eq!(store.remove("d", None), Err(StoreError::DictionaryNotFound));
    }
}
