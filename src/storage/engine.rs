//! Sharded Storage Engine
//!
//! This module ties the three store kinds together. The engine owns
//! `num_shards` shards; every shard holds one scalar store, one dictionary
//! store and one list store, each behind its own mutex. A key is routed to a
//! shard by [`ShardRouter`], so operations on keys in different shards (or
//! on different store kinds) never wait on each other.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       StorageEngine                          │
//! │                                                              │
//! │   ShardRouter: sdbm(key) % num_shards                        │
//! │                                                              │
//! │  ┌──────────────┐ ┌──────────────┐        ┌──────────────┐   │
//! │  │   Shard 0    │ │   Shard 1    │  ...   │  Shard N-1   │   │
//! │  │ ScalarStore  │ │ ScalarStore  │        │ ScalarStore  │   │
//! │  │ DictStore    │ │ DictStore    │        │ DictStore    │   │
//! │  │ ListStore    │ │ ListStore    │        │ ListStore    │   │
//! │  └──────────────┘ └──────────────┘        └──────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The only cross-shard operations are the scalar aggregates
//! [`StorageEngine::total_len`] and [`StorageEngine::total_keys`]. They spawn
//! one task per shard and wait for every task before merging.

use crate::storage::dict::DictStore;
use crate::storage::list::ListStore;
use crate::storage::router::ShardRouter;
use crate::storage::scalar::ScalarStore;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::warn;

/// Default number of shards per store kind.
pub const DEFAULT_SHARDS: usize = 32;

/// A single shard: one store of each kind.
#[derive(Debug, Default)]
struct Shard {
    scalars: ScalarStore,
    dicts: DictStore,
    lists: ListStore,
}

/// The sharded store family.
///
/// Wrap it in an `Arc` and share it across connections; the aggregate
/// queries need the `Arc` to hand each shard task its own reference.
///
/// # Example
///
/// ```
/// use shardcache::storage::StorageEngine;
/// use std::time::Duration;
///
/// let engine = StorageEngine::new(4);
/// engine.scalars("name").set("name", "Ariz", Duration::from_secs(60));
/// assert_eq!(engine.scalars("name").get("name"), Some("Ariz".to_string()));
/// ```
#[derive(Debug)]
pub struct StorageEngine {
    router: ShardRouter,
    shards: Vec<Shard>,
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new(DEFAULT_SHARDS)
    }
}

impl StorageEngine {
    /// Creates an engine with `num_shards` shards (at least one). The shard
    /// count cannot change afterwards.
    pub fn new(num_shards: usize) -> Self {
        let router = ShardRouter::new(num_shards);
        let shards = (0..router.num_shards()).map(|_| Shard::default()).collect();

        Self { router, shards }
    }

    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    pub fn router(&self) -> &ShardRouter {
        &self.router
    }

    #[inline]
    fn shard(&self, key: &str) -> &Shard {
        &self.shards[self.router.index(key)]
    }

    /// The scalar store owning `key`.
    pub fn scalars(&self, key: &str) -> &ScalarStore {
        &self.shard(key).scalars
    }

    /// The dictionary store owning dictionary `name`.
    pub fn dicts(&self, name: &str) -> &DictStore {
        &self.shard(name).dicts
    }

    /// The list store owning the list at `key`.
    pub fn lists(&self, key: &str) -> &ListStore {
        &self.shard(key).lists
    }

    /// Sum of every shard's scalar entry count.
    ///
    /// Like [`ScalarStore::len`], this does not purge expired entries.
    pub async fn total_len(self: &Arc<Self>) -> usize {
        self.fan_out(ScalarStore::len).await.into_iter().sum()
    }

    /// Every live scalar key across all shards, in no particular order.
    pub async fn total_keys(self: &Arc<Self>) -> Vec<String> {
        self.fan_out(ScalarStore::keys)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Runs `op` against every shard's scalar store concurrently and
    /// collects the results once all of them have finished.
    ///
    /// A shard task that panics is logged and left out of the result.
    async fn fan_out<T>(self: &Arc<Self>, op: fn(&ScalarStore) -> T) -> Vec<T>
    where
        T: Send + 'static,
    {
        let mut tasks = JoinSet::new();
        for index in 0..self.shards.len() {
            let engine = Arc::clone(self);
            tasks.spawn(async move { op(&engine.shards[index].scalars) });
        }

        let mut results = Vec::with_capacity(self.shards.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => warn!(error = %e, "Shard task failed during fan-out"),
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SetOutcome;
    use std::collections::HashSet;
    use std::thread;
    use std::time::Duration;

    const LONG: Duration = Duration::from_secs(600);

    #[test]
    fn test_shard_count() {
        assert_eq!(StorageEngine::new(4).num_shards(), 4);
        assert_eq!(StorageEngine::new(0).num_shards(), 1);
        assert_eq!(StorageEngine::default().num_shards(), DEFAULT_SHARDS);
    }

    #[test]
    fn test_routing_is_stable() {
        let engine = StorageEngine::new(8);
        engine.scalars("user:1").set("user:1", "a", LONG);
        assert_eq!(engine.scalars("user:1").get("user:1"), Some("a".to_string()));

        let index = engine.router().index("user:1");
        assert!(std::ptr::eq(
            engine.scalars("user:1"),
            &engine.shards[index].scalars
        ));
    }

    #[test]
    fn test_store_kinds_are_independent() {
        let engine = StorageEngine::new(4);
        engine.scalars("k").set("k", "scalar", LONG);
        assert_eq!(engine.dicts("k").set("k", "f", "dict", LONG), SetOutcome::Inserted);
        assert_eq!(engine.lists("k").set("k", "list", LONG), SetOutcome::Inserted);

        assert_eq!(engine.scalars("k").get("k"), Some("scalar".to_string()));
        assert_eq!(engine.dicts("k").get("k", "f"), Some("dict".to_string()));
        assert_eq!(engine.lists("k").get("k", 0), Some("list".to_string()));
    }

    #[tokio::test]
    async fn test_total_len_fans_out() {
        let engine = Arc::new(StorageEngine::new(4));
        for i in 0..10 {
            let key = format!("key{}", i);
            engine.scalars(&key).set(key.clone(), "v", LONG);
        }

        let used: HashSet<usize> = (0..10)
            .map(|i| engine.router().index(&format!("key{}", i)))
            .collect();
        assert!(used.len() > 1);

        assert_eq!(engine.total_len().await, 10);
    }

    #[tokio::test]
    async fn test_total_keys_merges_shards() {
        let engine = Arc::new(StorageEngine::new(4));
        for i in 0..10 {
            let key = format!("key{}", i);
            engine.scalars(&key).set(key.clone(), "v", LONG);
        }

        let mut keys = engine.total_keys().await;
        keys.sort();
        let mut expected: Vec<String> = (0..10).map(|i| format!("key{}", i)).collect();
        expected.sort();
        assert_eq!(keys, expected);
    }

    #[tokio::test]
    async fn test_total_keys_purges_then_len_agrees() {
        let engine = Arc::new(StorageEngine::new(4));
        engine.scalars("live").set("live", "v", LONG);
        engine.scalars("dead").set("dead", "v", Duration::from_millis(10));
        thread::sleep(Duration::from_millis(20));

        // Untouched expired entries still occupy their shard
        assert_eq!(engine.total_len().await, 2);
        assert_eq!(engine.total_keys().await, vec!["live".to_string()]);
        assert_eq!(engine.total_len().await, 1);
    }

    #[tokio::test]
    async fn test_totals_ignore_dicts_and_lists() {
        let engine = Arc::new(StorageEngine::new(4));
        engine.dicts("d").set("d", "k", "v", LONG);
        engine.lists("l").set("l", "v", LONG);

        assert_eq!(engine.total_len().await, 0);
        assert!(engine.total_keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let engine = Arc::new(StorageEngine::new(16));
        let mut handles = vec![];

        for t in 0..8 {
            let engine = Arc::clone(&engine);
            handles.push(tokio::spawn(async move {
                for i in 0..100 {
                    let key = format!("t{}:k{}", t, i);
                    engine.scalars(&key).set(key.clone(), "v", LONG);
                    engine.lists("shared").set("shared", format!("t{}:{}", t, i), LONG);
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(engine.total_len().await, 800);
        assert_eq!(engine.lists("shared").len("shared"), Some(800));
    }
}
