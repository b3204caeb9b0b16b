//! Key to shard routing.
//!
//! Shard membership is a pure function of the key and the shard count:
//! the SDBM string hash reduced modulo `num_shards`. The shard count is
//! fixed when the engine is built, so a key never changes shards.

/// Maps keys onto shard indices in `[0, num_shards)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardRouter {
    num_shards: usize,
}

impl ShardRouter {
    /// Creates a router over `num_shards` shards (at least one).
    pub fn new(num_shards: usize) -> Self {
        Self {
            num_shards: num_shards.max(1),
        }
    }

    /// Number of shards this router distributes over.
    pub fn num_shards(&self) -> usize {
        self.num_shards
    }

    /// Returns the shard index for a key.
    #[inline]
    pub fn index(&self, key: &str) -> usize {
        (sdbm(key) % self.num_shards as u64) as usize
    }
}

/// SDBM hash over the key's Unicode scalar values.
///
/// `hash = c + (hash << 6) + (hash << 16) - hash`, wrapping at 64 bits.
pub fn sdbm(key: &str) -> u64 {
    key.chars().fold(0u64, |hash, c| {
        (c as u64)
            .wrapping_add(hash << 6)
            .wrapping_add(hash << 16)
            .wrapping_sub(hash)
    })
}
