//! Storage Engine Module
//!
//! This module provides the data engine: three store kinds, each split into
//! independently locked shards, with lazy TTL expiry.
//!
//! ## Store Kinds
//!
//! - [`ScalarStore`]: key → value
//! - [`DictStore`]: dictionary name → (key → value)
//! - [`ListStore`]: key → ordered, de-duplicated list of values
//!
//! Every value carries an absolute deadline. Expired values are dropped only
//! when an operation touches them; there is no background sweeper.
//!
//! ## Example
//!
//! ```
//! use shardcache::storage::StorageEngine;
//! use std::time::Duration;
//!
//! let engine = StorageEngine::new(8);
//!
//! engine.lists("todo").set("todo", "write tests", Duration::from_secs(600));
//! engine.lists("todo").set("todo", "ship", Duration::from_secs(600));
//! assert_eq!(engine.lists("todo").get("todo", 1), Some("ship".to_string()));
//!
//! engine.dicts("user:1").set("user:1", "name", "Ariz", Duration::from_secs(600));
//! assert_eq!(engine.dicts("user:1").len("user:1"), Some(1));
//! ```

pub mod dict;
pub mod engine;
pub mod entry;
pub mod error;
pub mod linked;
pub mod list;
pub mod router;
pub mod scalar;

// Re-export commonly used types
pub use dict::DictStore;
pub use engine::{StorageEngine, DEFAULT_SHARDS};
pub use entry::Entry;
pub use error::{SetOutcome, StoreError, StoreResult};
pub use list::ListStore;
pub use router::ShardRouter;
pub use scalar::ScalarStore;
