//! Errors returned by the store kinds.

use thiserror::Error;

/// Failures of store operations.
///
/// Lock contention is never an error; callers simply wait for the shard.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The key (or list) does not exist, or has already been removed
    #[error("key not found")]
    KeyNotFound,

    /// The named dictionary does not exist
    #[error("dictionary does not exist")]
    DictionaryNotFound,

    /// A list position past the end of the list
    #[error("index out of range: {index} (len: {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// What a `set` did to the target slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// A new entry was created
    Inserted,
    /// A live entry was overwritten or refreshed
    Updated,
    /// The slot held an entry that had already expired; it was replaced
    ReplacedExpired,
}
