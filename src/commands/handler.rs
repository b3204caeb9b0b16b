//! Command Handler
//!
//! Runs decoded commands against the storage engine and turns the outcome
//! into a [`Reply`].
//!
//! ## Commands
//!
//! ### Scalar
//! - `SET key value ttl` - Store a value
//! - `GET key` - Read a value
//! - `REM key` - Remove a value
//! - `KEYS` - Every live key, across all shards
//! - `LEN` - Number of stored keys, across all shards
//!
//! ### Dictionary
//! - `DSET name key value ttl` - Store a value inside a dictionary
//! - `DGET name key` - Read a value from a dictionary
//! - `DKEYS name` - Live keys of a dictionary
//! - `DLEN name` - Live entry count of a dictionary
//! - `DREM name [key]` - Remove one key, or the whole dictionary
//!
//! ### List
//! - `ZSET key value ttl` - Append a value (or refresh it if present)
//! - `ZGET key index` - Read the value at a position
//! - `ZKEYS key` - Live values of a list
//! - `ZLEN key` - Length of a list
//! - `ZREM key index` - Remove the value at a position
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandHandler                          │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │ from_args() │───>│    run()    │───>│   Reply     │     │
//! │  └─────────────┘    └──────┬──────┘    └─────────────┘     │
//! │                            │                                │
//! │                            ▼                                │
//! │                   StorageEngine  ──>  TxLogger (writes)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::commands::command::{Command, CommandResult};
use crate::protocol::Reply;
use crate::storage::{SetOutcome, StorageEngine, StoreError};
use crate::txlog::TxLogger;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Executes requests against the storage engine.
#[derive(Clone)]
pub struct CommandHandler {
    /// The storage engine
    storage: Arc<StorageEngine>,
    /// Where successful writes are recorded, if anywhere
    tx_log: Option<TxLogger>,
}

impl CommandHandler {
    /// Creates a handler that does not record writes.
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self {
            storage,
            tx_log: None,
        }
    }

    /// Creates a handler that records every successful write in `tx_log`.
    pub fn with_tx_log(storage: Arc<StorageEngine>, tx_log: TxLogger) -> Self {
        Self {
            storage,
            tx_log: Some(tx_log),
        }
    }

    /// Executes one request and returns the reply.
    ///
    /// # Arguments
    ///
    /// * `args` - The request tokens; `args[0]` is the verb
    pub async fn execute(&self, args: &[String]) -> Reply {
        let command = match Command::from_args(args) {
            Ok(command) => command,
            Err(e) => return Reply::error(e.to_string()),
        };

        let is_write = command.verb().op.is_write();

        match self.run(command).await {
            Ok(reply) => {
                if is_write {
                    self.record(args);
                }
                reply
            }
            Err(e) => Reply::error(e.to_string()),
        }
    }

    /// Runs a decoded command.
    async fn run(&self, command: Command) -> CommandResult<Reply> {
        let reply = match command {
            // ----------------------------------------------------------------
            // Scalar
            // ----------------------------------------------------------------
            Command::Set { key, value, ttl } => {
                self.storage.scalars(&key).set(key, value, ttl);
                Reply::Success
            }
            Command::Get { key } => found(self.storage.scalars(&key).get(&key)),
            Command::Remove { key } => {
                self.storage.scalars(&key).remove(&key)?;
                Reply::Success
            }
            Command::TotalKeys => Reply::list(self.storage.total_keys().await),
            Command::TotalLen => Reply::Integer(self.storage.total_len().await),

            // ----------------------------------------------------------------
            // Dictionary
            // ----------------------------------------------------------------
            Command::DictSet {
                name,
                key,
                value,
                ttl,
            } => {
                let outcome = self.storage.dicts(&name).set(name.clone(), key.clone(), value, ttl);
                if outcome == SetOutcome::ReplacedExpired {
                    debug!(dict = %name, key = %key, "overwrote expired dictionary entry");
                }
                Reply::Success
            }
            Command::DictGet { name, key } => found(self.storage.dicts(&name).get(&name, &key)),
            Command::DictKeys { name } => Reply::list(self.storage.dicts(&name).keys(&name)),
            Command::DictLen { name } => {
                let len = self
                    .storage
                    .dicts(&name)
                    .len(&name)
                    .ok_or(StoreError::DictionaryNotFound)?;
                Reply::Integer(len)
            }
            Command::DictRemove { name, key } => {
                self.storage.dicts(&name).remove(&name, key.as_deref())?;
                Reply::Success
            }

            // ----------------------------------------------------------------
            // List
            // ----------------------------------------------------------------
            Command::ListSet { key, value, ttl } => {
                let outcome = self.storage.lists(&key).set(key.clone(), value, ttl);
                if outcome == SetOutcome::ReplacedExpired {
                    debug!(list = %key, "refreshed expired list value");
                }
                Reply::Success
            }
            Command::ListGet { key, index } => found(self.storage.lists(&key).get(&key, index)),
            Command::ListKeys { key } => Reply::list(self.storage.lists(&key).keys(&key)),
            Command::ListLen { key } => {
                let len = self
                    .storage
                    .lists(&key)
                    .len(&key)
                    .ok_or(StoreError::KeyNotFound)?;
                Reply::Integer(len)
            }
            Command::ListRemove { key, index } => {
                self.storage.lists(&key).remove(&key, index)?;
                Reply::Success
            }
        };

        Ok(reply)
    }

    /// Hands a successful write to the transaction log.
    fn record(&self, args: &[String]) {
        if let Some(tx_log) = &self.tx_log {
            tx_log.submit(tx_line(unix_seconds(), args));
        }
    }
}

fn found(value: Option<String>) -> Reply {
    value.map(Reply::Value).unwrap_or(Reply::Missing)
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// Formats one transaction log line: `<unix-seconds> [<args>]\n`.
pub fn tx_line(timestamp: u64, args: &[String]) -> String {
    format!("{} [{}]\n", timestamp, args.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_handler() -> CommandHandler {
        let storage = Arc::new(StorageEngine::new(32));
        CommandHandler::new(storage)
    }

    fn make_command(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    async fn run(handler: &CommandHandler, args: &[&str]) -> Reply {
        handler.execute(&make_command(args)).await
    }

    #[tokio::test]
    async fn test_scalar_commands() {
        let handler = create_handler();

        assert_eq!(run(&handler, &["SET", "testArg", "hello world", "100m"]).await, Reply::Success);
        assert_eq!(run(&handler, &["SET", "other", "1", "100m"]).await, Reply::Success);

        assert_eq!(
            run(&handler, &["GET", "testArg"]).await,
            Reply::value("hello world")
        );
        assert_eq!(run(&handler, &["LEN"]).await, Reply::Integer(2));

        let keys = run(&handler, &["KEYS"]).await.to_string();
        let mut keys: Vec<&str> = keys.split(", ").collect();
        keys.sort();
        assert_eq!(keys, vec!["other", "testArg"]);

        assert_eq!(run(&handler, &["REM", "testArg"]).await, Reply::Success);
        assert_eq!(run(&handler, &["GET", "testArg"]).await, Reply::Missing);
        assert_eq!(run(&handler, &["LEN"]).await, Reply::Integer(1));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let handler = create_handler();

        let reply = run(&handler, &["GET", "nonexistent"]).await;
        assert_eq!(reply.to_string(), "value does not exist for given arguments");
    }

    #[tokio::test]
    async fn test_remove_missing() {
        let handler = create_handler();

        assert_eq!(
            run(&handler, &["REM", "nonexistent"]).await,
            Reply::error("key not found")
        );
    }

    #[tokio::test]
    async fn test_scalar_expiry() {
        let handler = create_handler();

        run(&handler, &["SET", "short", "v", "50ms"]).await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(run(&handler, &["GET", "short"]).await, Reply::Missing);
        assert_eq!(run(&handler, &["KEYS"]).await, Reply::value(""));
    }

    #[tokio::test]
    async fn test_list_commands() {
        let handler = create_handler();

        for value in ["today", "tomorrow", "yesterday"] {
            assert_eq!(run(&handler, &["ZSET", "days", value, "10m"]).await, Reply::Success);
        }

        assert_eq!(
            run(&handler, &["ZGET", "days", "2"]).await,
            Reply::value("yesterday")
        );
        assert_eq!(run(&handler, &["ZLEN", "days"]).await, Reply::Integer(3));
        assert_eq!(
            run(&handler, &["ZKEYS", "days"]).await,
            Reply::value("today, tomorrow, yesterday")
        );

        // Re-adding an existing value keeps its position
        run(&handler, &["ZSET", "days", "today", "10m"]).await;
        assert_eq!(run(&handler, &["ZLEN", "days"]).await, Reply::Integer(3));

        assert_eq!(run(&handler, &["ZREM", "days", "1"]).await, Reply::Success);
        assert_eq!(
            run(&handler, &["ZKEYS", "days"]).await,
            Reply::value("today, yesterday")
        );
    }

    #[tokio::test]
    async fn test_list_errors() {
        let handler = create_handler();

        assert_eq!(
            run(&handler, &["ZLEN", "missing"]).await,
            Reply::error("key not found")
        );
        assert_eq!(run(&handler, &["ZGET", "missing", "0"]).await, Reply::Missing);

        run(&handler, &["ZSET", "L", "a", "10m"]).await;
        assert_eq!(
            run(&handler, &["ZREM", "L", "5"]).await,
            Reply::error("index out of range: 5 (len: 1)")
        );
        assert!(run(&handler, &["ZGET", "L", "first"]).await.is_error());
    }

    #[tokio::test]
    async fn test_dict_commands() {
        let handler = create_handler();

        for (key, value) in [("alice", "1"), ("bob", "2"), ("carol", "3")] {
            assert_eq!(
                run(&handler, &["DSET", "users", key, value, "10m"]).await,
                Reply::Success
            );
        }

        assert_eq!(run(&handler, &["DGET", "users", "bob"]).await, Reply::value("2"));
        assert_eq!(run(&handler, &["DLEN", "users"]).await, Reply::Integer(3));

        assert_eq!(run(&handler, &["DREM", "users", "bob"]).await, Reply::Success);
        assert_eq!(run(&handler, &["DGET", "users", "bob"]).await, Reply::Missing);
        assert_eq!(run(&handler, &["DLEN", "users"]).await, Reply::Integer(2));

        assert_eq!(run(&handler, &["DREM", "users"]).await, Reply::Success);
        assert_eq!(
            run(&handler, &["DLEN", "users"]).await,
            Reply::error("dictionary does not exist")
        );
    }

    #[tokio::test]
    async fn test_dict_overwrite_after_expiry() {
        let handler = create_handler();

        run(&handler, &["DSET", "d", "k", "old", "50ms"]).await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(run(&handler, &["DSET", "d", "k", "new", "10m"]).await, Reply::Success);
        assert_eq!(run(&handler, &["DGET", "d", "k"]).await, Reply::value("new"));
    }

    #[tokio::test]
    async fn test_case_insensitive_verbs() {
        let handler = create_handler();

        assert_eq!(run(&handler, &["set", "k", "v", "1m"]).await, Reply::Success);
        assert_eq!(run(&handler, &["Get", "k"]).await, Reply::value("v"));
    }

    #[tokio::test]
    async fn test_unknown_and_empty() {
        let handler = create_handler();

        assert_eq!(
            run(&handler, &["UNKNOWN"]).await,
            Reply::error("Command not found")
        );
        assert_eq!(
            run(&handler, &[]).await,
            Reply::error("wrong arguments number")
        );
    }

    #[tokio::test]
    async fn test_arity_errors_leave_store_untouched() {
        let handler = create_handler();

        assert!(run(&handler, &["SET", "k", "v"]).await.is_error());
        assert!(run(&handler, &["DKEYS"]).await.is_error());
        assert!(run(&handler, &["ZLEN"]).await.is_error());
        assert_eq!(run(&handler, &["LEN"]).await, Reply::Integer(0));
    }

    #[tokio::test]
    async fn test_invalid_ttl() {
        let handler = create_handler();

        let reply = run(&handler, &["SET", "k", "v", "whenever"]).await;
        assert!(reply.is_error());
        assert!(reply.to_string().contains("whenever"));
        assert_eq!(run(&handler, &["GET", "k"]).await, Reply::Missing);
    }

    #[tokio::test]
    async fn test_only_successful_writes_are_logged() {
        let dir = tempfile::tempdir().unwrap();
        let (logger, writer) = TxLogger::open(dir.path()).await.unwrap();
        let handler = CommandHandler::with_tx_log(Arc::new(StorageEngine::new(4)), logger);

        run(&handler, &["SET", "k", "v", "1m"]).await;
        run(&handler, &["GET", "k"]).await;
        run(&handler, &["REM", "missing"]).await;
        run(&handler, &["DSET", "d", "a", "1", "1m"]).await;
        run(&handler, &["SET", "k", "v"]).await;

        let path = writer.path().to_path_buf();
        writer.shutdown().await;

        let contents = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" [SET k v 1m]"));
        assert!(lines[1].ends_with(" [DSET d a 1 1m]"));
    }

    #[test]
    fn test_tx_line() {
        let args = make_command(&["SET", "k", "hello world", "10m"]);
        assert_eq!(tx_line(1700000000, &args), "1700000000 [SET k hello world 10m]\n");
    }
}
