//! # shardcache - A Sharded In-Memory Cache
//!
//! shardcache is an in-memory cache server written in Rust. Clients talk to
//! it over TCP with a line-based text protocol, and every stored value
//! carries its own time-to-live.
//!
//! ## Features
//!
//! - **Three Stores**: plain scalars, named dictionaries, and de-duplicated lists
//! - **Sharded**: keys are spread over N shards, each guarded by its own locks
//! - **TTL Support**: expired values are dropped lazily, when touched
//! - **Transaction Log**: successful writes are appended to a log in the background
//! - **Async I/O**: Built on Tokio for handling many concurrent connections
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              shardcache                                 │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │──> TxLogger      │
//! │  │ (Listener)  │    │  Handler    │    │  Handler    │   (background)   │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘                  │
//! │                                               │                         │
//! │                                               ▼                         │
//! │  ┌─────────────┐    ┌──────────────────────────────────────────────┐   │
//! │  │   Line      │    │              StorageEngine                   │   │
//! │  │   Parser    │    │  ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐ │   │
//! │  │             │    │  │Shard 0 │ │Shard 1 │ │Shard 2 │ │...N    │ │   │
//! │  └─────────────┘    │  │S  D  Z │ │S  D  Z │ │S  D  Z │ │shards  │ │   │
//! │                     │  └────────┘ └────────┘ └────────┘ └────────┘ │   │
//! │                     └──────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use shardcache::commands::CommandHandler;
//! use shardcache::connection::{handle_connection, ConnectionStats};
//! use shardcache::storage::StorageEngine;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     // Create the storage engine
//!     let storage = Arc::new(StorageEngine::new(32));
//!
//!     // Create connection statistics
//!     let stats = Arc::new(ConnectionStats::new());
//!
//!     // Start listening for connections
//!     let listener = TcpListener::bind("127.0.0.1:8000").await?;
//!
//!     loop {
//!         let (stream, addr) = listener.accept().await?;
//!         let handler = CommandHandler::new(Arc::clone(&storage));
//!         let stats = Arc::clone(&stats);
//!
//!         tokio::spawn(handle_connection(stream, addr, handler, None, stats));
//!     }
//! }
//! ```
//!
//! ## Supported Commands
//!
//! ### Scalars
//! - `SET key value ttl` / `GET key` / `REM key`
//! - `KEYS` / `LEN` (across all shards)
//!
//! ### Dictionaries
//! - `DSET name key value ttl` / `DGET name key`
//! - `DKEYS name` / `DLEN name`
//! - `DREM name [key]`
//!
//! ### Lists
//! - `ZSET key value ttl` / `ZGET key index`
//! - `ZKEYS key` / `ZLEN key`
//! - `ZREM key index`
//!
//! TTLs are durations such as `10m`, `50ms` or `1h30m`.
//!
//! ## Module Overview
//!
//! - [`protocol`]: request framing, tokenizing, TTLs, and replies
//! - [`storage`]: sharded stores with lazy TTL expiry
//! - [`commands`]: command decoding and execution
//! - [`connection`]: client connection management
//! - [`txlog`]: background transaction log
//! - [`config`]: command-line configuration
//!
//! ## Design Highlights
//!
//! ### Sharding
//!
//! A key's shard is chosen by the SDBM hash of the key modulo the shard
//! count. Each shard holds one scalar, one dictionary and one list store,
//! each behind its own lock, so requests on different shards or different
//! store kinds never contend.
//!
//! ### Lazy Expiry
//!
//! There is no background sweeper. Reads and key listings check deadlines
//! and evict what has expired as they go.

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod storage;
pub mod txlog;

// Re-export commonly used types for convenience
pub use commands::CommandHandler;
pub use config::{CliAction, Config};
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{ParseError, Reply};
pub use storage::StorageEngine;
pub use txlog::{TxLogWriter, TxLogger};

/// The default port the server listens on
pub const DEFAULT_PORT: u16 = 8000;

/// The default host the server binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of shardcache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
