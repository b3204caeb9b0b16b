//! Transaction Log
//!
//! An append-only record of every successful write, kept by a background
//! task so that requests never wait on the disk.

pub mod logger;

pub use logger::{TxLogWriter, TxLogger, TX_LOG_FILE};
