//! Command Layer
//!
//! Turns tokenized requests into typed commands, runs them against the
//! storage engine, and produces replies.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  Tokenizer      │  (protocol module)
//! └────────┬────────┘
//!          │  Vec<String>
//!          ▼
//! ┌─────────────────┐
//! │ Command         │  verb + arity + typed arguments
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  run, reply, record writes
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ StorageEngine   │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Verbs
//!
//! `[D|Z]?(GET|SET|KEYS|LEN|REM)`: no prefix targets scalars, `D` targets
//! dictionaries, `Z` targets lists.

pub mod command;
pub mod handler;

pub use command::{Command, CommandError, CommandResult, Operation, StoreKind, Verb};
pub use handler::CommandHandler;
