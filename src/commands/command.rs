//! Command decoding.
//!
//! A verb is an optional store-kind prefix (`D` for dictionaries, `Z` for
//! lists, none for scalars) followed by an operation (`GET`, `SET`, `KEYS`,
//! `LEN`, `REM`). The verb is decoded once into a [`Verb`], then the
//! arguments are checked against that operation's arity and converted into a
//! fully typed [`Command`].

use crate::protocol::{parse_ttl, ParseError};
use crate::storage::StoreError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Which store a command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    Scalar,
    Dict,
    List,
}

impl StoreKind {
    fn prefix(self) -> &'static str {
        match self {
            StoreKind::Scalar => "",
            StoreKind::Dict => "D",
            StoreKind::List => "Z",
        }
    }
}

/// What a command does to its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Set,
    Keys,
    Len,
    Remove,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Operation::Get => "GET",
            Operation::Set => "SET",
            Operation::Keys => "KEYS",
            Operation::Len => "LEN",
            Operation::Remove => "REM",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "GET" => Some(Operation::Get),
            "SET" => Some(Operation::Set),
            "KEYS" => Some(Operation::Keys),
            "LEN" => Some(Operation::Len),
            "REM" => Some(Operation::Remove),
            _ => None,
        }
    }

    /// Whether a successful run changes the store.
    pub fn is_write(self) -> bool {
        matches!(self, Operation::Set | Operation::Remove)
    }
}

/// A decoded verb: store kind plus operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Verb {
    pub kind: StoreKind,
    pub op: Operation,
}

impl Verb {
    /// Decodes a verb token, ignoring ASCII case.
    ///
    /// A leading `D` or `Z` only counts as a prefix when the rest is a
    /// complete operation name.
    pub fn parse(token: &str) -> Option<Self> {
        let upper = token.to_ascii_uppercase();

        let (kind, rest) = if let Some(rest) = upper.strip_prefix('D') {
            (StoreKind::Dict, rest)
        } else if let Some(rest) = upper.strip_prefix('Z') {
            (StoreKind::List, rest)
        } else {
            (StoreKind::Scalar, upper.as_str())
        };

        Operation::from_name(rest).map(|op| Verb { kind, op })
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.op.name())
    }
}

/// A fully decoded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `SET key value ttl`
    Set { key: String, value: String, ttl: Duration },
    /// `GET key`
    Get { key: String },
    /// `REM key`
    Remove { key: String },
    /// `KEYS` - every scalar key, across all shards
    TotalKeys,
    /// `LEN` - scalar entry count, across all shards
    TotalLen,

    /// `DSET name key value ttl`
    DictSet {
        name: String,
        key: String,
        value: String,
        ttl: Duration,
    },
    /// `DGET name key`
    DictGet { name: String, key: String },
    /// `DKEYS name`
    DictKeys { name: String },
    /// `DLEN name`
    DictLen { name: String },
    /// `DREM name [key]` - without a key the whole dictionary goes
    DictRemove { name: String, key: Option<String> },

    /// `ZSET key value ttl`
    ListSet { key: String, value: String, ttl: Duration },
    /// `ZGET key index`
    ListGet { key: String, index: usize },
    /// `ZKEYS key`
    ListKeys { key: String },
    /// `ZLEN key`
    ListLen { key: String },
    /// `ZREM key index`
    ListRemove { key: String, index: usize },
}

/// Errors raised while decoding or running a command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// No tokens at all
    #[error("wrong arguments number")]
    Empty,

    /// Unknown verb
    #[error("Command not found")]
    UnknownCommand,

    /// Wrong number of arguments for the verb
    #[error("wrong number of arguments for '{verb}' (expected {expected})")]
    Arity { verb: Verb, expected: &'static str },

    /// A TTL argument that does not parse
    #[error("{0}")]
    InvalidTtl(#[from] ParseError),

    /// A list index that is not a non-negative integer
    #[error("invalid index '{0}': expected a non-negative integer")]
    InvalidIndex(String),

    /// The store rejected the operation
    #[error("{0}")]
    Store(#[from] StoreError),
}

/// Result type for command execution.
pub type CommandResult<T> = Result<T, CommandError>;

impl Command {
    /// Decodes an argument vector (`args[0]` is the verb).
    pub fn from_args(args: &[String]) -> CommandResult<Self> {
        let (verb_token, params) = args.split_first().ok_or(CommandError::Empty)?;
        let verb = Verb::parse(verb_token).ok_or(CommandError::UnknownCommand)?;
        let arity = |expected| CommandError::Arity { verb, expected };

        let command = match (verb.kind, verb.op, params) {
            (StoreKind::Scalar, Operation::Set, [key, value, ttl]) => Command::Set {
                key: key.clone(),
                value: value.clone(),
                ttl: parse_ttl(ttl)?,
            },
            (StoreKind::Scalar, Operation::Set, _) => return Err(arity("key value ttl")),
            (StoreKind::Scalar, Operation::Get, [key]) => Command::Get { key: key.clone() },
            (StoreKind::Scalar, Operation::Get, _) => return Err(arity("key")),
            (StoreKind::Scalar, Operation::Remove, [key]) => Command::Remove { key: key.clone() },
            (StoreKind::Scalar, Operation::Remove, _) => return Err(arity("key")),
            (StoreKind::Scalar, Operation::Keys, []) => Command::TotalKeys,
            (StoreKind::Scalar, Operation::Keys, _) => return Err(arity("no arguments")),
            (StoreKind::Scalar, Operation::Len, []) => Command::TotalLen,
            (StoreKind::Scalar, Operation::Len, _) => return Err(arity("no arguments")),

            (StoreKind::Dict, Operation::Set, [name, key, value, ttl]) => Command::DictSet {
                name: name.clone(),
                key: key.clone(),
                value: value.clone(),
                ttl: parse_ttl(ttl)?,
            },
            (StoreKind::Dict, Operation::Set, _) => return Err(arity("name key value ttl")),
            (StoreKind::Dict, Operation::Get, [name, key]) => Command::DictGet {
                name: name.clone(),
                key: key.clone(),
            },
            (StoreKind::Dict, Operation::Get, _) => return Err(arity("name key")),
            (StoreKind::Dict, Operation::Keys, [name]) => Command::DictKeys { name: name.clone() },
            (StoreKind::Dict, Operation::Keys, _) => return Err(arity("name")),
            (StoreKind::Dict, Operation::Len, [name]) => Command::DictLen { name: name.clone() },
            (StoreKind::Dict, Operation::Len, _) => return Err(arity("name")),
            (StoreKind::Dict, Operation::Remove, [name]) => Command::DictRemove {
                name: name.clone(),
                key: None,
            },
            (StoreKind::Dict, Operation::Remove, [name, key]) => Command::DictRemove {
                name: name.clone(),
                key: Some(key.clone()),
            },
            (StoreKind::Dict, Operation::Remove, _) => return Err(arity("name [key]")),

            (StoreKind::List, Operation::Set, [key, value, ttl]) => Command::ListSet {
                key: key.clone(),
                value: value.clone(),
                ttl: parse_ttl(ttl)?,
            },
            (StoreKind::List, Operation::Set, _) => return Err(arity("key value ttl")),
            (StoreKind::List, Operation::Get, [key, index]) => Command::ListGet {
                key: key.clone(),
                index: parse_index(index)?,
            },
            (StoreKind::List, Operation::Get, _) => return Err(arity("key index")),
            (StoreKind::List, Operation::Keys, [key]) => Command::ListKeys { key: key.clone() },
            (StoreKind::List, Operation::Keys, _) => return Err(arity("key")),
            (StoreKind::List, Operation::Len, [key]) => Command::ListLen { key: key.clone() },
            (StoreKind::List, Operation::Len, _) => return Err(arity("key")),
            (StoreKind::List, Operation::Remove, [key, index]) => Command::ListRemove {
                key: key.clone(),
                index: parse_index(index)?,
            },
            (StoreKind::List, Operation::Remove, _) => return Err(arity("key index")),
        };

        Ok(command)
    }

    /// The verb this command was decoded from.
    pub fn verb(&self) -> Verb {
        let (kind, op) = match self {
            Command::Set { .. } => (StoreKind::Scalar, Operation::Set),
            Command::Get { .. } => (StoreKind::Scalar, Operation::Get),
            Command::Remove { .. } => (StoreKind::Scalar, Operation::Remove),
            Command::TotalKeys => (StoreKind::Scalar, Operation::Keys),
            Command::TotalLen => (StoreKind::Scalar, Operation::Len),
            Command::DictSet { .. } => (StoreKind::Dict, Operation::Set),
            Command::DictGet { .. } => (StoreKind::Dict, Operation::Get),
            Command::DictKeys { .. } => (StoreKind::Dict, Operation::Keys),
            Command::DictLen { .. } => (StoreKind::Dict, Operation::Len),
            Command::DictRemove { .. } => (StoreKind::Dict, Operation::Remove),
            Command::ListSet { .. } => (StoreKind::List, Operation::Set),
            Command::ListGet { .. } => (StoreKind::List, Operation::Get),
            Command::ListKeys { .. } => (StoreKind::List, Operation::Keys),
            Command::ListLen { .. } => (StoreKind::List, Operation::Len),
            Command::ListRemove { .. } => (StoreKind::List, Operation::Remove),
        };
        Verb { kind, op }
    }
}

fn parse_index(token: &str) -> CommandResult<usize> {
    token
        .parse()
        .map_err(|_| CommandError::InvalidIndex(token.to_string()))
}
