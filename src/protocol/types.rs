//! Reply Types
//!
//! Every reply is a single line of text terminated by `\n`:
//!
//! ```text
//! Success                                      <- SET / REM succeeded
//! hello world                                  <- GET found a value
//! value does not exist for given arguments     <- GET found nothing
//! 3                                            <- LEN
//! a, b, c                                      <- KEYS
//! key not found                                <- an error
//! ```
//!
//! The reply carries no machine-readable error code; errors and values are
//! told apart only by their text.

use bytes::Bytes;
use std::fmt;

/// Line terminator for every reply.
pub const NEWLINE: &str = "\n";

/// Separator used when a reply lists several keys or values.
pub const LIST_SEPARATOR: &str = ", ";

/// Text sent when a read finds nothing.
pub const MISSING_TEXT: &str = "value does not exist for given arguments";

/// Text sent when a write succeeds.
pub const SUCCESS_TEXT: &str = "Success";

/// A reply to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A stored value, or a joined list of keys/values
    Value(String),

    /// A count
    Integer(usize),

    /// A write that succeeded
    Success,

    /// A read that found nothing
    Missing,

    /// A failed request
    Error(String),
}

impl Reply {
    pub fn value(s: impl Into<String>) -> Self {
        Reply::Value(s.into())
    }

    /// Joins several items into one `Value` reply.
    ///
    /// # Example
    /// ```
    /// use shardcache::protocol::types::Reply;
    /// let reply = Reply::list(vec!["a".to_string(), "b".to_string()]);
    /// assert_eq!(reply, Reply::value("a, b"));
    /// ```
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = items
            .into_iter()
            .map(|item| item.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR);
        Reply::Value(joined)
    }

    pub fn error(s: impl Into<String>) -> Self {
        Reply::Error(s.into())
    }

    /// Returns true if this reply reports a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// Serializes the reply for the wire, newline included.
    pub fn serialize(&self) -> Bytes {
        Bytes::from(format!("{}{}", self, NEWLINE))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Value(s) => f.write_str(s),
            Reply::Integer(n) => write!(f, "{}", n),
            Reply::Success => f.write_str(SUCCESS_TEXT),
            Reply::Missing => f.write_str(MISSING_TEXT),
            Reply::Error(s) => f.write_str(s),
        }
    }
}
