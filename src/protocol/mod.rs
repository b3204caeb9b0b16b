//! Text Protocol Implementation
//!
//! Clients send one request per line: a verb followed by space-separated
//! arguments, with CSV-style double quotes for arguments that contain
//! spaces. Every reply is one line of text.
//!
//! ## Modules
//!
//! - `parser`: request framing and tokenizing
//! - `ttl`: TTL argument parsing (`10m`, `50ms`, ...)
//! - `types`: the `Reply` enum and its wire form
//!
//! ## Example
//!
//! ```
//! use shardcache::protocol::{parse_request, Reply};
//!
//! let (tokens, consumed) = parse_request(b"SET name \"Ariz K\" 10m\n").unwrap();
//! assert_eq!(tokens.unwrap(), vec!["SET", "name", "Ariz K", "10m"]);
//! assert_eq!(consumed, 22);
//!
//! assert_eq!(&Reply::Success.serialize()[..], b"Success\n");
//! ```

pub mod parser;
pub mod ttl;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{next_frame, parse_request, tokenize, ParseError, ParseResult};
pub use ttl::parse_ttl;
pub use types::Reply;
