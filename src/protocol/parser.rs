//! Request Framing and Tokenizing
//!
//! Requests are single lines of space-separated tokens. Quoting follows the
//! CSV convention with a space as the delimiter:
//!
//! ```text
//! SET greeting "hello world" 10m      -> [SET, greeting, hello world, 10m]
//! SET quote "say ""hi""" 1h           -> [SET, quote, say "hi", 1h]
//! DGET   users    alice               -> [DGET, users, alice]
//! ```
//!
//! Runs of spaces produce empty fields, which are dropped. Every request ends
//! at the first newline, quoted or not. A quote still open there is reported
//! as [`ParseError::UnterminatedQuote`] and the next line is a fresh request.
//!
//! ## How the Parser Works
//!
//! [`parse_request`] looks at the connection buffer and returns either:
//! - `None` - no complete request yet, read more bytes
//! - `Some((Ok(tokens), consumed))` - a request, `consumed` bytes were used
//! - `Some((Err(e), consumed))` - a malformed request; the caller replies
//!   with the error and drops `consumed` bytes

use thiserror::Error;

/// Errors that can occur while tokenizing a request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A `"` inside an unquoted token
    #[error("bare \" in non-quoted field")]
    BareQuote,

    /// A quoted token with no closing quote
    #[error("extraneous or missing \" in quoted field")]
    UnterminatedQuote,

    /// Something other than a space right after a closing quote
    #[error("unexpected character after closing quote")]
    UnexpectedAfterQuote,

    /// The request is not valid UTF-8
    #[error("invalid UTF-8 in request")]
    InvalidUtf8,

    /// A TTL argument that is not a duration
    #[error("invalid ttl '{input}': {reason}")]
    InvalidTtl { input: String, reason: String },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Returns the length of the first complete request in `buf`, including its
/// terminating newline, or `None` if the request is not complete yet.
pub fn next_frame(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n').map(|i| i + 1)
}

/// Splits one request line into tokens.
///
/// A trailing `\n` or `\r\n` is ignored. Empty fields are dropped, so an
/// empty or all-space line yields no tokens.
pub fn tokenize(line: &str) -> ParseResult<Vec<String>> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);

    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        let mut field = String::new();

        if chars.peek() == Some(&'"') {
            chars.next();
            loop {
                match chars.next() {
                    None => return Err(ParseError::UnterminatedQuote),
                    Some('"') => match chars.peek() {
                        Some('"') => {
                            chars.next();
                            field.push('"');
                        }
                        Some(' ') | None => break,
                        Some(_) => return Err(ParseError::UnexpectedAfterQuote),
                    },
                    Some(c) => field.push(c),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                match c {
                    ' ' => break,
                    '"' => return Err(ParseError::BareQuote),
                    _ => {
                        field.push(c);
                        chars.next();
                    }
                }
            }
        }

        if !field.is_empty() {
            tokens.push(field);
        }

        // Either the delimiter or the end of the line follows every field
        if chars.next().is_none() {
            break;
        }
    }

    Ok(tokens)
}

/// Frames and tokenizes the first request in `buf`.
pub fn parse_request(buf: &[u8]) -> Option<(ParseResult<Vec<String>>, usize)> {
    let consumed = next_frame(buf)?;
    let tokens = std::str::from_utf8(&buf[..consumed])
        .map_err(|_| ParseError::InvalidUtf8)
        .and_then(tokenize);
    Some((tokens, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(line: &str) -> Vec<String> {
        tokenize(line).unwrap()
    }

    #[test]
    fn test_plain_tokens() {
        assert_eq!(tokens("SET k v 10m"), vec!["SET", "k", "v", "10m"]);
    }

    #[test]
    fn test_trailing_newline() {
        assert_eq!(tokens("GET k\n"), vec!["GET", "k"]);
        assert_eq!(tokens("GET k\r\n"), vec!["GET", "k"]);
    }

    #[test]
    fn test_repeated_spaces_are_dropped() {
        assert_eq!(tokens("  DGET   users  alice  "), vec!["DGET", "users", "alice"]);
    }

    #[test]
    fn test_empty_line() {
        assert!(tokens("").is_empty());
        assert!(tokens("\n").is_empty());
        assert!(tokens("    ").is_empty());
    }

    #[test]
    fn test_quoted_token_keeps_spaces() {
        assert_eq!(
            tokens(r#"SET testArg "hello world" 100m"#),
            vec!["SET", "testArg", "hello world", "100m"]
        );
    }

    #[test]
    fn test_escaped_quotes() {
        assert_eq!(
            tokens(r#"SET q "say ""hi""" 1h"#),
            vec!["SET", "q", r#"say "hi""#, "1h"]
        );
    }

    #[test]
    fn test_empty_quoted_token_is_dropped() {
        assert_eq!(tokens(r#"DREM d """#), vec!["DREM", "d"]);
    }

    #[test]
    fn test_bare_quote() {
        assert_eq!(tokenize(r#"SET a"b v 1m"#), Err(ParseError::BareQuote));
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(tokenize(r#"SET "abc"#), Err(ParseError::UnterminatedQuote));
    }

    #[test]
    fn test_text_after_closing_quote() {
        assert_eq!(
            tokenize(r#"SET "ab"c v 1m"#),
            Err(ParseError::UnexpectedAfterQuote)
        );
    }

    #[test]
    fn test_next_frame() {
        assert_eq!(next_frame(b"GET k"), None);
        assert_eq!(next_frame(b"GET k\n"), Some(6));
        assert_eq!(next_frame(b"GET k\nGET j\n"), Some(6));
        assert_eq!(next_frame(b""), None);
    }

    #[test]
    fn test_next_frame_open_quote_ends_at_newline() {
        assert_eq!(next_frame(b"SET k \"a\nb"), Some(9));
        assert_eq!(next_frame(b"SET k \"abc 10m\nGET k\n"), Some(15));
    }

    #[test]
    fn test_next_frame_bare_quote_does_not_stall() {
        assert_eq!(next_frame(b"SET a\"b\n"), Some(8));
    }

    #[test]
    fn test_parse_request() {
        let buf = b"SET k v 1m\nGET k\n";
        let (first, consumed) = parse_request(buf).unwrap();
        assert_eq!(first.unwrap(), vec!["SET", "k", "v", "1m"]);
        assert_eq!(consumed, 11);

        let (second, consumed) = parse_request(&buf[11..]).unwrap();
        assert_eq!(second.unwrap(), vec!["GET", "k"]);
        assert_eq!(consumed, 6);
    }

    #[test]
    fn test_parse_request_open_quote_does_not_swallow_next_request() {
        let buf = b"SET k \"abc 10m\nGET k\nLEN\n";

        let (first, consumed) = parse_request(buf).unwrap();
        assert_eq!(first, Err(ParseError::UnterminatedQuote));
        assert_eq!(consumed, 15);

        let (second, used) = parse_request(&buf[consumed..]).unwrap();
        assert_eq!(second.unwrap(), vec!["GET", "k"]);
        assert_eq!(used, 6);

        let (third, _) = parse_request(&buf[consumed + used..]).unwrap();
        assert_eq!(third.unwrap(), vec!["LEN"]);
    }

    #[test]
    fn test_parse_request_incomplete() {
        assert!(parse_request(b"SET k v").is_none());
    }

    #[test]
    fn test_parse_request_invalid_utf8() {
        let (result, consumed) = parse_request(b"GET \xff\n").unwrap();
        assert_eq!(result, Err(ParseError::InvalidUtf8));
        assert_eq!(consumed, 6);
    }
}
