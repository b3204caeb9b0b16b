//! TTL argument parsing.
//!
//! TTLs arrive as human-readable durations: `10m`, `50ms`, `1h30m`, `2s`.
//! Bare digits are taken as whole seconds, never nanoseconds: `SET k v 30`
//! keeps the value for half a minute, not 30ns.

use crate::protocol::parser::{ParseError, ParseResult};
use std::time::Duration;

/// Parses a TTL argument into a duration.
pub fn parse_ttl(input: &str) -> ParseResult<Duration> {
    let trimmed = input.trim();

    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return trimmed
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| invalid(input, e.to_string()));
    }

    humantime::parse_duration(trimmed).map_err(|e| invalid(input, e.to_string()))
}

fn invalid(input: &str, reason: String) -> ParseError {
    ParseError::InvalidTtl {
        input: input.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_suffixes() {
        assert_eq!(parse_ttl("10m").unwrap(), Duration::from_secs(600));
        assert_eq!(parse_ttl("50ms").unwrap(), Duration::from_millis(50));
        assert_eq!(parse_ttl("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_ttl("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_ttl("100m").unwrap(), Duration::from_secs(6000));
    }

    #[test]
    fn test_compound() {
        assert_eq!(parse_ttl("1h30m").unwrap(), Duration::from_secs(5400));
    }

    #[test]
    fn test_bare_digits_are_seconds() {
        assert_eq!(parse_ttl("30").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_ttl("0").unwrap(), Duration::ZERO);
        assert_ne!(parse_ttl("30").unwrap(), Duration::from_nanos(30));
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(parse_ttl("soon"), Err(ParseError::InvalidTtl { .. })));
        assert!(matches!(parse_ttl(""), Err(ParseError::InvalidTtl { .. })));
        assert!(matches!(parse_ttl("10 parsecs"), Err(ParseError::InvalidTtl { .. })));
    }
}
