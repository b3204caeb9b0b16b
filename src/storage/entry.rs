//! Stored values and their expiry deadlines.
//!
//! Every value in every store kind carries an absolute deadline computed
//! once at write time (`now + ttl`). Nothing ever walks the stores looking
//! for stale entries; the stores check `is_expired` when an operation
//! touches an entry and drop it on the spot.

use std::time::{Duration, Instant};

/// Upper bound used when `now + ttl` would overflow `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// A value with an absolute expiry deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The stored value
    pub value: String,
    /// When this entry stops being visible
    pub expires_at: Instant,
}

impl Entry {
    /// Creates an entry that expires `ttl` from now.
    pub fn new(value: impl Into<String>, ttl: Duration) -> Self {
        Self {
            value: value.into(),
            expires_at: deadline(ttl),
        }
    }

    /// Checks if this entry has expired.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Checks expiry against a caller-supplied clock reading, so a walk over
    /// many entries judges all of them against the same instant.
    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Moves the deadline to `ttl` from now, keeping the value.
    pub fn refresh(&mut self, ttl: Duration) {
        self.expires_at = deadline(ttl);
    }
}

/// Computes `now + ttl`, saturating instead of panicking on huge TTLs.
pub fn deadline(ttl: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(ttl)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}
