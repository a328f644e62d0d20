//! Cache Entry Module
//!
//! A stored fragment body together with its expiry.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A single stored fragment.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The rendered fragment body
    pub value: String,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry living for `ttl`, or forever when `ttl` is None.
    pub fn new(value: String, ttl: Option<Duration>) -> Self {
        let now = current_timestamp_ms();
        let expires_at = ttl.map(|ttl| {
            now.saturating_add(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX))
        });

        Self {
            value,
            created_at: now,
            expires_at,
        }
    }

    /// Creates an entry from a TTL expressed in minutes; zero never expires.
    pub fn with_ttl_minutes(value: String, ttl_minutes: u64) -> Self {
        let ttl = (ttl_minutes > 0).then(|| Duration::from_secs(ttl_minutes.saturating_mul(60)));
        Self::new(value, ttl)
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches its expiry.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Expiry check against an explicit clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }

    /// Remaining lifetime in seconds, None if the entry never expires.
    pub fn ttl_remaining(&self) -> Option<u64> {
        let now = current_timestamp_ms();
        self.expires_at
            .map(|expires| expires.saturating_sub(now) / 1000)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_zero_minutes_never_expires() {
        let entry = CacheEntry::with_ttl_minutes("<p>x</p>".to_string(), 0);

        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
        assert!(entry.ttl_remaining().is_none());
    }

    #[test]
    fn test_minutes_converted_to_expiry() {
        let entry = CacheEntry::with_ttl_minutes("<p>x</p>".to_string(), 5);

        let lifetime = entry.expires_at.unwrap() - entry.created_at;
        assert_eq!(lifetime, 5 * 60 * 1000);
        let remaining = entry.ttl_remaining().unwrap();
        assert!(remaining <= 300 && remaining >= 299);
    }

    #[test]
    fn test_huge_ttl_saturates_instead_of_wrapping() {
        let entry = CacheEntry::with_ttl_minutes("v".to_string(), 307_445_734_561_826);

        assert_eq!(entry.expires_at, Some(u64::MAX));
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new("v".to_string(), Some(Duration::from_millis(50)));
        assert!(!entry.is_expired());

        sleep(Duration::from_millis(80));

        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining(), Some(0));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry {
            value: "v".to_string(),
            created_at: 1_000,
            expires_at: Some(2_000),
        };

        assert!(!entry.is_expired_at(1_999));
        assert!(entry.is_expired_at(2_000));
    }
}
