//! Store Module
//!
//! The key-value store fragments are cached in, plus an in-memory
//! implementation with TTL expiration and bounded capacity.

mod entry;
mod memory;
mod stats;

use async_trait::async_trait;

use crate::error::Result;

// Re-export public types
pub use entry::CacheEntry;
pub use memory::MemoryStore;
pub use stats::CacheStats;

// == Public Constants ==
/// Maximum allowed key length in bytes (memcached limit)
pub const MAX_KEY_LENGTH: usize = 250;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

// == Fragment Store ==
/// Key-value store holding rendered fragments.
///
/// Implementations are expected to be safe for concurrent single-key
/// operations; nothing above this trait coordinates writers.
#[async_trait]
pub trait FragmentStore: Send + Sync {
    /// Returns the body stored under `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key` for `ttl_minutes` minutes (0 = no expiry).
    async fn set(&self, key: &str, value: String, ttl_minutes: u64) -> Result<()>;
}
