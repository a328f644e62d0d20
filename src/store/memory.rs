//! Memory Store Module
//!
//! HashMap-backed fragment store with TTL expiration and a capacity bound.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{FragmentCacheError, Result};
use crate::store::{CacheEntry, CacheStats, FragmentStore, MAX_KEY_LENGTH, MAX_VALUE_SIZE};

// == Memory Store ==
/// In-process fragment storage.
///
/// When full, the entry closest to expiry is evicted; entries without an
/// expiry go last.
#[derive(Debug)]
pub struct MemoryStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Usage statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
}

impl MemoryStore {
    // == Constructor ==
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            max_entries,
        }
    }

    // == Insert ==
    /// Stores `value` under `key`, replacing any previous value and expiry.
    ///
    /// # Arguments
    /// * `key` - Fragment key, at most `MAX_KEY_LENGTH` bytes
    /// * `value` - Fragment body, at most `MAX_VALUE_SIZE` bytes
    /// * `ttl` - Lifetime, None for no expiry
    pub fn insert(&mut self, key: String, value: String, ttl: Option<Duration>) -> Result<()> {
        self.validate(&key, &value)?;
        self.make_room_for(&key)?;
        self.entries.insert(key, CacheEntry::new(value, ttl));
        self.after_write();
        Ok(())
    }

    /// Stores `value` with a TTL in minutes; zero never expires.
    pub fn insert_for_minutes(&mut self, key: String, value: String, ttl_minutes: u64) -> Result<()> {
        self.validate(&key, &value)?;
        self.make_room_for(&key)?;
        self.entries
            .insert(key, CacheEntry::with_ttl_minutes(value, ttl_minutes));
        self.after_write();
        Ok(())
    }

    // == Lookup ==
    /// Returns the live value under `key`.
    ///
    /// Expired entries are dropped on the way and count as misses.
    pub fn lookup(&mut self, key: &str) -> Option<String> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                self.stats.record_hit();
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        self.stats.record_miss();
        None
    }

    /// Drops a single fragment, returning whether it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, returning how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        self.stats.set_total_entries(self.entries.len());
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn validate(&self, key: &str, value: &str) -> Result<()> {
        if key.is_empty() {
            return Err(FragmentCacheError::InvalidRequest(
                "Key cannot be empty".to_string(),
            ));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(FragmentCacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(FragmentCacheError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }
        Ok(())
    }

    fn make_room_for(&mut self, key: &str) -> Result<()> {
        if self.entries.contains_key(key) || self.entries.len() < self.max_entries {
            return Ok(());
        }

        let victim = self
            .entries
            .iter()
            .min_by(|(ka, a), (kb, b)| {
                let a_expiry = a.expires_at.unwrap_or(u64::MAX);
                let b_expiry = b.expires_at.unwrap_or(u64::MAX);
                a_expiry
                    .cmp(&b_expiry)
                    .then(a.created_at.cmp(&b.created_at))
                    .then(ka.cmp(kb))
            })
            .map(|(k, _)| k.clone());

        match victim {
            Some(victim) => {
                self.entries.remove(&victim);
                self.stats.record_eviction();
                Ok(())
            }
            None => Err(FragmentCacheError::Store(
                "Store has no capacity for fragments".to_string(),
            )),
        }
    }

    fn after_write(&mut self) {
        self.stats.record_write();
        self.stats.set_total_entries(self.entries.len());
    }
}

// == Fragment Store Implementation ==
#[async_trait]
impl FragmentStore for RwLock<MemoryStore> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        // Write lock: lookups update stats and drop expired entries
        let mut store = self.write().await;
        Ok(store.lookup(key))
    }

    async fn set(&self, key: &str, value: String, ttl_minutes: u64) -> Result<()> {
        let mut store = self.write().await;
        store.insert_for_minutes(key.to_string(), value, ttl_minutes)
    }
}
