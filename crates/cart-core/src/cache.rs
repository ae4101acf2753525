//! Read-through TTL cache for catalog lookups (spec.md §4.9.2).
//!
//! The source this was distilled from (`cacher.Cacher`) serializes the
//! entire lookup-then-fetch-then-store path behind one binary semaphore,
//! which kills parallel catalog lookups across unrelated SKUs (see
//! spec.md §9, "Cart product cache with global lock"). This rewrite keeps
//! the same `get`/`add` (set-if-absent) contract and TTL semantics but
//! replaces the global lock with a `tokio::sync::RwLock<HashMap<..>>`:
//! concurrent reads of different (or the same) keys don't block each
//! other, and a write only takes the lock for the instant it inserts.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

struct Entry {
    bytes: Vec<u8>,
    expires_at: Instant,
}

/// Keyed by stringified `sku_id`; value is the raw JSON bytes of the
/// cached [`crate::model::ProductInfo`].
pub struct ProductCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

impl ProductCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached bytes for `key`, or `None` on a miss or expiry.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(entry.bytes.clone())
    }

    /// Stores `value` under `key` iff no live entry exists yet
    /// (set-if-not-exists), refreshing the TTL from now.
    pub async fn add(&self, key: String, value: Vec<u8>) {
        let mut entries = self.entries.write().await;
        if let Some(existing) = entries.get(&key) {
            if existing.expires_at > Instant::now() {
                return;
            }
        }
        entries.insert(
            key,
            Entry {
                bytes: value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drops every entry, live or expired.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn add_then_get_round_trips() {
        let cache = ProductCache::new(Duration::from_secs(60));
        cache.add("1002".to_string(), b"payload".to_vec()).await;
        assert_eq!(cache.get("1002").await, Some(b"payload".to_vec()));
    }

    #[tokio::test]
    async fn add_is_set_if_absent() {
        let cache = ProductCache::new(Duration::from_secs(60));
        cache.add("1002".to_string(), b"first".to_vec()).await;
        cache.add("1002".to_string(), b"second".to_vec()).await;
        assert_eq!(cache.get("1002").await, Some(b"first".to_vec()));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_a_miss() {
        let cache = ProductCache::new(Duration::from_millis(10));
        cache.add("1002".to_string(), b"payload".to_vec()).await;
        tokio::time::advance(Duration::from_millis(11)).await;
        assert_eq!(cache.get("1002").await, None);
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let cache = ProductCache::new(Duration::from_secs(60));
        cache.add("1002".to_string(), b"payload".to_vec()).await;
        cache.clear().await;
        assert_eq!(cache.get("1002").await, None);
    }
}
