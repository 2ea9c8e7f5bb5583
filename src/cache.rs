use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Key-value store for shaped responses. Entries are replaced whole, never
/// mutated in place, and there is no atomic compute-on-miss: callers do
/// get, compute and put as separate steps.
pub trait Cache<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<V>;

    fn put(&self, key: String, value: V, ttl: Duration);

    fn flush(&self);
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// In-process cache with per-entry expiry.
pub struct MemoryCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<V> MemoryCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Cache<V> for MemoryCache<V>
where
    V: Clone + Send + Sync,
{
    fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if entry.expires_at > now {
                return Some(entry.value.clone());
            }
        }
        // The read guard is released above; removing while holding it would deadlock.
        self.entries
            .remove_if(key, |_, entry| entry.expires_at <= now);
        None
    }

    fn put(&self, key: String, value: V, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.entries.insert(key, CacheEntry { value, expires_at });
    }

    fn flush(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_then_get() {
        let cache = MemoryCache::new();
        cache.put("k".to_string(), 42u32, Duration::from_secs(300));
        assert_eq!(cache.get("k"), Some(42));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_expired_entry_is_a_miss_and_removed() {
        let cache = MemoryCache::new();
        cache.put("k".to_string(), "v".to_string(), Duration::ZERO);
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_replaces_existing_value() {
        let cache = MemoryCache::new();
        cache.put("k".to_string(), 1u8, Duration::from_secs(60));
        cache.put("k".to_string(), 2u8, Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_flush_and_purge() {
        let cache = MemoryCache::new();
        cache.put("live".to_string(), 1u8, Duration::from_secs(60));
        cache.put("dead".to_string(), 2u8, Duration::ZERO);
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.get("live"), Some(1));

        cache.flush();
        assert!(cache.is_empty());
    }
}
