//! Per-connection caches.
//!
//! [`ConnectionCache`] is the capability the connection layer depends on;
//! [`MemoryCache`] is the in-process implementation. [`SingleFlight`]
//! builds memoized lookups on top of it.

use dashmap::DashMap;

mod single_flight;

pub use single_flight::{SharedError, SingleFlight};

/// Key/value cache scoped to one connection. Entries never expire.
pub trait ConnectionCache<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<V>;

    fn set(&self, key: &str, value: V);
}

/// Lock-free in-memory cache.
pub struct MemoryCache<V> {
    entries: DashMap<String, V>,
}

impl<V> MemoryCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> ConnectionCache<V> for MemoryCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: V) {
        self.entries.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_cache_get_set() {
        let cache = MemoryCache::new();
        assert!(cache.get("mailchimp").is_none());

        cache.set("mailchimp", 1u32);
        assert_eq!(cache.get("mailchimp"), Some(1));

        cache.set("mailchimp", 2u32);
        assert_eq!(cache.get("mailchimp"), Some(2));
        assert_eq!(cache.len(), 1);
    }
}
