//! Best-effort TTL cache for serialized search responses.
//!
//! In-process only; a miss and a failure look the same to callers, and
//! nothing in the search path ever fails because of the cache. Expired
//! entries are dropped on re-read and swept on every write; keys are
//! caller-controlled query strings, so without the sweep the map would grow
//! without bound in a long-running server.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct SearchCache {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, (Instant, String)>>>,
}

impl SearchCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs),
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((stored_at, value)) if stored_at.elapsed() < self.ttl => {
                    return Some(value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Expired: drop it under the write lock.
        self.entries.write().await.remove(key);
        None
    }

    pub async fn put(&self, key: String, value: String) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < self.ttl);
        entries.insert(key, (Instant::now(), value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn roundtrip_within_ttl() {
        let cache = SearchCache::new(60);
        cache.put("k".into(), "v".into()).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));
        assert_eq!(cache.get("other").await, None);
    }

    #[tokio::test]
    async fn writes_sweep_expired_entries_under_other_keys() {
        let cache = SearchCache::new(0);
        cache.put("stale-1".into(), "v".into()).await;
        cache.put("stale-2".into(), "v".into()).await;
        cache.put("fresh".into(), "v".into()).await;
        // Only the entry written last survives; the stale keys were swept
        // without ever being read again.
        let entries = cache.entries.read().await;
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("fresh"));
    }

    #[tokio::test]
    async fn zero_ttl_entries_are_already_expired() {
        let cache = SearchCache::new(0);
        cache.put("k".into(), "v".into()).await;
        assert_eq!(cache.get("k").await, None);
        // The expired entry was evicted, not just hidden.
        assert!(cache.entries.read().await.is_empty());
    }
}
