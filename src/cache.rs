use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Entry stored in the cache with an expiry timestamp.
#[derive(Clone)]
pub(crate) struct CacheEntry {
    value: String,
    pub(crate) expires_at: Instant,
}

/// Request cache shared with detail views.
///
/// Holds JSON-encoded query results keyed by query key (for example
/// `notifications:page:1`). Entries honour their TTL on read and are evicted
/// lazily; `evict_expired()` sweeps the whole map. Mutations in the store
/// invalidate the `notifications` prefix so detail views never serve a page
/// that predates a local change.
#[derive(Clone)]
pub struct QueryCache {
    pub(crate) local: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            local: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if let Some(entry) = self.local.get(key) {
            if Instant::now() < entry.expires_at {
                return serde_json::from_str(&entry.value).ok();
            }
            // expired, drop the ref before removing
            drop(entry);
            self.local.remove(key);
        }
        None
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        let json = serde_json::to_string(value)?;
        self.local.insert(
            key.to_string(),
            CacheEntry {
                value: json,
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(())
    }

    pub fn invalidate(&self, key: &str) {
        self.local.remove(key);
    }

    /// Drop every entry whose key starts with `prefix`. Returns how many were removed.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let before = self.local.len();
        self.local.retain(|key, _| !key.starts_with(prefix));
        before - self.local.len()
    }

    pub fn clear(&self) {
        self.local.clear();
    }

    /// Remove all expired entries.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.local.len();
        self.local.retain(|_, entry| entry.expires_at > now);
        before - self.local.len()
    }

    pub fn len(&self) -> usize {
        self.local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty()
    }
}
