//! Short-TTL cache for CI job metadata, shared by every adapter.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value as JsonValue;
use tokio::sync::RwLock;

struct CachedEntry {
    value: JsonValue,
    fetched_at: Instant,
}

/// Job metadata cache, keyed by the adapter.
///
/// A zero TTL disables caching entirely.
#[derive(Clone)]
pub struct MetadataCache {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, CachedEntry>>>,
}

impl std::fmt::Debug for MetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl MetadataCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Fresh cached value for `key`, if any.
    pub async fn get(&self, key: &str) -> Option<JsonValue> {
        if !self.is_enabled() {
            return None;
        }
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(cached) if cached.fetched_at.elapsed() < self.ttl => Some(cached.value.clone()),
            _ => None,
        }
    }

    /// Store `value` under `key`, evicting expired entries.
    pub async fn insert(&self, key: String, value: JsonValue) {
        if !self.is_enabled() {
            return;
        }
        let ttl = self.ttl;
        let mut entries = self.entries.write().await;
        entries.retain(|_, cached| cached.fetched_at.elapsed() < ttl);
        entries.insert(
            key,
            CachedEntry {
                value,
                fetched_at: Instant::now(),
            },
        );
    }
}
