//! In-memory cache backend.
//!
//! Entries live for the process lifetime and values are stored as parsed
//! [`Value`]s, with no serialization envelope. Observably equivalent to the
//! persisted backend for JSON-safe payloads.

use crate::{CacheError, CacheResult, ExtensionCache};
use async_trait::async_trait;
use jamra_types::timestamp_ms;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// ASCII unit separator. Extension ids cannot contain it, so no namespace
/// can compose a key that collides with another namespace's entries.
const KEY_SEPARATOR: char = '\u{1F}';

fn composite_key(namespace: &str, key: &str) -> String {
    format!("{namespace}{KEY_SEPARATOR}{key}")
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Value,
    /// Absolute expiry in ms since the Unix epoch; `None` never expires.
    expires_at: Option<u64>,
}

impl MemoryEntry {
    fn is_expired(&self, now_ms: u64) -> bool {
        matches!(self.expires_at, Some(at) if now_ms >= at)
    }
}

/// Process-lifetime [`ExtensionCache`] backend over a mutex-guarded map.
///
/// Point operations take the lock only long enough to touch one entry, so
/// concurrent handler calls interleave safely without external locking.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included (they are only
    /// reclaimed on read or cleanup).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> CacheResult<std::sync::MutexGuard<'_, HashMap<String, MemoryEntry>>> {
        self.entries.lock().map_err(|e| CacheError::LockPoisoned {
            reason: e.to_string(),
        })
    }

    fn get_at(&self, namespace: &str, key: &str, now_ms: u64) -> CacheResult<Option<Value>> {
        let mut entries = self.lock()?;
        let composite = composite_key(namespace, key);
        match entries.get(&composite) {
            Some(entry) if entry.is_expired(now_ms) => {
                entries.remove(&composite);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    fn set_at(
        &self,
        namespace: &str,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
        now_ms: u64,
    ) -> CacheResult<()> {
        let expires_at = ttl.map(|ttl| now_ms.saturating_add(ttl.as_millis() as u64));
        self.lock()?
            .insert(composite_key(namespace, key), MemoryEntry { value, expires_at });
        Ok(())
    }

    /// [`ExtensionCache::cleanup_expired`] with an explicit clock, for
    /// embedders that schedule sweeps against their own notion of now.
    pub fn cleanup_expired_at(&self, now_ms: u64) -> CacheResult<u64> {
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now_ms));
        Ok((before - entries.len()) as u64)
    }
}

#[async_trait]
impl ExtensionCache for MemoryCache {
    async fn get(&self, namespace: &str, key: &str) -> CacheResult<Option<Value>> {
        self.get_at(namespace, key, timestamp_ms())
    }

    async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        self.set_at(namespace, key, value, ttl, timestamp_ms())
    }

    async fn delete(&self, namespace: &str, key: &str) -> CacheResult<()> {
        self.lock()?.remove(&composite_key(namespace, key));
        Ok(())
    }

    async fn cleanup_expired(&self) -> CacheResult<u64> {
        self.cleanup_expired_at(timestamp_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn set_then_get_returns_deep_equal_value() {
        let cache = MemoryCache::new();
        let payload = json!({"items": [{"id": "m1", "title": "Dorohedoro"}], "hasMore": true});

        cache.set_at("ext-a", "page:1", payload.clone(), None, 0).unwrap();
        let got = cache.get_at("ext-a", "page:1", 0).unwrap();
        assert_eq!(got, Some(payload));
    }

    #[test]
    fn entry_expires_at_ttl_boundary_and_is_removed() {
        let cache = MemoryCache::new();
        let payload = json!({"items": []});
        cache
            .set_at("ext-a", "page:1", payload.clone(), Some(Duration::from_millis(60_000)), 0)
            .unwrap();

        // One tick before the boundary the value is still served.
        assert_eq!(cache.get_at("ext-a", "page:1", 59_999).unwrap(), Some(payload));
        assert_eq!(cache.len(), 1);

        // At and after the boundary it is a miss, and the read reclaims it.
        assert_eq!(cache.get_at("ext-a", "page:1", 60_001).unwrap(), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn entry_without_ttl_never_expires() {
        let cache = MemoryCache::new();
        cache.set_at("ext-a", "k", json!(1), None, 0).unwrap();
        assert_eq!(cache.get_at("ext-a", "k", u64::MAX).unwrap(), Some(json!(1)));
    }

    #[test]
    fn reset_overwrites_value_and_expiry() {
        let cache = MemoryCache::new();
        cache
            .set_at("ext-a", "k", json!("old"), Some(Duration::from_millis(10)), 0)
            .unwrap();
        cache.set_at("ext-a", "k", json!("new"), None, 5).unwrap();

        // The old 10ms expiry no longer applies.
        assert_eq!(cache.get_at("ext-a", "k", 1_000).unwrap(), Some(json!("new")));
    }

    #[tokio::test]
    async fn delete_absent_key_is_idempotent() {
        let cache = MemoryCache::new();
        cache.set("ext-a", "k", json!(1), None).await.unwrap();

        cache.delete("ext-a", "missing").await.unwrap();
        assert_eq!(cache.len(), 1);

        cache.delete("ext-a", "k").await.unwrap();
        cache.delete("ext-a", "k").await.unwrap();
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn namespaces_do_not_observe_each_other() {
        let cache = MemoryCache::new();
        cache.set("ext-a", "page:1", json!("a"), None).await.unwrap();
        cache.set("ext-b", "page:1", json!("b"), None).await.unwrap();

        assert_eq!(cache.get("ext-a", "page:1").await.unwrap(), Some(json!("a")));
        assert_eq!(cache.get("ext-b", "page:1").await.unwrap(), Some(json!("b")));

        cache.delete("ext-a", "page:1").await.unwrap();
        assert_eq!(cache.get("ext-b", "page:1").await.unwrap(), Some(json!("b")));
    }

    #[test]
    fn cleanup_removes_only_expired_entries() {
        let cache = MemoryCache::new();
        cache
            .set_at("ext-a", "stale", json!(1), Some(Duration::from_millis(100)), 0)
            .unwrap();
        cache
            .set_at("ext-a", "fresh", json!(2), Some(Duration::from_millis(10_000)), 0)
            .unwrap();
        cache.set_at("ext-a", "pinned", json!(3), None, 0).unwrap();

        let removed = cache.cleanup_expired_at(500).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_at("ext-a", "fresh", 500).unwrap(), Some(json!(2)));
        assert_eq!(cache.get_at("ext-a", "pinned", 500).unwrap(), Some(json!(3)));
    }
}
