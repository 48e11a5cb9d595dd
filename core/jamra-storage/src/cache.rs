//! Persisted extension cache backend.
//!
//! Rows live in the `extension_cache` table keyed by the composite
//! `(namespace, cache_key)` primary key. Values are wrapped in a `{"v": …}`
//! JSON envelope so any JSON-compatible payload (scalars and `null`
//! included) fits one TEXT column and round-trips unchanged.

use crate::{Database, StorageError, StorageResult};
use async_trait::async_trait;
use jamra_cache::{CacheResult, ExtensionCache};
use jamra_types::timestamp_ms;
use rusqlite::{OptionalExtension, params};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// [`ExtensionCache`] backend persisted in the catalog database.
///
/// Expiry is lazy: a `get` that finds an expired row deletes it and reports
/// a miss. [`ExtensionCache::cleanup_expired`] sweeps in bulk; the embedding
/// host owns its scheduling.
#[derive(Debug, Clone)]
pub struct SqliteCache {
    db: Database,
}

impl SqliteCache {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Convenience constructor over an in-memory database.
    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Number of stored rows, expired ones included.
    pub fn row_count(&self) -> StorageResult<u64> {
        let conn = self.db.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM extension_cache", [], |row| {
            row.get(0)
        })?;
        Ok(count as u64)
    }

    fn get_at(&self, namespace: &str, key: &str, now_ms: u64) -> StorageResult<Option<Value>> {
        let conn = self.db.lock()?;
        let row: Option<(String, Option<u64>)> = conn
            .query_row(
                "SELECT value, expires_at FROM extension_cache
                 WHERE namespace = ?1 AND cache_key = ?2",
                params![namespace, key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((raw, expires_at)) = row else {
            return Ok(None);
        };

        if matches!(expires_at, Some(at) if now_ms >= at) {
            conn.execute(
                "DELETE FROM extension_cache WHERE namespace = ?1 AND cache_key = ?2",
                params![namespace, key],
            )?;
            return Ok(None);
        }

        let mut envelope: Value = serde_json::from_str(&raw)?;
        match envelope.get_mut("v") {
            Some(value) => Ok(Some(value.take())),
            None => Err(StorageError::InvalidData(format!(
                "cache row {namespace}/{key} is missing its envelope"
            ))),
        }
    }

    fn set_at(
        &self,
        namespace: &str,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
        now_ms: u64,
    ) -> StorageResult<()> {
        let envelope = serde_json::to_string(&serde_json::json!({ "v": value }))?;
        let expires_at = ttl.map(|ttl| now_ms.saturating_add(ttl.as_millis() as u64));

        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO extension_cache (namespace, cache_key, value, expires_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (namespace, cache_key)
             DO UPDATE SET value = ?3, expires_at = ?4, updated_at = ?5",
            params![namespace, key, envelope, expires_at, now_ms],
        )?;
        Ok(())
    }

    fn delete_row(&self, namespace: &str, key: &str) -> StorageResult<()> {
        let conn = self.db.lock()?;
        conn.execute(
            "DELETE FROM extension_cache WHERE namespace = ?1 AND cache_key = ?2",
            params![namespace, key],
        )?;
        Ok(())
    }

    /// [`ExtensionCache::cleanup_expired`] with an explicit clock, for
    /// embedders that schedule sweeps against their own notion of now.
    pub fn cleanup_expired_at(&self, now_ms: u64) -> StorageResult<u64> {
        let conn = self.db.lock()?;
        let removed = conn.execute(
            "DELETE FROM extension_cache WHERE expires_at IS NOT NULL AND expires_at <= ?1",
            params![now_ms],
        )?;
        if removed > 0 {
            debug!(removed, "swept expired cache rows");
        }
        Ok(removed as u64)
    }
}

#[async_trait]
impl ExtensionCache for SqliteCache {
    async fn get(&self, namespace: &str, key: &str) -> CacheResult<Option<Value>> {
        Ok(self.get_at(namespace, key, timestamp_ms())?)
    }

    async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        Ok(self.set_at(namespace, key, value, ttl, timestamp_ms())?)
    }

    async fn delete(&self, namespace: &str, key: &str) -> CacheResult<()> {
        Ok(self.delete_row(namespace, key)?)
    }

    async fn cleanup_expired(&self) -> CacheResult<u64> {
        Ok(self.cleanup_expired_at(timestamp_ms())?)
    }
}
