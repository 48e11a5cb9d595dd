//! Namespaced TTL cache capability for Jamra extensions.
//!
//! Extensions cache upstream responses (catalogue pages, chapter lists,
//! resolved image URLs) so repeated browse operations do not re-hit the
//! source. Two interchangeable backends implement [`ExtensionCache`]:
//! - [`MemoryCache`] here: process lifetime, values held by reference
//! - `SqliteCache` in `jamra-storage`: survives restarts
//!
//! Expiry is lazy: a read that finds an expired entry treats it as a miss
//! and deletes it. There is no background sweeper; the embedding host calls
//! [`ExtensionCache::cleanup_expired`] to reclaim space in bulk.

mod memory;
mod scoped;

pub use memory::MemoryCache;
pub use scoped::ScopedCache;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur in cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Failure in the backing store (SQLite row access, statement prepare, …).
    #[error("cache backend error: {0}")]
    Backend(String),

    /// Value could not be serialized into or out of the storage envelope.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Interior mutex was poisoned by a panicking writer.
    #[error("cache lock poisoned: {reason}")]
    LockPoisoned { reason: String },
}

/// Key/value store with per-entry TTL, partitioned into caller-chosen
/// namespaces (typically the extension id).
///
/// All operations are independent point operations; no multi-key
/// transactions, and two concurrent `set` calls on the same key resolve by
/// last write wins in commit order.
#[async_trait]
pub trait ExtensionCache: Send + Sync {
    /// Looks up `key` within `namespace`. An entry whose TTL has elapsed is
    /// logically absent: it is deleted as a side effect and `None` returned.
    async fn get(&self, namespace: &str, key: &str) -> CacheResult<Option<Value>>;

    /// Upserts `key` within `namespace`. With a `ttl` the entry expires at
    /// `now + ttl`; without one it never expires. Re-setting an existing key
    /// overwrites both value and expiry.
    async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> CacheResult<()>;

    /// Removes `key` within `namespace`. Deleting an absent key is not an
    /// error.
    async fn delete(&self, namespace: &str, key: &str) -> CacheResult<()>;

    /// Removes every entry whose expiry has elapsed, returning how many were
    /// dropped.
    async fn cleanup_expired(&self) -> CacheResult<u64>;
}
