//! Per-extension cache view.

use crate::{CacheResult, ExtensionCache};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// The cache object an extension actually receives: a shared backend with
/// the namespace fixed at construction time (the extension id), so an
/// extension cannot read or write outside its own namespace even by
/// choosing colliding keys.
#[derive(Clone)]
pub struct ScopedCache {
    backend: Arc<dyn ExtensionCache>,
    namespace: String,
}

impl ScopedCache {
    pub fn new(backend: Arc<dyn ExtensionCache>, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        self.backend.get(&self.namespace, key).await
    }

    pub async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> CacheResult<()> {
        self.backend.set(&self.namespace, key, value, ttl).await
    }

    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        self.backend.delete(&self.namespace, key).await
    }
}

impl std::fmt::Debug for ScopedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedCache")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
