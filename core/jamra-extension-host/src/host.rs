//! Extension registry and handler dispatch.
//!
//! The host owns every loaded extension, tracks which one is active, and
//! invokes handlers with the per-extension context. Load/unload for one
//! extension id serialize through a per-id async lock; dispatch takes no
//! global lock — the registry read guard is dropped before the handler is
//! awaited, so slow upstream handlers never block lifecycle operations or
//! other extensions' calls.

use crate::context::{ContextOptions, ExtensionContext, RuntimeInfo, create_context};
use crate::error::ExtensionHostError;
use crate::handlers::{ExtensionModule, Operation};
use crate::manifest::{ExtensionManifest, validate_manifest};
use jamra_cache::{ExtensionCache, MemoryCache};
use jamra_http::{HttpClient, HttpRequester};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Registration state of one extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionStatus {
    /// Registered and queryable.
    Loaded,
    /// Registered and currently serving catalog/search requests.
    Active,
}

/// Settled result of a dispatch.
#[derive(Debug)]
pub enum DispatchOutcome {
    Completed(Value),
    /// The extension does not implement the operation. A normal negative
    /// result, not an error; callers branch on it without exception
    /// handling.
    Unsupported { operation: Operation },
}

impl DispatchOutcome {
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Unsupported { .. } => None,
        }
    }
}

struct RegisteredExtension {
    module: ExtensionModule,
    context: Arc<ExtensionContext>,
}

/// Owns the registry of loaded extensions and dispatches handler calls.
///
/// Holds no ambient state; multiple hosts coexist in one process (tests
/// rely on this).
pub struct ExtensionHost {
    extensions: RwLock<HashMap<String, Arc<RegisteredExtension>>>,
    active: RwLock<Option<String>>,
    /// Per-id lifecycle locks. Entries are never removed; the set of ids a
    /// host ever sees is small.
    lifecycle_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    cache: Arc<dyn ExtensionCache>,
    http: Arc<dyn HttpRequester>,
    runtime: RuntimeInfo,
}

impl ExtensionHost {
    /// Host with default capabilities: a process-lifetime in-memory cache
    /// and the standard HTTP client.
    pub fn new() -> Result<Self, ExtensionHostError> {
        Ok(Self::with_capabilities(
            Arc::new(MemoryCache::new()),
            Arc::new(HttpClient::new()?),
        ))
    }

    /// Host over caller-supplied shared capabilities (e.g. the persisted
    /// SQLite cache). The cache backend is shared across extensions;
    /// isolation comes from per-extension namespacing.
    pub fn with_capabilities(
        cache: Arc<dyn ExtensionCache>,
        http: Arc<dyn HttpRequester>,
    ) -> Self {
        Self {
            extensions: RwLock::new(HashMap::new()),
            active: RwLock::new(None),
            lifecycle_locks: Mutex::new(HashMap::new()),
            cache,
            http,
            runtime: RuntimeInfo::detect(),
        }
    }

    // ================================================================
    // Loading / Unloading
    // ================================================================

    /// Loads an extension with host-default context options.
    pub async fn load(&self, module: ExtensionModule) -> Result<(), ExtensionHostError> {
        self.load_with_options(module, ContextOptions::default()).await
    }

    /// Validates the manifest, builds the context, runs `initialize`, and
    /// registers the module, replacing (never duplicating) any prior
    /// registration under the same id. If `initialize` fails the extension
    /// is not registered.
    pub async fn load_with_options(
        &self,
        module: ExtensionModule,
        mut options: ContextOptions,
    ) -> Result<(), ExtensionHostError> {
        validate_manifest(&module.manifest).map_err(|issues| {
            ExtensionHostError::ManifestValidation {
                id: (!module.manifest.id.is_empty()).then(|| module.manifest.id.clone()),
                issues,
            }
        })?;
        let id = module.manifest.id.clone();

        let lock = self.lifecycle_lock(&id).await;
        let _guard = lock.lock().await;

        if options.cache.is_none() {
            options.cache = Some(Arc::clone(&self.cache));
        }
        if options.http.is_none() {
            options.http = Some(Arc::clone(&self.http));
        }
        if options.runtime.is_none() {
            options.runtime = Some(self.runtime.clone());
        }

        let context = Arc::new(create_context(&module.manifest, options)?);

        if let Some(initialize) = module.handlers.initialize.clone() {
            initialize(Arc::clone(&context)).await.map_err(|cause| {
                ExtensionHostError::LoadFailed {
                    id: id.clone(),
                    cause,
                }
            })?;
        }

        let replaced = self
            .extensions
            .write()
            .await
            .insert(id.clone(), Arc::new(RegisteredExtension { module, context }));

        if let Some(prior) = replaced {
            info!(extension_id = %id, "registration replaced, shutting down prior instance");
            Self::shutdown_best_effort(&prior).await;
        }

        info!(extension_id = %id, "extension loaded");
        Ok(())
    }

    /// Removes a registration, running its `shutdown` handler best-effort.
    /// Shutdown failures are logged and suppressed: unload always
    /// completes once the id is found.
    pub async fn unload(&self, id: &str) -> Result<(), ExtensionHostError> {
        let lock = self.lifecycle_lock(id).await;
        let _guard = lock.lock().await;

        let removed = self
            .extensions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| ExtensionHostError::ExtensionNotFound(id.to_string()))?;

        {
            let mut active = self.active.write().await;
            if active.as_deref() == Some(id) {
                *active = None;
            }
        }

        Self::shutdown_best_effort(&removed).await;
        info!(extension_id = %id, "extension unloaded");
        Ok(())
    }

    async fn shutdown_best_effort(extension: &RegisteredExtension) {
        if let Some(shutdown) = extension.module.handlers.shutdown.clone() {
            if let Err(cause) = shutdown(Arc::clone(&extension.context)).await {
                warn!(
                    extension_id = %extension.module.manifest.id,
                    "shutdown handler failed: {cause:#}"
                );
            }
        }
    }

    async fn lifecycle_lock(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.lifecycle_locks.lock().await;
        Arc::clone(locks.entry(id.to_string()).or_default())
    }

    // ================================================================
    // Registry access
    // ================================================================

    /// Manifests of every registered extension, independent of active
    /// status.
    pub async fn list_loaded_extensions(&self) -> Vec<ExtensionManifest> {
        self.extensions
            .read()
            .await
            .values()
            .map(|ext| ext.module.manifest.clone())
            .collect()
    }

    pub async fn is_loaded(&self, id: &str) -> bool {
        self.extensions.read().await.contains_key(id)
    }

    pub async fn extension_count(&self) -> usize {
        self.extensions.read().await.len()
    }

    pub async fn status(&self, id: &str) -> Option<ExtensionStatus> {
        if !self.is_loaded(id).await {
            return None;
        }
        if self.active.read().await.as_deref() == Some(id) {
            Some(ExtensionStatus::Active)
        } else {
            Some(ExtensionStatus::Loaded)
        }
    }

    // ================================================================
    // Active extension
    // ================================================================

    /// Marks `id` as the extension serving catalog/search requests. At most
    /// one id is active at a time; activating another replaces it.
    pub async fn set_active(&self, id: &str) -> Result<(), ExtensionHostError> {
        if !self.is_loaded(id).await {
            return Err(ExtensionHostError::ExtensionNotFound(id.to_string()));
        }
        *self.active.write().await = Some(id.to_string());
        info!(extension_id = %id, "extension activated");
        Ok(())
    }

    pub async fn clear_active(&self) {
        *self.active.write().await = None;
    }

    pub async fn active_id(&self) -> Option<String> {
        self.active.read().await.clone()
    }

    // ================================================================
    // Dispatch
    // ================================================================

    /// Invokes `operation` on the extension registered under `id`.
    ///
    /// Returns [`DispatchOutcome::Unsupported`] when the extension does not
    /// implement the operation; handler rejections propagate as
    /// [`ExtensionHostError::HandlerFailed`] with the cause attached.
    pub async fn dispatch(
        &self,
        id: &str,
        operation: Operation,
        request: Value,
    ) -> Result<DispatchOutcome, ExtensionHostError> {
        let extension = self
            .extensions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ExtensionHostError::ExtensionNotFound(id.to_string()))?;

        let Some(handler) = extension.module.handlers.operation(operation) else {
            debug!(extension_id = %id, %operation, "operation not implemented");
            return Ok(DispatchOutcome::Unsupported { operation });
        };

        let context = Arc::clone(&extension.context);
        handler(context, request)
            .await
            .map(DispatchOutcome::Completed)
            .map_err(|cause| ExtensionHostError::HandlerFailed {
                id: id.to_string(),
                operation,
                cause,
            })
    }

    /// Dispatches against the active extension.
    pub async fn dispatch_active(
        &self,
        operation: Operation,
        request: Value,
    ) -> Result<DispatchOutcome, ExtensionHostError> {
        let active = self
            .active_id()
            .await
            .ok_or(ExtensionHostError::NoActiveExtension)?;
        self.dispatch(&active, operation, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::ExtensionHandlers;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn manifest(id: &str) -> ExtensionManifest {
        ExtensionManifest::new(id, format!("Test {id}"), "1.0.0")
    }

    fn empty_module(id: &str) -> ExtensionModule {
        ExtensionModule::new(manifest(id), ExtensionHandlers::default())
    }

    fn host() -> ExtensionHost {
        ExtensionHost::new().unwrap()
    }

    // ================================================================
    // Load / list / replace
    // ================================================================

    #[tokio::test]
    async fn load_and_list_extensions() {
        let host = host();
        host.load(empty_module("com.example.a")).await.unwrap();
        host.load(empty_module("com.example.b")).await.unwrap();

        assert_eq!(host.extension_count().await, 2);
        assert!(host.is_loaded("com.example.a").await);
        assert!(host.is_loaded("com.example.b").await);

        let mut ids: Vec<String> = host
            .list_loaded_extensions()
            .await
            .into_iter()
            .map(|m| m.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["com.example.a", "com.example.b"]);
    }

    #[tokio::test]
    async fn reloading_the_same_id_replaces_without_duplicating() {
        let host = host();
        let mut first = manifest("com.example.a");
        first.version = "1.0.0".into();
        let mut second = manifest("com.example.a");
        second.version = "2.0.0".into();

        host.load(ExtensionModule::new(first, ExtensionHandlers::default()))
            .await
            .unwrap();
        host.load(ExtensionModule::new(second, ExtensionHandlers::default()))
            .await
            .unwrap();

        let listed = host.list_loaded_extensions().await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].version, "2.0.0");
    }

    #[tokio::test]
    async fn replacing_a_registration_shuts_down_the_prior_instance() {
        static SHUTDOWNS: AtomicU32 = AtomicU32::new(0);

        let host = host();
        let handlers = ExtensionHandlers::builder()
            .shutdown(|_cx| async {
                SHUTDOWNS.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build();

        host.load(ExtensionModule::new(manifest("com.example.a"), handlers))
            .await
            .unwrap();
        assert_eq!(SHUTDOWNS.load(Ordering::SeqCst), 0);

        host.load(empty_module("com.example.a")).await.unwrap();
        assert_eq!(SHUTDOWNS.load(Ordering::SeqCst), 1);
        assert_eq!(host.extension_count().await, 1);
    }

    // ================================================================
    // Manifest validation at load
    // ================================================================

    #[tokio::test]
    async fn invalid_manifest_is_rejected_with_every_issue() {
        let host = host();
        let mut bad = manifest("");
        bad.name = String::new();

        let err = host
            .load(ExtensionModule::new(bad, ExtensionHandlers::default()))
            .await
            .unwrap_err();

        match err {
            ExtensionHostError::ManifestValidation { id, issues } => {
                assert_eq!(id, None);
                assert_eq!(issues.len(), 2);
            }
            other => panic!("expected ManifestValidation, got {other:?}"),
        }
        assert_eq!(host.extension_count().await, 0);
    }

    #[tokio::test]
    async fn validation_error_carries_the_declared_id_when_present() {
        let host = host();
        let mut bad = manifest("com.example.a");
        bad.version = "not-a-version".into();

        let err = host
            .load(ExtensionModule::new(bad, ExtensionHandlers::default()))
            .await
            .unwrap_err();
        match err {
            ExtensionHostError::ManifestValidation { id, .. } => {
                assert_eq!(id.as_deref(), Some("com.example.a"));
            }
            other => panic!("expected ManifestValidation, got {other:?}"),
        }
    }

    // ================================================================
    // Initialize
    // ================================================================

    #[tokio::test]
    async fn initialize_runs_with_the_extension_context() {
        let host = host();
        let handlers = ExtensionHandlers::builder()
            .initialize(|cx| async move {
                cx.cache.set("warmed", json!(true), None).await?;
                Ok(())
            })
            .catalogue(|cx, _req| async move {
                let warmed = cx.cache.get("warmed").await?;
                Ok(json!({ "warmed": warmed }))
            })
            .build();

        host.load(ExtensionModule::new(manifest("com.example.a"), handlers))
            .await
            .unwrap();

        let outcome = host
            .dispatch("com.example.a", Operation::Catalogue, json!({}))
            .await
            .unwrap();
        assert_eq!(outcome.into_value(), Some(json!({"warmed": true})));
    }

    #[tokio::test]
    async fn initialize_failure_aborts_the_load() {
        let host = host();
        let handlers = ExtensionHandlers::builder()
            .initialize(|_cx| async { Err(anyhow::anyhow!("source unreachable")) })
            .build();

        let err = host
            .load(ExtensionModule::new(manifest("com.example.a"), handlers))
            .await
            .unwrap_err();

        match err {
            ExtensionHostError::LoadFailed { id, cause } => {
                assert_eq!(id, "com.example.a");
                assert!(cause.to_string().contains("source unreachable"));
            }
            other => panic!("expected LoadFailed, got {other:?}"),
        }
        assert!(!host.is_loaded("com.example.a").await);
    }

    // ================================================================
    // Unload
    // ================================================================

    #[tokio::test]
    async fn unload_removes_the_registration() {
        let host = host();
        host.load(empty_module("com.example.a")).await.unwrap();
        host.unload("com.example.a").await.unwrap();
        assert!(!host.is_loaded("com.example.a").await);
    }

    #[tokio::test]
    async fn unload_unknown_id_is_an_error() {
        let host = host();
        assert!(matches!(
            host.unload("missing").await,
            Err(ExtensionHostError::ExtensionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn failing_shutdown_is_suppressed_and_unload_completes() {
        let host = host();
        let handlers = ExtensionHandlers::builder()
            .shutdown(|_cx| async { Err(anyhow::anyhow!("flush failed")) })
            .build();

        host.load(ExtensionModule::new(manifest("com.example.a"), handlers))
            .await
            .unwrap();
        host.unload("com.example.a").await.unwrap();
        assert!(!host.is_loaded("com.example.a").await);
    }

    #[tokio::test]
    async fn unloading_the_active_extension_clears_the_active_slot() {
        let host = host();
        host.load(empty_module("com.example.a")).await.unwrap();
        host.set_active("com.example.a").await.unwrap();
        assert_eq!(host.active_id().await.as_deref(), Some("com.example.a"));

        host.unload("com.example.a").await.unwrap();
        assert_eq!(host.active_id().await, None);
    }

    // ================================================================
    // Active extension
    // ================================================================

    #[tokio::test]
    async fn only_one_extension_is_active_at_a_time() {
        let host = host();
        host.load(empty_module("com.example.a")).await.unwrap();
        host.load(empty_module("com.example.b")).await.unwrap();

        host.set_active("com.example.a").await.unwrap();
        assert_eq!(host.status("com.example.a").await, Some(ExtensionStatus::Active));
        assert_eq!(host.status("com.example.b").await, Some(ExtensionStatus::Loaded));

        host.set_active("com.example.b").await.unwrap();
        assert_eq!(host.status("com.example.a").await, Some(ExtensionStatus::Loaded));
        assert_eq!(host.status("com.example.b").await, Some(ExtensionStatus::Active));
    }

    #[tokio::test]
    async fn activating_an_unloaded_id_is_an_error() {
        let host = host();
        assert!(matches!(
            host.set_active("missing").await,
            Err(ExtensionHostError::ExtensionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn dispatch_active_without_an_active_extension_is_an_error() {
        let host = host();
        assert!(matches!(
            host.dispatch_active(Operation::Catalogue, json!({})).await,
            Err(ExtensionHostError::NoActiveExtension)
        ));
    }

    #[tokio::test]
    async fn dispatch_active_routes_to_the_active_extension() {
        let host = host();
        let handlers = ExtensionHandlers::builder()
            .search(|_cx, req| async move { Ok(json!({ "echo": req })) })
            .build();
        host.load(ExtensionModule::new(manifest("com.example.a"), handlers))
            .await
            .unwrap();
        host.set_active("com.example.a").await.unwrap();

        let outcome = host
            .dispatch_active(Operation::Search, json!({"query": "beastars"}))
            .await
            .unwrap();
        assert_eq!(
            outcome.into_value(),
            Some(json!({"echo": {"query": "beastars"}}))
        );
    }

    // ================================================================
    // Dispatch
    // ================================================================

    #[tokio::test]
    async fn unimplemented_operation_is_a_normal_negative_result() {
        let host = host();
        host.load(empty_module("com.example.a")).await.unwrap();

        let outcome = host
            .dispatch("com.example.a", Operation::Search, json!({"query": "x"}))
            .await
            .unwrap();
        assert!(outcome.is_unsupported());
        assert!(outcome.into_value().is_none());
    }

    #[tokio::test]
    async fn dispatch_unknown_extension_is_an_error() {
        let host = host();
        assert!(matches!(
            host.dispatch("missing", Operation::Catalogue, json!({})).await,
            Err(ExtensionHostError::ExtensionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn handler_rejection_propagates_with_its_cause() {
        let host = host();
        let handlers = ExtensionHandlers::builder()
            .catalogue(|_cx, _req| async { Err(anyhow::anyhow!("upstream returned 503")) })
            .build();
        host.load(ExtensionModule::new(manifest("com.example.a"), handlers))
            .await
            .unwrap();

        let err = host
            .dispatch("com.example.a", Operation::Catalogue, json!({}))
            .await
            .unwrap_err();
        match err {
            ExtensionHostError::HandlerFailed { id, operation, cause } => {
                assert_eq!(id, "com.example.a");
                assert_eq!(operation, Operation::Catalogue);
                assert!(cause.to_string().contains("503"));
            }
            other => panic!("expected HandlerFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn context_is_reused_across_dispatches() {
        let host = host();
        let handlers = ExtensionHandlers::builder()
            .catalogue(|cx, _req| async move {
                let hits = match cx.cache.get("hits").await? {
                    Some(value) => value.as_u64().unwrap_or(0) + 1,
                    None => 1,
                };
                cx.cache.set("hits", json!(hits), None).await?;
                Ok(json!(hits))
            })
            .build();
        host.load(ExtensionModule::new(manifest("com.example.a"), handlers))
            .await
            .unwrap();

        for expected in 1..=3u64 {
            let outcome = host
                .dispatch("com.example.a", Operation::Catalogue, json!({}))
                .await
                .unwrap();
            assert_eq!(outcome.into_value(), Some(json!(expected)));
        }
    }

    #[tokio::test]
    async fn extensions_dispatch_concurrently_without_a_global_lock() {
        let host = Arc::new(host());
        let slow = ExtensionHandlers::builder()
            .catalogue(|_cx, _req| async {
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                Ok(json!("slow"))
            })
            .build();
        let fast = ExtensionHandlers::builder()
            .catalogue(|_cx, _req| async { Ok(json!("fast")) })
            .build();

        host.load(ExtensionModule::new(manifest("com.example.slow"), slow))
            .await
            .unwrap();
        host.load(ExtensionModule::new(manifest("com.example.fast"), fast))
            .await
            .unwrap();

        let slow_host = Arc::clone(&host);
        let slow_call = tokio::spawn(async move {
            slow_host
                .dispatch("com.example.slow", Operation::Catalogue, json!({}))
                .await
        });

        // The fast extension answers while the slow handler is in flight.
        let outcome = host
            .dispatch("com.example.fast", Operation::Catalogue, json!({}))
            .await
            .unwrap();
        assert_eq!(outcome.into_value(), Some(json!("fast")));

        let slow_outcome = slow_call.await.unwrap().unwrap();
        assert_eq!(slow_outcome.into_value(), Some(json!("slow")));
    }

    #[tokio::test]
    async fn concurrent_loads_for_one_id_serialize() {
        let host = Arc::new(host());

        let make_module = || {
            ExtensionModule::new(
                manifest("com.example.a"),
                ExtensionHandlers::builder()
                    .initialize(|_cx| async {
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Ok(())
                    })
                    .build(),
            )
        };

        let h1 = Arc::clone(&host);
        let h2 = Arc::clone(&host);
        let m1 = make_module();
        let m2 = make_module();
        let (r1, r2) = tokio::join!(
            tokio::spawn(async move { h1.load(m1).await }),
            tokio::spawn(async move { h2.load(m2).await }),
        );
        r1.unwrap().unwrap();
        r2.unwrap().unwrap();

        // Both loads settled; exactly one registration remains.
        assert_eq!(host.extension_count().await, 1);
        assert!(host.is_loaded("com.example.a").await);
    }
}
