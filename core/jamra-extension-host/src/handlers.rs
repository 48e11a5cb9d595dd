//! Extension handler sets and the operations they serve.
//!
//! An extension is a sparse set of optional async operations discovered once
//! at registration; "handler present" is an explicit field check, never
//! per-call reflection. Payloads cross the dispatch boundary as
//! `serde_json::Value`; the typed vocabulary lives in `jamra-types`.

use crate::context::ExtensionContext;
use crate::manifest::ExtensionManifest;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Catalog operations an extension may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    GetFilters,
    GetSettingsSchema,
    Catalogue,
    FetchMangaDetails,
    FetchChapters,
    FetchChapterPages,
    Search,
}

impl Operation {
    /// All operations, in dispatch-contract order.
    pub const ALL: [Operation; 7] = [
        Self::GetFilters,
        Self::GetSettingsSchema,
        Self::Catalogue,
        Self::FetchMangaDetails,
        Self::FetchChapters,
        Self::FetchChapterPages,
        Self::Search,
    ];

    /// Wire name used by the route layer (matches the serde representation).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetFilters => "getFilters",
            Self::GetSettingsSchema => "getSettingsSchema",
            Self::Catalogue => "catalogue",
            Self::FetchMangaDetails => "fetchMangaDetails",
            Self::FetchChapters => "fetchChapters",
            Self::FetchChapterPages => "fetchChapterPages",
            Self::Search => "search",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type BoxedOperationFuture = Pin<Box<dyn Future<Output = anyhow::Result<Value>> + Send>>;
type BoxedLifecycleFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

pub(crate) type OperationFn =
    Arc<dyn Fn(Arc<ExtensionContext>, Value) -> BoxedOperationFuture + Send + Sync>;
pub(crate) type LifecycleFn =
    Arc<dyn Fn(Arc<ExtensionContext>) -> BoxedLifecycleFuture + Send + Sync>;

/// Sparse set of async handlers registered by one extension.
///
/// Built once via [`ExtensionHandlers::builder`]; the host never re-probes
/// it after registration.
#[derive(Default, Clone)]
pub struct ExtensionHandlers {
    pub(crate) initialize: Option<LifecycleFn>,
    pub(crate) shutdown: Option<LifecycleFn>,
    pub(crate) operations: HashMap<Operation, OperationFn>,
}

impl ExtensionHandlers {
    #[must_use]
    pub fn builder() -> ExtensionHandlersBuilder {
        ExtensionHandlersBuilder::default()
    }

    #[must_use]
    pub fn supports(&self, operation: Operation) -> bool {
        self.operations.contains_key(&operation)
    }

    /// Implemented operations in dispatch-contract order.
    #[must_use]
    pub fn supported_operations(&self) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| self.supports(*op))
            .collect()
    }

    pub(crate) fn operation(&self, operation: Operation) -> Option<OperationFn> {
        self.operations.get(&operation).cloned()
    }
}

impl fmt::Debug for ExtensionHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionHandlers")
            .field("initialize", &self.initialize.is_some())
            .field("shutdown", &self.shutdown.is_some())
            .field("operations", &self.supported_operations())
            .finish()
    }
}

/// Builder over [`ExtensionHandlers`]. Handlers are plain `async` closures;
/// boxing happens here so extension authors never spell out future types.
#[derive(Default)]
pub struct ExtensionHandlersBuilder {
    handlers: ExtensionHandlers,
}

impl ExtensionHandlersBuilder {
    #[must_use]
    pub fn initialize<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Arc<ExtensionContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let boxed: LifecycleFn = Arc::new(move |cx| Box::pin(handler(cx)));
        self.handlers.initialize = Some(boxed);
        self
    }

    #[must_use]
    pub fn shutdown<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Arc<ExtensionContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let boxed: LifecycleFn = Arc::new(move |cx| Box::pin(handler(cx)));
        self.handlers.shutdown = Some(boxed);
        self
    }

    /// Registers `handler` for `operation`, replacing any previous one.
    #[must_use]
    pub fn operation<F, Fut>(mut self, operation: Operation, handler: F) -> Self
    where
        F: Fn(Arc<ExtensionContext>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        let boxed: OperationFn = Arc::new(move |cx, req| Box::pin(handler(cx, req)));
        self.handlers.operations.insert(operation, boxed);
        self
    }

    #[must_use]
    pub fn catalogue<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<ExtensionContext>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.operation(Operation::Catalogue, handler)
    }

    #[must_use]
    pub fn search<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<ExtensionContext>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.operation(Operation::Search, handler)
    }

    #[must_use]
    pub fn get_filters<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<ExtensionContext>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.operation(Operation::GetFilters, handler)
    }

    #[must_use]
    pub fn get_settings_schema<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<ExtensionContext>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.operation(Operation::GetSettingsSchema, handler)
    }

    #[must_use]
    pub fn fetch_manga_details<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<ExtensionContext>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.operation(Operation::FetchMangaDetails, handler)
    }

    #[must_use]
    pub fn fetch_chapters<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<ExtensionContext>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.operation(Operation::FetchChapters, handler)
    }

    #[must_use]
    pub fn fetch_chapter_pages<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<ExtensionContext>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.operation(Operation::FetchChapterPages, handler)
    }

    #[must_use]
    pub fn build(self) -> ExtensionHandlers {
        self.handlers
    }
}

/// One loadable extension: a manifest paired with its handler set.
#[derive(Debug, Clone)]
pub struct ExtensionModule {
    pub manifest: ExtensionManifest,
    pub handlers: ExtensionHandlers,
}

impl ExtensionModule {
    #[must_use]
    pub fn new(manifest: ExtensionManifest, handlers: ExtensionHandlers) -> Self {
        Self { manifest, handlers }
    }
}
