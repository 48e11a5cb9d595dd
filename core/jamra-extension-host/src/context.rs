//! Per-extension capability context and its factory.
//!
//! A context is built when an extension is registered and reused for its
//! whole registered lifetime. Contexts are never shared between extensions:
//! the cache view is namespaced by extension id and the logger is tagged
//! with it.

use crate::logger::ExtensionLogger;
use crate::manifest::ExtensionManifest;
use jamra_cache::{ExtensionCache, MemoryCache, ScopedCache};
use jamra_http::{HttpClient, HttpRequester};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Host platform reported to extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Macos,
    Linux,
    Android,
    Ios,
    Unknown,
}

impl Platform {
    /// Platform of the running host process.
    #[must_use]
    pub fn detect() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::Macos
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "android") {
            Self::Android
        } else if cfg!(target_os = "ios") {
            Self::Ios
        } else {
            Self::Unknown
        }
    }
}

/// Host platform and version as exposed to extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeInfo {
    pub platform: Platform,
    pub version: String,
}

impl RuntimeInfo {
    /// Detected platform and the host crate version.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            platform: Platform::detect(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Sentinel values for embeddings without platform introspection.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            platform: Platform::Unknown,
            version: "0.0.0".to_string(),
        }
    }
}

/// Capability bundle injected into an extension's handlers.
pub struct ExtensionContext {
    pub logger: ExtensionLogger,
    /// Cache view namespaced by this extension's id.
    pub cache: ScopedCache,
    pub http: Arc<dyn HttpRequester>,
    /// Extension-scoped settings, resolved by the embedding host. Opaque
    /// here; schema enforcement is the extension's `getSettingsSchema`
    /// contract with the UI.
    pub settings: HashMap<String, Value>,
    pub runtime: RuntimeInfo,
}

impl ExtensionContext {
    /// Convenience accessor for one settings value.
    #[must_use]
    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }
}

impl fmt::Debug for ExtensionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionContext")
            .field("extension_id", &self.logger.extension_id())
            .field("settings", &self.settings)
            .field("runtime", &self.runtime)
            .finish_non_exhaustive()
    }
}

/// Inputs to [`create_context`]. Every field is optional; unset fields get
/// host defaults.
#[derive(Default)]
pub struct ContextOptions {
    /// Reused as-is when supplied; a host logger is never wrapped twice.
    pub logger: Option<ExtensionLogger>,
    /// Shared cache backend; the factory scopes it to the extension id.
    pub cache: Option<Arc<dyn ExtensionCache>>,
    pub http: Option<Arc<dyn HttpRequester>>,
    pub settings: Option<HashMap<String, Value>>,
    pub runtime: Option<RuntimeInfo>,
}

impl ContextOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn logger(mut self, logger: ExtensionLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn ExtensionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn http(mut self, http: Arc<dyn HttpRequester>) -> Self {
        self.http = Some(http);
        self
    }

    #[must_use]
    pub fn settings(mut self, settings: HashMap<String, Value>) -> Self {
        self.settings = Some(settings);
        self
    }

    #[must_use]
    pub fn runtime(mut self, runtime: RuntimeInfo) -> Self {
        self.runtime = Some(runtime);
        self
    }
}

/// Builds the capability bundle for one extension.
///
/// Caller-supplied capabilities are used as-is; missing ones get defaults:
/// a logger tagged with the manifest id, an in-memory cache scoped to the
/// manifest id, the host HTTP client, empty settings, and detected runtime
/// info. Platform detection cannot fail; only default HTTP client
/// construction is fallible.
pub fn create_context(
    manifest: &ExtensionManifest,
    options: ContextOptions,
) -> Result<ExtensionContext, jamra_http::HttpError> {
    let logger = options
        .logger
        .unwrap_or_else(|| ExtensionLogger::new(&manifest.id));

    let backend: Arc<dyn ExtensionCache> = match options.cache {
        Some(backend) => backend,
        None => Arc::new(MemoryCache::new()),
    };
    let cache = ScopedCache::new(backend, &manifest.id);

    let http: Arc<dyn HttpRequester> = match options.http {
        Some(http) => http,
        None => Arc::new(HttpClient::new()?),
    };

    Ok(ExtensionContext {
        logger,
        cache,
        http,
        settings: options.settings.unwrap_or_default(),
        runtime: options.runtime.unwrap_or_else(RuntimeInfo::detect),
    })
}
