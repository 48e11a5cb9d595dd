//! Error types for the extension host.

use crate::handlers::Operation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtensionHostError {
    /// The declared manifest failed structural checks. Carries every
    /// violation found, not just the first, so callers can report
    /// actionable errors. The extension was not registered.
    #[error("manifest validation failed for '{}': {}", .id.as_deref().unwrap_or("<no id>"), .issues.join("; "))]
    ManifestValidation {
        /// The manifest's declared id, if it declared one.
        id: Option<String>,
        issues: Vec<String>,
    },

    /// The manifest was valid but the extension's initialize handler
    /// failed. The extension was not registered.
    #[error("extension '{id}' failed to initialize")]
    LoadFailed {
        id: String,
        #[source]
        cause: anyhow::Error,
    },

    #[error("extension not found: {0}")]
    ExtensionNotFound(String),

    #[error("no active extension")]
    NoActiveExtension,

    /// A dispatched handler rejected. Distinct from
    /// `DispatchOutcome::Unsupported`, which is a normal negative result.
    #[error("handler '{operation}' failed for extension '{id}'")]
    HandlerFailed {
        id: String,
        operation: Operation,
        #[source]
        cause: anyhow::Error,
    },

    /// Default capability construction failed while building a context.
    #[error("capability construction failed")]
    Capability(#[from] jamra_http::HttpError),
}
