//! Extension runtime for Jamra.
//!
//! Loads third-party catalog extensions, validates their declared manifest,
//! builds the per-extension capability context (logger, cache, http,
//! settings, runtime info), and dispatches handler invocations under a
//! uniform async contract.
//!
//! Each extension is registered under its manifest id; the host owns the
//! registered instance exclusively for as long as it stays registered.
//! Process-level sandboxing of extension code is the embedding host's
//! responsibility, not this crate's.

mod context;
mod error;
mod handlers;
mod host;
mod logger;
mod manifest;

pub use context::{ContextOptions, ExtensionContext, Platform, RuntimeInfo, create_context};
pub use error::ExtensionHostError;
pub use handlers::{
    ExtensionHandlers, ExtensionHandlersBuilder, ExtensionModule, Operation,
};
pub use host::{DispatchOutcome, ExtensionHost, ExtensionStatus};
pub use logger::ExtensionLogger;
pub use manifest::{ExtensionManifest, validate_manifest};
