//! Core catalog type definitions for Jamra.
//!
//! This crate defines the extension-agnostic vocabulary shared by the
//! extension host and the route layer:
//! - Manga, chapter, and page records as returned by catalog sources
//! - Catalogue browse / search request and response payloads
//! - Filter and settings-schema definitions extensions may declare
//! - Millisecond epoch timestamps used for every persisted instant
//!
//! Source-specific behavior (how a catalogue page is scraped, which filters
//! exist) belongs to the individual extensions, not here.

mod catalog;
mod settings_schema;

pub use catalog::{
    CataloguePage, CatalogueRequest, Chapter, ChapterPages, FilterGroup, FilterOption, Manga,
    MangaStatus, MangaSummary, SearchRequest,
};
pub use settings_schema::{SettingsField, SettingsFieldKind, SettingsSchema};

use std::time::{SystemTime, UNIX_EPOCH};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// Current wall-clock time as milliseconds since the Unix epoch.
///
/// Every persisted instant in the catalog database (`expires_at`,
/// `updated_at`, …) uses this representation.
#[must_use]
pub fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before Unix epoch")
        .as_millis() as u64
}
