//! Catalog payload types exchanged with extensions.
//!
//! These mirror the JSON contract between the host and extension handlers.
//! The dispatch boundary itself carries `serde_json::Value`; these types are
//! the vocabulary both sides serialize through, so the host and the route
//! layer agree on field names without the host interpreting source semantics.

use serde::{Deserialize, Serialize};

/// Publication status of a manga as reported by its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MangaStatus {
    Ongoing,
    Completed,
    Hiatus,
    Cancelled,
    Unknown,
}

impl Default for MangaStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

impl std::str::FromStr for MangaStatus {
    type Err = crate::Error;

    /// Accepts the loose spellings sources actually publish.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ongoing" | "releasing" | "publishing" => Ok(Self::Ongoing),
            "completed" | "finished" | "complete" => Ok(Self::Completed),
            "hiatus" | "on hiatus" => Ok(Self::Hiatus),
            "cancelled" | "canceled" | "dropped" => Ok(Self::Cancelled),
            "unknown" | "" => Ok(Self::Unknown),
            other => Err(crate::Error::InvalidPayload(format!(
                "unrecognized manga status: {other}"
            ))),
        }
    }
}

/// Compact manga record as shown in catalogue grids and search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaSummary {
    /// Source-scoped manga identifier, stable across requests.
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

/// Full manga record returned by `fetch_manga_details`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manga {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub status: MangaStatus,
}

/// A single chapter entry returned by `fetch_chapters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    /// Chapter ordinal as published by the source. Fractional numbers
    /// (e.g. 10.5 extras) are common, so this is not an integer.
    pub number: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Publication instant in milliseconds since the Unix epoch, if the
    /// source exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<u64>,
}

/// Ordered page image URLs for one chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterPages {
    pub chapter_id: String,
    pub pages: Vec<String>,
}

/// One page of a catalogue listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CataloguePage {
    pub items: Vec<MangaSummary>,
    /// Whether the source reports further pages after this one.
    pub has_more: bool,
}

/// Request payload for the `catalogue` operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueRequest {
    /// 1-based page index.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Selected filter option ids, keyed by filter group id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<(String, String)>,
}

fn default_page() -> u32 {
    1
}

impl Default for CatalogueRequest {
    fn default() -> Self {
        Self {
            page: 1,
            filters: Vec::new(),
        }
    }
}

/// Request payload for the `search` operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_page")]
    pub page: u32,
}

/// A filter group an extension exposes for catalogue browsing
/// (e.g. "Genre" with one option per genre).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterGroup {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub multi_select: bool,
    pub options: Vec<FilterOption>,
}

/// A selectable option within a [`FilterGroup`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOption {
    pub id: String,
    pub label: String,
}
