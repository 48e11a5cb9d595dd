//! Extension manifest model and structural validation.
//!
//! The manifest is the extension's self-declared identity. Validation is a
//! pure function that accumulates every violation instead of stopping at
//! the first; the route layer reports the complete list to whoever is
//! packaging the extension.

use crate::handlers::Operation;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Self-declared identity and metadata of one catalog extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionManifest {
    /// Globally unique, stable across versions (e.g. `com.weebcentral.manga`).
    pub id: String,
    pub name: String,
    /// `major.minor.patch`.
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Primary content language as a BCP-47 tag, if the source is
    /// language-specific.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub nsfw: bool,
    /// Operations the author declares supporting. Advisory; the registered
    /// handler set is authoritative at dispatch time.
    #[serde(default)]
    pub capabilities: Vec<Operation>,
    /// Key under which the extension publishes its settings schema, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_schema_ref: Option<String>,
}

impl ExtensionManifest {
    /// Minimal manifest with the three required fields.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            description: None,
            author: None,
            homepage: None,
            icon: None,
            language: None,
            nsfw: false,
            capabilities: Vec::new(),
            settings_schema_ref: None,
        }
    }
}

/// Checks a manifest's structure, returning `Err` with the ordered list of
/// every violation found. Never mutates its input.
pub fn validate_manifest(manifest: &ExtensionManifest) -> Result<(), Vec<String>> {
    let mut issues = Vec::new();

    if manifest.id.is_empty() {
        issues.push("missing required field: id".to_string());
    } else if !is_valid_id(&manifest.id) {
        issues.push(format!(
            "id '{}' contains invalid characters (allowed: ascii alphanumerics, '.', '-', '_')",
            manifest.id
        ));
    }

    if manifest.name.trim().is_empty() {
        issues.push("missing required field: name".to_string());
    }

    if manifest.version.is_empty() {
        issues.push("missing required field: version".to_string());
    } else if !is_semver(&manifest.version) {
        issues.push(format!(
            "version '{}' is not in major.minor.patch form",
            manifest.version
        ));
    }

    let mut seen = HashSet::new();
    for capability in &manifest.capabilities {
        if !seen.insert(*capability) {
            issues.push(format!("capability declared more than once: {capability}"));
        }
    }

    if issues.is_empty() { Ok(()) } else { Err(issues) }
}

fn is_valid_id(id: &str) -> bool {
    id.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// Three dot-separated numeric components. Pre-release suffixes are not
/// accepted; published extensions carry plain release versions.
fn is_semver(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}
