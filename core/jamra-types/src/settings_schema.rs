//! Settings schema declarations.
//!
//! Extensions that expose user-configurable settings describe them with a
//! [`SettingsSchema`] from their `get_settings_schema` handler. The host does
//! not enforce the schema; it only relays it to the UI, and stored values
//! stay opaque JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared settings surface of one extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSchema {
    #[serde(default)]
    pub fields: Vec<SettingsField>,
}

/// A single declared setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsField {
    pub key: String,
    pub label: String,
    pub kind: SettingsFieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Input widget the UI should render for a setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum SettingsFieldKind {
    Text,
    Toggle,
    Number,
    /// Fixed choice list; `options` are `(value, label)` pairs.
    Select { options: Vec<(String, String)> },
}
