//! Generic key→JSON settings repository.
//!
//! Backs app-level settings (active extension id, reader preferences, …) and
//! the persisted side of extension settings resolution. Values are opaque
//! JSON; schema enforcement belongs to whoever declared the setting.

use crate::{Database, StorageResult};
use jamra_types::timestamp_ms;
use rusqlite::{OptionalExtension, params};
use serde_json::Value;

/// Key→JSON store over the `app_settings` table with cache-identical
/// upsert semantics.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    db: Database,
}

impl SettingsStore {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns the stored value for `key`, or `None` if unset.
    pub fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        let conn = self.db.lock()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM app_settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|s| serde_json::from_str(&s).map_err(Into::into))
            .transpose()
    }

    /// Upserts `key`, overwriting any previous value.
    pub fn set(&self, key: &str, value: &Value) -> StorageResult<()> {
        let raw = serde_json::to_string(value)?;
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO app_settings (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, raw, timestamp_ms()],
        )?;
        Ok(())
    }

    /// Removes `key`. Deleting an absent key is not an error.
    pub fn delete(&self, key: &str) -> StorageResult<()> {
        let conn = self.db.lock()?;
        conn.execute("DELETE FROM app_settings WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// All stored settings as `(key, value)` pairs, ordered by key.
    pub fn entries(&self) -> StorageResult<Vec<(String, Value)>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare("SELECT key, value FROM app_settings ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (key, raw) = row?;
            entries.push((key, serde_json::from_str(&raw)?));
        }
        Ok(entries)
    }
}
