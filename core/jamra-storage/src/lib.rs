//! SQLite persistence layer for the Jamra catalog core.
//!
//! Owns the `catalog.sqlite` connection and the two stores built on it:
//! - [`SqliteCache`] — persisted extension cache (implements the
//!   `ExtensionCache` capability, survives restarts)
//! - [`SettingsStore`] — generic key→JSON settings repository
//!
//! Schema migrations are idempotent and run on open. The connection uses
//! WAL journaling with a busy timeout so point operations from concurrent
//! handler calls serialize inside SQLite instead of failing fast.

mod cache;
mod error;
mod settings;

pub use cache::SqliteCache;
pub use error::{StorageError, StorageResult};
pub use settings::SettingsStore;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const MIGRATIONS: &str = "
CREATE TABLE IF NOT EXISTS extension_cache (
    namespace  TEXT NOT NULL,
    cache_key  TEXT NOT NULL,
    value      TEXT NOT NULL,
    expires_at INTEGER,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (namespace, cache_key)
);
CREATE INDEX IF NOT EXISTS idx_extension_cache_expires_at
    ON extension_cache (expires_at);

CREATE TABLE IF NOT EXISTS app_settings (
    key        TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);
";

/// Shared handle to the catalog database.
///
/// Cloning is cheap; all clones point at the same connection. The persisted
/// cache and the settings store are views over one database file.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (creating if necessary) the catalog database at `path` and
    /// applies migrations.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Opens an in-memory database. Used by tests and as the fallback when
    /// the embedding host runs without a data directory.
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        // WAL for concurrent reads while writing; busy_timeout so point
        // operations from interleaved handler calls retry instead of
        // failing fast on a held lock.
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;
        conn.execute_batch(MIGRATIONS)
            .map_err(|e| StorageError::Migration(e.to_string()))?;
        debug!("catalog database opened, migrations applied");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| StorageError::LockPoisoned {
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}
