//! Conversation memory store backed by SQLite
//!
//! Two independent relations share the session identifier as their key:
//! `messages` (owned by the message store) and `session_names` (owned by the
//! session directory). There is no foreign key between them, so deleting a
//! session clears both explicitly.
//!
//! Every operation opens its own connection and finishes its own
//! transaction; nothing is cached between calls, so each read sees the
//! latest committed writes.

use crate::error::{ParleyError, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod directory;
mod messages;
mod search;
pub mod types;

pub use types::{MessageId, SearchHit, SessionSummary, StoredMessage, ROLE_ASSISTANT, ROLE_USER};

/// Environment variable that overrides the default database location
pub const HISTORY_DB_ENV: &str = "PARLEY_HISTORY_DB";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    model TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);
CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id, created_at, id);
CREATE INDEX IF NOT EXISTS idx_messages_content ON messages(content);
CREATE TABLE IF NOT EXISTS session_names (
    session_id TEXT PRIMARY KEY,
    name TEXT NOT NULL
);
";

/// Storage backend for conversation history
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    db_path: PathBuf,
}

impl SqliteStorage {
    /// Open the store at its default location
    ///
    /// Honors `PARLEY_HISTORY_DB`; otherwise uses `memory.db` in the user's
    /// data directory.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var(HISTORY_DB_ENV) {
            return Self::new_with_path(override_path);
        }
        Self::new_with_path(default_db_path()?)
    }

    /// Open the store at `db_path`, creating the file and schema if needed
    ///
    /// # Examples
    ///
    /// ```
    /// use parley::storage::SqliteStorage;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let storage = SqliteStorage::new_with_path(dir.path().join("memory.db")).unwrap();
    /// assert!(storage.db_path().exists());
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ParleyError::storage("Failed to create parent directory for database", e)
                })?;
            }
        }

        let storage = Self { db_path };
        storage.init()?;
        tracing::debug!(path = %storage.db_path.display(), "Opened message store");
        Ok(storage)
    }

    /// Location of the database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn init(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| ParleyError::storage("Failed to create tables", e))?;
        Ok(())
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)
            .map_err(|e| ParleyError::storage("Failed to open database", e))?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| ParleyError::storage("Failed to configure database", e))?;
        Ok(conn)
    }
}

/// Default database path inside the platform data directory
pub fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("dev", "parley", "parley").ok_or_else(|| {
        ParleyError::StorageUnavailable("Could not determine data directory".into())
    })?;
    Ok(proj_dirs.data_dir().join("memory.db"))
}

/// Fixed-width UTC timestamp; lexical order matches chronological order
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp, accepting both our format and SQLite's defaults
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Read a timestamp column, mapping parse failures to a conversion error
pub(crate) fn timestamp_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("invalid timestamp: {}", raw).into(),
        )
    })
}
