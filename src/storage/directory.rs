//! Session directory: display names and session enumeration

use super::{timestamp_column, SessionSummary, SqliteStorage};
use crate::error::{ParleyError, Result};
use rusqlite::{params, OptionalExtension};

impl SqliteStorage {
    /// Display name of a session, if one was assigned
    pub fn get_name(&self, session_id: &str) -> Result<Option<String>> {
        let conn = self.open()?;
        conn.query_row(
            "SELECT name FROM session_names WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| ParleyError::storage("Failed to query session name", e).into())
    }

    /// Assign a display name, replacing any previous one
    pub fn set_name(&self, session_id: &str, name: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO session_names (session_id, name) VALUES (?1, ?2)
             ON CONFLICT(session_id) DO UPDATE SET name = excluded.name",
            params![session_id, name],
        )
        .map_err(|e| ParleyError::storage("Failed to save session name", e))?;
        tracing::debug!(session_id, name, "Renamed session");
        Ok(())
    }

    /// Remove a display name; a no-op when none is set
    pub fn delete_name(&self, session_id: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "DELETE FROM session_names WHERE session_id = ?1",
            params![session_id],
        )
        .map_err(|e| ParleyError::storage("Failed to delete session name", e))?;
        Ok(())
    }

    /// Sessions with at least one message, most recently active first
    ///
    /// A name entry without messages does not make a session listable.
    pub fn list_sessions(&self, limit: usize) -> Result<Vec<SessionSummary>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(
                "SELECT m.session_id,
                        MAX(m.created_at),
                        COUNT(*),
                        SUM(LENGTH(CAST(m.content AS BLOB)) + LENGTH(CAST(m.role AS BLOB))
                            + LENGTH(CAST(m.model AS BLOB)) + LENGTH(CAST(m.session_id AS BLOB))),
                        n.name
                 FROM messages m
                 LEFT JOIN session_names n ON n.session_id = m.session_id
                 GROUP BY m.session_id
                 ORDER BY MAX(m.created_at) DESC, MAX(m.id) DESC
                 LIMIT ?1",
            )
            .map_err(|e| ParleyError::storage("Failed to prepare statement", e))?;

        let sessions = stmt
            .query_map(params![limit], |row| {
                let count: i64 = row.get(2)?;
                let size: i64 = row.get(3)?;
                Ok(SessionSummary {
                    session_id: row.get(0)?,
                    last_activity: timestamp_column(row, 1)?,
                    message_count: usize::try_from(count).unwrap_or(0),
                    size_bytes: u64::try_from(size).unwrap_or(0),
                    name: row.get(4)?,
                })
            })
            .map_err(|e| ParleyError::storage("Failed to query sessions", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| ParleyError::storage("Failed to read session row", e))?;
        Ok(sessions)
    }

    /// Resolve a full session id or a unique id prefix
    ///
    /// # Errors
    ///
    /// * `ParleyError::InvalidInput` for an empty or ambiguous prefix
    /// * `ParleyError::NotFound` when no stored session matches
    pub fn resolve_session(&self, id_or_prefix: &str) -> Result<String> {
        let needle = id_or_prefix.trim();
        if needle.is_empty() {
            return Err(ParleyError::InvalidInput("Session id must not be empty".into()).into());
        }

        let conn = self.open()?;
        let mut stmt = conn
            .prepare(
                "SELECT session_id FROM messages
                 WHERE substr(session_id, 1, length(?1)) = ?1
                 GROUP BY session_id
                 ORDER BY session_id = ?1 DESC
                 LIMIT 2",
            )
            .map_err(|e| ParleyError::storage("Failed to prepare statement", e))?;
        let matches = stmt
            .query_map(params![needle], |row| row.get::<_, String>(0))
            .map_err(|e| ParleyError::storage("Failed to resolve session", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| ParleyError::storage("Failed to read session row", e))?;

        match matches.as_slice() {
            [] => Err(ParleyError::NotFound(format!("No session matches '{}'", needle)).into()),
            [exact, ..] if exact == needle => Ok(exact.clone()),
            [only] => Ok(only.clone()),
            _ => Err(ParleyError::InvalidInput(format!(
                "'{}' matches more than one session; use a longer prefix",
                needle
            ))
            .into()),
        }
    }
}
