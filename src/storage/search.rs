//! Substring search over message content

use super::messages::message_from_row;
use super::{SearchHit, SqliteStorage};
use crate::error::{ParleyError, Result};
use rusqlite::params;

/// Escape LIKE wildcards so the query matches literally
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl SqliteStorage {
    /// Messages whose content contains `query`, newest first
    ///
    /// Matching is an unanchored substring test using SQLite's `LIKE`, which
    /// is case-insensitive for ASCII. Returns at most `page_size` hits and
    /// never pages further. An empty or whitespace-only query returns no
    /// results without touching the database.
    pub fn search(&self, query: &str, page_size: usize) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() || page_size == 0 {
            return Ok(Vec::new());
        }

        let limit = i64::try_from(page_size).unwrap_or(i64::MAX);
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(
                "SELECT m.id, m.session_id, m.role, m.content, m.model, m.created_at, n.name
                 FROM messages m
                 LEFT JOIN session_names n ON n.session_id = m.session_id
                 WHERE m.content LIKE ?1 ESCAPE '\\'
                 ORDER BY m.created_at DESC, m.id DESC
                 LIMIT ?2",
            )
            .map_err(|e| ParleyError::storage("Failed to prepare statement", e))?;

        let hits = stmt
            .query_map(params![like_pattern(query), limit], |row| {
                Ok(SearchHit {
                    message: message_from_row(row)?,
                    session_name: row.get(6)?,
                })
            })
            .map_err(|e| ParleyError::storage("Failed to search messages", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| ParleyError::storage("Failed to read search row", e))?;

        tracing::debug!(query, hits = hits.len(), "Searched messages");
        Ok(hits)
    }
}
