//! Message store: append-only log of role-tagged messages keyed by session

use super::{format_timestamp, timestamp_column, MessageId, SqliteStorage, StoredMessage};
use super::{ROLE_ASSISTANT, ROLE_USER};
use crate::error::{ParleyError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) const MESSAGE_COLUMNS: &str = "id, session_id, role, content, model, created_at";

pub(super) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<StoredMessage> {
    Ok(StoredMessage {
        id: row.get(0)?,
        session_id: row.get(1)?,
        role: row.get(2)?,
        content: row.get(3)?,
        model: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
    })
}

/// Insert one row, never stamping it earlier than the session's newest row
///
/// Clamping keeps (timestamp, id) order identical to insertion order even if
/// the wall clock steps backwards between writes.
fn insert_message(
    conn: &Connection,
    session_id: &str,
    role: &str,
    content: &str,
    model: &str,
    now: DateTime<Utc>,
) -> rusqlite::Result<MessageId> {
    let now = format_timestamp(&now);
    let latest: Option<String> = conn
        .query_row(
            "SELECT MAX(created_at) FROM messages WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )
        .optional()?
        .flatten();
    let created_at = match latest {
        Some(latest) if latest > now => latest,
        _ => now,
    };

    conn.execute(
        "INSERT INTO messages (session_id, role, content, model, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![session_id, role, content, model, created_at],
    )?;
    Ok(conn.last_insert_rowid())
}

impl SqliteStorage {
    /// Append a message to a session's log
    ///
    /// The session comes into existence with its first message. Content size
    /// and role value are never validated.
    ///
    /// # Errors
    ///
    /// Returns `ParleyError::StorageUnavailable` if the database cannot be
    /// opened or written.
    pub fn append(&self, session_id: &str, role: &str, content: &str, model: &str) -> Result<MessageId> {
        self.append_at(session_id, role, content, model, Utc::now())
    }

    pub(crate) fn append_at(
        &self,
        session_id: &str,
        role: &str,
        content: &str,
        model: &str,
        now: DateTime<Utc>,
    ) -> Result<MessageId> {
        let mut conn = self.open()?;
        let tx = conn
            .transaction()
            .map_err(|e| ParleyError::storage("Failed to start transaction", e))?;
        let id = insert_message(&tx, session_id, role, content, model, now)
            .map_err(|e| ParleyError::storage("Failed to insert message", e))?;
        tx.commit()
            .map_err(|e| ParleyError::storage("Failed to commit message", e))?;

        tracing::debug!(session_id, role, message_id = id, bytes = content.len(), "Appended message");
        Ok(id)
    }

    /// Persist both halves of a completed turn in a single transaction
    ///
    /// The user row carries an empty model id; the assistant row carries
    /// `model`. Either both rows are written or neither is.
    pub fn append_turn(
        &self,
        session_id: &str,
        user_content: &str,
        assistant_content: &str,
        model: &str,
    ) -> Result<(MessageId, MessageId)> {
        let now = Utc::now();
        let mut conn = self.open()?;
        let tx = conn
            .transaction()
            .map_err(|e| ParleyError::storage("Failed to start transaction", e))?;
        let user_id = insert_message(&tx, session_id, ROLE_USER, user_content, "", now)
            .map_err(|e| ParleyError::storage("Failed to insert user message", e))?;
        let assistant_id = insert_message(&tx, session_id, ROLE_ASSISTANT, assistant_content, model, now)
            .map_err(|e| ParleyError::storage("Failed to insert assistant message", e))?;
        tx.commit()
            .map_err(|e| ParleyError::storage("Failed to commit turn", e))?;

        tracing::debug!(session_id, user_id, assistant_id, "Persisted turn");
        Ok((user_id, assistant_id))
    }

    /// The most recent `pair_limit` exchanges, oldest first
    ///
    /// Fetches up to `2 * pair_limit` raw rows regardless of role
    /// alternation, so a trailing unanswered user turn is included as-is.
    pub fn read_recent(&self, session_id: &str, pair_limit: usize) -> Result<Vec<StoredMessage>> {
        let row_limit = i64::try_from(pair_limit.saturating_mul(2)).unwrap_or(i64::MAX);
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM messages
                 WHERE session_id = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2",
                MESSAGE_COLUMNS
            ))
            .map_err(|e| ParleyError::storage("Failed to prepare statement", e))?;

        let mut rows = stmt
            .query_map(params![session_id, row_limit], message_from_row)
            .map_err(|e| ParleyError::storage("Failed to query recent messages", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| ParleyError::storage("Failed to read message row", e))?;

        rows.reverse();
        Ok(rows)
    }

    /// Every message of a session, oldest first
    pub fn read_all(&self, session_id: &str) -> Result<Vec<StoredMessage>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM messages
                 WHERE session_id = ?1
                 ORDER BY created_at ASC, id ASC",
                MESSAGE_COLUMNS
            ))
            .map_err(|e| ParleyError::storage("Failed to prepare statement", e))?;

        let rows = stmt
            .query_map(params![session_id], message_from_row)
            .map_err(|e| ParleyError::storage("Failed to query messages", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| ParleyError::storage("Failed to read message row", e))?;
        Ok(rows)
    }

    /// Remove every message row of a session; returns how many were removed
    ///
    /// Deleting a session that has no rows is a no-op.
    pub fn delete_messages(&self, session_id: &str) -> Result<usize> {
        let conn = self.open()?;
        let removed = conn
            .execute("DELETE FROM messages WHERE session_id = ?1", params![session_id])
            .map_err(|e| ParleyError::storage("Failed to delete messages", e))?;
        Ok(removed)
    }

    /// Remove a session entirely: its messages and its name, atomically
    ///
    /// Idempotent; returns the number of message rows removed.
    pub fn delete_session(&self, session_id: &str) -> Result<usize> {
        let mut conn = self.open()?;
        let tx = conn
            .transaction()
            .map_err(|e| ParleyError::storage("Failed to start transaction", e))?;
        let removed = tx
            .execute("DELETE FROM messages WHERE session_id = ?1", params![session_id])
            .map_err(|e| ParleyError::storage("Failed to delete messages", e))?;
        tx.execute("DELETE FROM session_names WHERE session_id = ?1", params![session_id])
            .map_err(|e| ParleyError::storage("Failed to delete session name", e))?;
        tx.commit()
            .map_err(|e| ParleyError::storage("Failed to commit delete", e))?;

        tracing::info!(session_id, removed, "Deleted session");
        Ok(removed)
    }

    /// Approximate footprint: byte lengths of content, role, model and
    /// session id summed over the session's rows; 0 for an empty session
    pub fn size_of(&self, session_id: &str) -> Result<u64> {
        let conn = self.open()?;
        let total: i64 = conn
            .query_row(
                "SELECT COALESCE(SUM(
                    LENGTH(CAST(content AS BLOB)) + LENGTH(CAST(role AS BLOB))
                    + LENGTH(CAST(model AS BLOB)) + LENGTH(CAST(session_id AS BLOB))
                 ), 0)
                 FROM messages WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .map_err(|e| ParleyError::storage("Failed to compute session size", e))?;
        Ok(u64::try_from(total).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::create_test_storage;
    use super::*;
    use chrono::Duration;

    fn ids(messages: &[StoredMessage]) -> Vec<MessageId> {
        messages.iter().map(|m| m.id).collect()
    }

    #[test]
    fn test_append_assigns_increasing_ids() {
        let (storage, _dir) = create_test_storage();
        let a = storage.append("s1", ROLE_USER, "hi", "").unwrap();
        let b = storage.append("s1", ROLE_ASSISTANT, "hello", "llama3").unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_append_accepts_any_role_and_large_content() {
        let (storage, _dir) = create_test_storage();
        let big = "x".repeat(1_000_000);
        storage.append("s1", "system", &big, "").unwrap();
        let all = storage.read_all("s1").unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].role, "system");
        assert_eq!(all[0].content.len(), 1_000_000);
    }

    #[test]
    fn test_content_preserved_byte_for_byte() {
        let (storage, _dir) = create_test_storage();
        let content = "```rust\nfn main() {}\n```\n\n  trailing  \t\n🦀 ünïcode";
        storage.append("s1", ROLE_ASSISTANT, content, "m").unwrap();
        assert_eq!(storage.read_all("s1").unwrap()[0].content, content);
    }

    #[test]
    fn test_colliding_timestamps_keep_insertion_order() {
        let (storage, _dir) = create_test_storage();
        let now = Utc::now();
        let first = storage.append_at("s1", ROLE_USER, "one", "", now).unwrap();
        let second = storage.append_at("s1", ROLE_ASSISTANT, "two", "m", now).unwrap();
        let third = storage.append_at("s1", ROLE_USER, "three", "", now).unwrap();

        let all = storage.read_all("s1").unwrap();
        assert_eq!(ids(&all), vec![first, second, third]);
        let recent = storage.read_recent("s1", 1).unwrap();
        assert_eq!(ids(&recent), vec![second, third]);
    }

    #[test]
    fn test_clock_stepping_backwards_never_reorders() {
        let (storage, _dir) = create_test_storage();
        let now = Utc::now();
        let first = storage.append_at("s1", ROLE_USER, "one", "", now).unwrap();
        let second = storage
            .append_at("s1", ROLE_ASSISTANT, "two", "m", now - Duration::seconds(30))
            .unwrap();

        let all = storage.read_all("s1").unwrap();
        assert_eq!(ids(&all), vec![first, second]);
        assert!(all[0].created_at <= all[1].created_at);
    }

    #[test]
    fn test_read_recent_returns_chronological_suffix() {
        let (storage, _dir) = create_test_storage();
        for i in 0..7 {
            storage.append("s1", ROLE_USER, &format!("m{}", i), "").unwrap();
        }
        let all = storage.read_all("s1").unwrap();

        for k in 0..6 {
            let recent = storage.read_recent("s1", k).unwrap();
            assert_eq!(recent.len(), (2 * k).min(all.len()));
            assert_eq!(recent.as_slice(), &all[all.len() - recent.len()..]);
        }
    }

    #[test]
    fn test_read_recent_includes_trailing_unanswered_turn() {
        let (storage, _dir) = create_test_storage();
        storage.append_turn("s1", "q1", "a1", "m").unwrap();
        storage.append("s1", ROLE_USER, "q2 (no answer)", "").unwrap();

        let recent = storage.read_recent("s1", 1).unwrap();
        let contents: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["a1", "q2 (no answer)"]);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let (storage, _dir) = create_test_storage();
        storage.append("a", ROLE_USER, "for a", "").unwrap();
        storage.append("b", ROLE_USER, "for b", "").unwrap();
        assert_eq!(storage.read_all("a").unwrap().len(), 1);
        assert_eq!(storage.read_all("b").unwrap()[0].content, "for b");
    }

    #[test]
    fn test_append_turn_writes_both_rows_with_models() {
        let (storage, _dir) = create_test_storage();
        let (u, a) = storage.append_turn("s1", "hi", "hello", "llama3").unwrap();
        assert!(a > u);

        let all = storage.read_all("s1").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!((all[0].role.as_str(), all[0].model.as_str()), (ROLE_USER, ""));
        assert_eq!((all[1].role.as_str(), all[1].model.as_str()), (ROLE_ASSISTANT, "llama3"));
    }

    #[test]
    fn test_delete_session_removes_messages_and_name() {
        let (storage, _dir) = create_test_storage();
        storage.append_turn("s1", "hi", "hello", "m").unwrap();
        storage.set_name("s1", "Greeting").unwrap();
        storage.append("s2", ROLE_USER, "other", "").unwrap();

        assert_eq!(storage.delete_session("s1").unwrap(), 2);
        assert!(storage.read_all("s1").unwrap().is_empty());
        assert!(storage.read_recent("s1", 5).unwrap().is_empty());
        assert!(storage.get_name("s1").unwrap().is_none());
        assert_eq!(storage.read_all("s2").unwrap().len(), 1);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (storage, _dir) = create_test_storage();
        assert_eq!(storage.delete_session("missing").unwrap(), 0);
        assert_eq!(storage.delete_messages("missing").unwrap(), 0);
    }

    #[test]
    fn test_size_of_counts_bytes_and_grows() {
        let (storage, _dir) = create_test_storage();
        assert_eq!(storage.size_of("s1").unwrap(), 0);

        storage.append("s1", ROLE_USER, "hé", "").unwrap();
        // "hé" is 3 bytes, "user" 4, "" 0, "s1" 2
        assert_eq!(storage.size_of("s1").unwrap(), 9);

        let before = storage.size_of("s1").unwrap();
        storage.append("s1", ROLE_ASSISTANT, "", "").unwrap();
        assert!(storage.size_of("s1").unwrap() > before);
    }
}
