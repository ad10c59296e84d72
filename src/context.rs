//! Context assembly
//!
//! Rebuilds the bounded conversational context sent with each new turn: the
//! most recent `window` exchange pairs of a session in chronological order,
//! followed by the new user message. The window counts pairs, not tokens;
//! long messages are passed through untruncated.

use crate::error::Result;
use crate::providers::Message;
use crate::storage::SqliteStorage;

/// Build the message list for a new user turn
///
/// Reads only; nothing is persisted.
///
/// # Examples
///
/// ```
/// use parley::context::build_context;
/// use parley::storage::SqliteStorage;
///
/// let dir = tempfile::tempdir().unwrap();
/// let storage = SqliteStorage::new_with_path(dir.path().join("m.db")).unwrap();
/// storage.append_turn("s1", "hi", "hello", "llama3").unwrap();
///
/// let context = build_context(&storage, "s1", "how are you?", 5).unwrap();
/// assert_eq!(context.len(), 3);
/// assert_eq!(context[2].content, "how are you?");
/// ```
pub fn build_context(
    storage: &SqliteStorage,
    session_id: &str,
    new_user_content: &str,
    window: usize,
) -> Result<Vec<Message>> {
    let mut messages: Vec<Message> = storage
        .read_recent(session_id, window)?
        .into_iter()
        .map(|m| Message::new(m.role, m.content))
        .collect();

    messages.push(Message::user(new_user_content));

    tracing::debug!(session_id, prior = messages.len() - 1, window, "Assembled context");
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ROLE_ASSISTANT, ROLE_USER};
    use tempfile::TempDir;

    fn storage() -> (SqliteStorage, TempDir) {
        let dir = TempDir::new().unwrap();
        let storage = SqliteStorage::new_with_path(dir.path().join("m.db")).unwrap();
        (storage, dir)
    }

    #[test]
    fn test_empty_session_yields_only_new_message() {
        let (storage, _dir) = storage();
        let context = build_context(&storage, "fresh", "hello", 5).unwrap();
        assert_eq!(context, vec![Message::user("hello")]);
    }

    #[test]
    fn test_window_keeps_most_recent_pairs_in_order() {
        let (storage, _dir) = storage();
        for i in 0..4 {
            storage
                .append_turn("s1", &format!("q{}", i), &format!("a{}", i), "m")
                .unwrap();
        }

        let context = build_context(&storage, "s1", "q4", 2).unwrap();
        let contents: Vec<_> = context.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["q2", "a2", "q3", "a3", "q4"]);
        let roles: Vec<_> = context.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(
            roles,
            vec![ROLE_USER, ROLE_ASSISTANT, ROLE_USER, ROLE_ASSISTANT, ROLE_USER]
        );
    }

    #[test]
    fn test_odd_row_count_passes_through_raw_rows() {
        let (storage, _dir) = storage();
        storage.append_turn("s1", "q0", "a0", "m").unwrap();
        storage.append("s1", ROLE_USER, "unanswered", "").unwrap();

        let context = build_context(&storage, "s1", "retry", 1).unwrap();
        let contents: Vec<_> = context.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["a0", "unanswered", "retry"]);
    }

    #[test]
    fn test_build_context_does_not_persist() {
        let (storage, _dir) = storage();
        build_context(&storage, "s1", "hello", 5).unwrap();
        assert!(storage.read_all("s1").unwrap().is_empty());
    }
}
