use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row id assigned by the message store
pub type MessageId = i64;

/// Role of a user-authored message
pub const ROLE_USER: &str = "user";

/// Role of a model-authored message
pub const ROLE_ASSISTANT: &str = "assistant";

/// A persisted message row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Monotonically increasing row id
    pub id: MessageId,
    /// Session the message belongs to
    pub session_id: String,
    /// Role tag (`user`, `assistant`, or anything a caller chose to store)
    pub role: String,
    /// Content, preserved byte-for-byte
    pub content: String,
    /// Model that produced the message; empty for user messages
    pub model: String,
    /// Write time
    pub created_at: DateTime<Utc>,
}

/// Aggregate view of one session, derived from its messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier
    pub session_id: String,
    /// Display name, if one was assigned
    pub name: Option<String>,
    /// Timestamp of the most recent message
    pub last_activity: DateTime<Utc>,
    /// Number of stored messages
    pub message_count: usize,
    /// Approximate storage footprint (see `SqliteStorage::size_of`)
    pub size_bytes: u64,
}

/// A message matched by a content search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// The matching message
    pub message: StoredMessage,
    /// Display name of the owning session, if any
    pub session_name: Option<String>,
}
