//! Session identity
//!
//! A session is a conversation thread identified by a random 128-bit id.
//! There is no "create session" record: a session comes into existence when
//! its first message is written, so handing out an id is all that creating
//! one involves.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Number of id characters used for the derived short label
pub const SHORT_ID_LEN: usize = 8;

/// Opaque, globally unique session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh identifier (uuid v4)
    ///
    /// # Examples
    ///
    /// ```
    /// use parley::session::SessionId;
    ///
    /// let a = SessionId::generate();
    /// let b = SessionId::generate();
    /// assert_ne!(a, b);
    /// assert_eq!(a.as_str().len(), 36);
    /// ```
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters of the identifier
    pub fn short(&self) -> &str {
        short_id(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Prefix of an id, safe for ids shorter than the prefix length
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Label shown for a session: its name when set, otherwise `abcd1234...`
///
/// # Examples
///
/// ```
/// use parley::session::display_label;
///
/// assert_eq!(display_label("0123456789abcdef", None), "01234567...");
/// assert_eq!(display_label("0123456789abcdef", Some("Trip plans")), "Trip plans");
/// ```
pub fn display_label(id: &str, name: Option<&str>) -> String {
    match name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{}...", short_id(id)),
    }
}

/// The session the interactive loop is currently attached to
///
/// Creation is lazy: `get_or_create` hands out a new id on first use and the
/// same id afterwards, so it is safe to call before every turn.
#[derive(Debug, Default)]
pub struct ActiveSession {
    current: Option<SessionId>,
}

impl ActiveSession {
    /// Start detached from any session
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach to an existing session
    pub fn resume(id: SessionId) -> Self {
        Self { current: Some(id) }
    }

    /// Current session, if one has been chosen or created
    pub fn current(&self) -> Option<&SessionId> {
        self.current.as_ref()
    }

    /// Current session, creating one on first call
    pub fn get_or_create(&mut self) -> &SessionId {
        self.current.get_or_insert_with(|| {
            let id = SessionId::generate();
            tracing::debug!(session_id = %id, "Started new session");
            id
        })
    }

    /// Switch to `id`
    pub fn switch_to(&mut self, id: SessionId) {
        self.current = Some(id);
    }

    /// Drop the current session and start a fresh one
    pub fn start_new(&mut self) -> &SessionId {
        self.current = None;
        self.get_or_create()
    }

    /// Detach if currently attached to `id` (used after deleting it)
    pub fn forget(&mut self, id: &str) {
        if self.current.as_ref().map(SessionId::as_str) == Some(id) {
            self.current = None;
        }
    }
}
