//! Markdown export of session transcripts

use crate::error::{ParleyError, Result};
use crate::session::short_id;
use crate::storage::{SqliteStorage, StoredMessage};
use chrono::{DateTime, Local};
use regex::Regex;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Maximum length, in characters, of the sanitized name part of a filename
pub const MAX_FILENAME_STEM: usize = 50;

/// Name used when sanitizing leaves nothing behind
pub const UNNAMED: &str = "unnamed";

const SEPARATOR: char = '_';

/// A rendered transcript ready to be written to disk
#[derive(Debug, Clone)]
pub struct ExportDocument {
    /// Session that was exported
    pub session_id: String,
    /// Resolved display name (assigned name or id prefix)
    pub display_name: String,
    /// Suggested file name, e.g. `chat_Trip_plans_20240301_1015.md`
    pub file_name: String,
    /// Markdown body
    pub contents: String,
}

impl ExportDocument {
    /// Write the document into `dir`, creating it if needed
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.contents)?;
        tracing::info!(session_id = %self.session_id, path = %path.display(), "Exported session");
        Ok(path)
    }
}

fn illegal_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).unwrap())
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn separator_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_+").unwrap())
}

/// Turn a display name into a filesystem-safe file stem
///
/// # Examples
///
/// ```
/// use parley::export::sanitize_filename;
///
/// assert_eq!(sanitize_filename("My / Chat: Test??"), "My_Chat_Test");
/// assert_eq!(sanitize_filename("???"), "unnamed");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let name = illegal_chars().replace_all(name, "");
    let name = whitespace_runs().replace_all(&name, "_");
    let name = separator_runs().replace_all(&name, "_");

    let truncated: String = name
        .trim_matches(SEPARATOR)
        .chars()
        .take(MAX_FILENAME_STEM)
        .collect();
    let stem = truncated.trim_matches(SEPARATOR);

    if stem.is_empty() {
        UNNAMED.to_string()
    } else {
        stem.to_string()
    }
}

fn role_label(role: &str) -> String {
    let mut chars = role.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Unknown".to_string(),
    }
}

fn render_message(out: &mut String, message: &StoredMessage) {
    let when = message.created_at.with_timezone(&Local).format("%m-%d %H:%M");
    let _ = writeln!(out, "### {} - {}", role_label(&message.role), when);
    let _ = writeln!(out, "{}", message.content);
    out.push('\n');
}

/// Render a session's full transcript
///
/// Content is written verbatim; nothing is truncated.
///
/// # Errors
///
/// Returns `ParleyError::EmptySession` when the session has no messages.
pub fn export_session(
    storage: &SqliteStorage,
    session_id: &str,
    exported_at: DateTime<Local>,
) -> Result<ExportDocument> {
    let messages = storage.read_all(session_id)?;
    if messages.is_empty() {
        return Err(ParleyError::EmptySession(session_id.to_string()).into());
    }

    let display_name = storage
        .get_name(session_id)?
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| short_id(session_id).to_string());

    let mut contents = String::new();
    contents.push_str("# Ollama Chat Export\n");
    let _ = writeln!(contents, "**Session ID:** `{}`", session_id);
    let _ = writeln!(contents, "**Name:** {}", display_name);
    let _ = writeln!(contents, "**Exported:** {}", exported_at.format("%Y-%m-%d %H:%M:%S"));
    contents.push('\n');
    for message in &messages {
        render_message(&mut contents, message);
    }

    let file_name = format!(
        "chat_{}_{}.md",
        sanitize_filename(&display_name),
        exported_at.format("%Y%m%d_%H%M")
    );

    Ok(ExportDocument {
        session_id: session_id.to_string(),
        display_name,
        file_name,
        contents,
    })
}
