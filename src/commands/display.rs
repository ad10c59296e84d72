//! Terminal presentation helpers shared by the interactive menu and the
//! one-shot subcommands

use crate::providers::TokenUsage;
use crate::session::display_label;
use crate::storage::{SearchHit, SessionSummary, StoredMessage, ROLE_USER};
use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use prettytable::{format, row, Table};

/// Characters of content shown in a search result before it is cut
pub const PREVIEW_CHARS: usize = 100;

const SIZE_UNITS: [&str; 3] = ["KB", "MB", "GB"];

/// Human-readable byte count
///
/// # Examples
///
/// ```
/// use parley::commands::display::format_size;
///
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = SIZE_UNITS[0];
    for next in &SIZE_UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{:.2} {}", value, unit)
}

/// `MM-DD HH:MM` in local time
pub fn format_short_time(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%m-%d %H:%M").to_string()
}

/// First [`PREVIEW_CHARS`] characters of `content` on one line, with `...`
/// when cut
pub fn preview(content: &str) -> String {
    let flat = content.replace(['\r', '\n'], " ");
    if flat.chars().count() > PREVIEW_CHARS {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

fn role_tag(role: &str) -> colored::ColoredString {
    let upper = role.to_uppercase();
    if role == ROLE_USER {
        upper.cyan()
    } else {
        upper.green()
    }
}

/// Print a numbered table of sessions
pub fn print_sessions_table(sessions: &[SessionSummary]) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row![
        "#".bold(),
        "Session".bold(),
        "Last Activity".bold(),
        "Messages".bold(),
        "Size".bold()
    ]);

    for (i, session) in sessions.iter().enumerate() {
        table.add_row(row![
            (i + 1).to_string().yellow(),
            display_label(&session.session_id, session.name.as_deref()).magenta(),
            format_short_time(&session.last_activity),
            format!("{} msg(s)", session.message_count),
            format_size(session.size_bytes)
        ]);
    }

    table.printstd();
}

/// Print numbered search results with previews
pub fn print_search_results(query: &str, hits: &[SearchHit]) {
    println!(
        "\n{}\n",
        format!("{} result(s) for '{}':", hits.len(), query).bold()
    );
    for (i, hit) in hits.iter().enumerate() {
        let message = &hit.message;
        println!(
            "{} {}: {}",
            format!("{}. [{}]", i + 1, format_short_time(&message.created_at)).yellow(),
            role_tag(&message.role),
            preview(&message.content)
        );
        println!(
            " {}\n",
            format!(
                "Session: {}",
                display_label(&message.session_id, hit.session_name.as_deref())
            )
            .magenta()
        );
    }
}

/// Print one message in full
pub fn print_full_message(message: &StoredMessage) {
    println!("\n{}", "--- Full Message ---".bold());
    println!(
        "{} {}",
        format!("[{}]", format_short_time(&message.created_at)).yellow(),
        role_tag(&message.role)
    );
    println!("{}\n", message.content);
}

/// Print a failure the way every interactive handler reports it
pub fn print_error(err: impl std::fmt::Display) {
    eprintln!("{}", format!("Error: {}", err).red());
}

/// One-line token count summary for a reply
pub fn format_usage(usage: &TokenUsage) -> String {
    format!(
        "Tokens: {} prompt + {} reply = {}",
        usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1024 * 1024), "1.00 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.00 GB");
        assert_eq!(format_size(4096 * 1024 * 1024 * 1024), "4096.00 GB");
    }

    #[test]
    fn test_preview_cuts_long_content() {
        let long = "x".repeat(150);
        let shown = preview(&long);
        assert_eq!(shown.len(), PREVIEW_CHARS + 3);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn test_preview_keeps_short_content_on_one_line() {
        assert_eq!(preview("a\nb"), "a b");
        assert_eq!(preview(&"y".repeat(PREVIEW_CHARS)), "y".repeat(PREVIEW_CHARS));
    }

    #[test]
    fn test_format_short_time_shape() {
        let shown = format_short_time(&Utc::now());
        assert_eq!(shown.len(), "MM-DD HH:MM".len());
        assert_eq!(&shown[2..3], "-");
        assert_eq!(&shown[8..9], ":");
    }

    #[test]
    fn test_format_usage_sums_both_sides() {
        let usage = TokenUsage::new(12, 4);
        assert_eq!(format_usage(&usage), "Tokens: 12 prompt + 4 reply = 16");
    }
}
