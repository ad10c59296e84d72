//! Parsing of interactive input
//!
//! Every interactive prompt reads one line and turns it into one of the
//! small command enums below. Parsing is pure; handlers in the sibling
//! modules act on the result. Numbers shown to the user are 1-based, the
//! parsed indices are 0-based.
//!
//! Matching is case-insensitive and ignores surrounding whitespace.

use crate::error::ParleyError;
use crate::storage::SessionSummary;

/// Words that end the program from any prompt
pub const EXIT_WORDS: [&str; 4] = ["exit", "quit", "q", "bye"];

/// Minimum length of a session id prefix typed at the export picker
pub const MIN_EXPORT_PREFIX: usize = 8;

/// Whether `input` is one of the exit words
///
/// # Examples
///
/// ```
/// use parley::commands::input::is_exit_word;
///
/// assert!(is_exit_word("  Quit "));
/// assert!(!is_exit_word("quitting"));
/// ```
pub fn is_exit_word(input: &str) -> bool {
    let lowered = input.trim().to_lowercase();
    EXIT_WORDS.contains(&lowered.as_str())
}

/// Whether `input` confirms a destructive action (`yes`/`y`)
pub fn is_confirmation(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "yes" | "y")
}

/// Entries of the main menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// 1. Chat with memory
    Chat,
    /// 2. Search logs
    Search,
    /// 3. List and manage sessions
    Sessions,
    /// 4. Export a session
    Export,
    /// 5. Set the active model
    SwitchModel,
    /// 6. Exit
    Exit,
}

/// Parse a main-menu selection
///
/// # Errors
///
/// Returns `ParleyError::InvalidInput` for anything other than 1-6 or an
/// exit word.
pub fn parse_menu_choice(input: &str) -> Result<MenuChoice, ParleyError> {
    let trimmed = input.trim();
    match trimmed {
        "1" => Ok(MenuChoice::Chat),
        "2" => Ok(MenuChoice::Search),
        "3" => Ok(MenuChoice::Sessions),
        "4" => Ok(MenuChoice::Export),
        "5" => Ok(MenuChoice::SwitchModel),
        "6" => Ok(MenuChoice::Exit),
        _ if is_exit_word(trimmed) => Ok(MenuChoice::Exit),
        _ => Err(ParleyError::InvalidInput(format!(
            "'{}' is not a menu option; choose 1-6",
            trimmed
        ))),
    }
}

/// A line typed at the chat prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    /// Blank line, ignored
    Empty,
    /// Leave the program
    Exit,
    /// Return to the main menu
    Menu,
    /// Start a fresh session
    NewSession,
    /// Text to send to the model
    Prompt(String),
}

/// Classify a chat prompt line
pub fn parse_chat_input(input: &str) -> ChatInput {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ChatInput::Empty;
    }
    if is_exit_word(trimmed) {
        return ChatInput::Exit;
    }
    match trimmed.to_lowercase().as_str() {
        "menu" => ChatInput::Menu,
        "new" => ChatInput::NewSession,
        _ => ChatInput::Prompt(trimmed.to_string()),
    }
}

/// Actions offered under the session list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// `#` or `resume #`
    Resume(usize),
    /// `rename #`
    Rename(usize),
    /// `delete #`
    Delete(usize),
    /// `new`
    New,
    /// `back` or a blank line
    Back,
}

fn parse_index(raw: &str, count: usize) -> Result<usize, ParleyError> {
    let number: usize = raw
        .parse()
        .map_err(|_| ParleyError::InvalidInput(format!("'{}' is not a number", raw)))?;
    if number == 0 || number > count {
        return Err(ParleyError::NotFound(format!(
            "No entry #{} (choose 1-{})",
            number, count
        )));
    }
    Ok(number - 1)
}

fn is_number(raw: &str) -> bool {
    !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit())
}

/// Parse an action typed under a list of `count` sessions
///
/// # Errors
///
/// * `ParleyError::NotFound` when the number is outside `1..=count`
/// * `ParleyError::InvalidInput` for anything unrecognized
///
/// # Examples
///
/// ```
/// use parley::commands::input::{parse_session_action, SessionAction};
///
/// assert_eq!(parse_session_action("rename 2", 3).unwrap(), SessionAction::Rename(1));
/// assert_eq!(parse_session_action("1", 3).unwrap(), SessionAction::Resume(0));
/// assert!(parse_session_action("delete 4", 3).is_err());
/// ```
pub fn parse_session_action(input: &str, count: usize) -> Result<SessionAction, ParleyError> {
    let lowered = input.trim().to_lowercase();
    let parts: Vec<&str> = lowered.split_whitespace().collect();

    match parts.as_slice() {
        [] | ["back"] | ["b"] => Ok(SessionAction::Back),
        ["new"] => Ok(SessionAction::New),
        [n] if is_number(n) => parse_index(n, count).map(SessionAction::Resume),
        ["resume", n] if is_number(n) => parse_index(n, count).map(SessionAction::Resume),
        ["rename", n] if is_number(n) => parse_index(n, count).map(SessionAction::Rename),
        ["delete", n] if is_number(n) => parse_index(n, count).map(SessionAction::Delete),
        _ => Err(ParleyError::InvalidInput(
            "Use: rename 1, delete 2, 3, new, back".to_string(),
        )),
    }
}

/// Selection typed under a list of search results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchSelection {
    /// `#`: show the full message
    View(usize),
    /// `s#`: continue chatting in the message's session
    Jump(usize),
    /// Blank line
    Back,
}

/// Parse a selection typed under `count` search results
///
/// # Errors
///
/// * `ParleyError::NotFound` when the number is outside `1..=count`
/// * `ParleyError::InvalidInput` for anything unrecognized
pub fn parse_search_selection(input: &str, count: usize) -> Result<SearchSelection, ParleyError> {
    let lowered = input.trim().to_lowercase();
    if lowered.is_empty() || lowered == "back" {
        return Ok(SearchSelection::Back);
    }
    if let Some(rest) = lowered.strip_prefix('s') {
        if is_number(rest) {
            return parse_index(rest, count).map(SearchSelection::Jump);
        }
    }
    if is_number(&lowered) {
        return parse_index(&lowered, count).map(SearchSelection::View);
    }
    Err(ParleyError::InvalidInput(
        "Use '#' to view a message or 's#' to chat in its session".to_string(),
    ))
}

/// Pick the session to export from the listed `sessions`
///
/// Accepts a 1-based index or an id prefix of at least
/// [`MIN_EXPORT_PREFIX`] characters. A blank line skips and yields `None`.
///
/// # Errors
///
/// * `ParleyError::NotFound` for an out-of-range index or unmatched prefix
/// * `ParleyError::InvalidInput` for an ambiguous or too-short prefix
pub fn select_export_session<'a>(
    input: &str,
    sessions: &'a [SessionSummary],
) -> Result<Option<&'a SessionSummary>, ParleyError> {
    let choice = input.trim().to_lowercase();
    if choice.is_empty() || choice == "skip" {
        return Ok(None);
    }
    if is_number(&choice) && choice.len() < MIN_EXPORT_PREFIX {
        let index = parse_index(&choice, sessions.len())?;
        return Ok(sessions.get(index));
    }
    if choice.chars().count() < MIN_EXPORT_PREFIX {
        return Err(ParleyError::InvalidInput(format!(
            "Enter a number or at least {} characters of a session id",
            MIN_EXPORT_PREFIX
        )));
    }

    let matches: Vec<&SessionSummary> = sessions
        .iter()
        .filter(|s| s.session_id.to_lowercase().starts_with(&choice))
        .collect();
    match matches.as_slice() {
        [] => Err(ParleyError::NotFound(format!("No listed session matches '{}'", choice))),
        [only] => Ok(Some(*only)),
        _ => Err(ParleyError::InvalidInput(
            "Multiple sessions match; pick a number instead".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn summary(id: &str) -> SessionSummary {
        SessionSummary {
            session_id: id.to_string(),
            name: None,
            last_activity: Utc::now(),
            message_count: 2,
            size_bytes: 10,
        }
    }

    #[test]
    fn test_exit_words() {
        for word in ["exit", "QUIT", " q ", "Bye"] {
            assert!(is_exit_word(word), "{} should exit", word);
        }
        assert!(!is_exit_word("menu"));
        assert!(!is_exit_word(""));
    }

    #[test]
    fn test_confirmation() {
        assert!(is_confirmation("y"));
        assert!(is_confirmation(" YES "));
        assert!(!is_confirmation("n"));
        assert!(!is_confirmation(""));
    }

    #[test]
    fn test_parse_menu_choice() {
        assert_eq!(parse_menu_choice("1").unwrap(), MenuChoice::Chat);
        assert_eq!(parse_menu_choice(" 5 ").unwrap(), MenuChoice::SwitchModel);
        assert_eq!(parse_menu_choice("6").unwrap(), MenuChoice::Exit);
        assert_eq!(parse_menu_choice("q").unwrap(), MenuChoice::Exit);
        assert!(matches!(
            parse_menu_choice("7"),
            Err(ParleyError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_parse_chat_input() {
        assert_eq!(parse_chat_input("   "), ChatInput::Empty);
        assert_eq!(parse_chat_input("MENU"), ChatInput::Menu);
        assert_eq!(parse_chat_input("new"), ChatInput::NewSession);
        assert_eq!(parse_chat_input("bye"), ChatInput::Exit);
        assert_eq!(
            parse_chat_input("  what is new?  "),
            ChatInput::Prompt("what is new?".to_string())
        );
    }

    #[test]
    fn test_parse_session_action() {
        assert_eq!(parse_session_action("3", 3).unwrap(), SessionAction::Resume(2));
        assert_eq!(parse_session_action("resume 1", 3).unwrap(), SessionAction::Resume(0));
        assert_eq!(parse_session_action("Delete 2", 3).unwrap(), SessionAction::Delete(1));
        assert_eq!(parse_session_action("new", 3).unwrap(), SessionAction::New);
        assert_eq!(parse_session_action("", 3).unwrap(), SessionAction::Back);
        assert_eq!(parse_session_action("back", 3).unwrap(), SessionAction::Back);
    }

    #[test]
    fn test_parse_session_action_errors() {
        assert!(matches!(
            parse_session_action("0", 3),
            Err(ParleyError::NotFound(_))
        ));
        assert!(matches!(
            parse_session_action("rename 9", 3),
            Err(ParleyError::NotFound(_))
        ));
        assert!(matches!(
            parse_session_action("rename", 3),
            Err(ParleyError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_session_action("archive 1", 3),
            Err(ParleyError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_parse_search_selection() {
        assert_eq!(parse_search_selection("2", 3).unwrap(), SearchSelection::View(1));
        assert_eq!(parse_search_selection("S1", 3).unwrap(), SearchSelection::Jump(0));
        assert_eq!(parse_search_selection("", 3).unwrap(), SearchSelection::Back);
        assert!(matches!(
            parse_search_selection("s4", 3),
            Err(ParleyError::NotFound(_))
        ));
        assert!(matches!(
            parse_search_selection("sx", 3),
            Err(ParleyError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_select_export_session_by_index_and_prefix() {
        let sessions = vec![
            summary("aaaaaaaa-1111-0000"),
            summary("aaaaaaaa-2222-0000"),
            summary("bbbbbbbb-3333-0000"),
        ];

        let picked = select_export_session("2", &sessions).unwrap().unwrap();
        assert_eq!(picked.session_id, "aaaaaaaa-2222-0000");

        let picked = select_export_session("BBBBBBBB", &sessions).unwrap().unwrap();
        assert_eq!(picked.session_id, "bbbbbbbb-3333-0000");

        assert!(select_export_session("", &sessions).unwrap().is_none());
    }

    #[test]
    fn test_select_export_session_errors() {
        let sessions = vec![summary("aaaaaaaa-1111"), summary("aaaaaaaa-2222")];
        assert!(matches!(
            select_export_session("aaaaaaaa", &sessions),
            Err(ParleyError::InvalidInput(_))
        ));
        assert!(matches!(
            select_export_session("cccccccc", &sessions),
            Err(ParleyError::NotFound(_))
        ));
        assert!(matches!(
            select_export_session("aaa", &sessions),
            Err(ParleyError::InvalidInput(_))
        ));
        assert!(matches!(
            select_export_session("5", &sessions),
            Err(ParleyError::NotFound(_))
        ));
    }
}
