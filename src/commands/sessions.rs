//! Session listing and management commands

use crate::app::AppContext;
use crate::commands::display::{print_error, print_sessions_table};
use crate::commands::input::{is_confirmation, parse_session_action, SessionAction};
use crate::commands::prompt::{Prompted, Prompter};
use crate::commands::Flow;
use crate::error::{ParleyError, Result};
use crate::session::{display_label, short_id, ActiveSession, SessionId};
use crate::storage::SessionSummary;
use colored::Colorize;

/// Print the most recent sessions
pub fn list_sessions(app: &AppContext, limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(app.config.chat.session_list_limit);
    let sessions = app.storage.list_sessions(limit)?;

    if sessions.is_empty() {
        println!("{}", "No sessions found.".yellow());
        return Ok(());
    }

    println!("\n{}", "Sessions:".bold());
    print_sessions_table(&sessions);
    println!();
    println!(
        "Use {} to continue one.",
        "parley chat --resume <ID>".cyan()
    );
    Ok(())
}

/// Give the session matching `session` (id or unique prefix) a display name
///
/// # Errors
///
/// * `ParleyError::InvalidInput` for an empty name or ambiguous prefix
/// * `ParleyError::NotFound` when no session matches
pub fn rename_session(app: &AppContext, session: &str, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ParleyError::InvalidInput("Session name must not be empty".into()).into());
    }
    let session_id = app.storage.resolve_session(session)?;
    app.storage.set_name(&session_id, name)?;
    println!("{}", format!("Renamed {} to: {}", short_id(&session_id), name).green());
    Ok(())
}

/// Delete the session matching `session` along with its name
pub fn delete_session(app: &AppContext, session: &str) -> Result<()> {
    let session_id = app.storage.resolve_session(session)?;
    let removed = app.storage.delete_session(&session_id)?;
    println!(
        "{}",
        format!("Deleted session {} ({} message(s))", short_id(&session_id), removed).green()
    );
    Ok(())
}

/// Interactive session list with resume, rename, delete and new actions
pub(crate) fn manage_sessions(
    app: &AppContext,
    prompter: &mut Prompter,
    active: &mut ActiveSession,
) -> Result<Flow> {
    let sessions = match app.storage.list_sessions(app.config.chat.session_list_limit) {
        Ok(sessions) => sessions,
        Err(e) => {
            print_error(e);
            return Ok(Flow::Back);
        }
    };
    if sessions.is_empty() {
        println!("{}", "No sessions found.".red());
        return Ok(match prompter.pause()? {
            Prompted::Exit => Flow::Exit,
            Prompted::Line(_) => Flow::Back,
        });
    }

    println!("\n{}", "List Sessions:".bold());
    print_sessions_table(&sessions);
    println!(
        "\n{}",
        "Actions: 'rename #', 'delete #', '#' to resume, 'new' for new, 'back' to exit".cyan()
    );

    let line = match prompter.read("Choose: ")? {
        Prompted::Exit => return Ok(Flow::Exit),
        Prompted::Line(line) => line,
    };

    let action = match parse_session_action(&line, sessions.len()) {
        Ok(action) => action,
        Err(e) => {
            print_error(e);
            return Ok(Flow::Back);
        }
    };

    match action {
        SessionAction::Back => Ok(Flow::Back),
        SessionAction::New => Ok(Flow::NewChat),
        SessionAction::Resume(index) => Ok(Flow::Chat(SessionId::from(
            sessions[index].session_id.as_str(),
        ))),
        SessionAction::Rename(index) => rename_interactive(app, prompter, &sessions[index]),
        SessionAction::Delete(index) => {
            delete_interactive(app, prompter, active, &sessions[index])
        }
    }
}

fn rename_interactive(
    app: &AppContext,
    prompter: &mut Prompter,
    session: &SessionSummary,
) -> Result<Flow> {
    let prompt = format!("New name for '{}...': ", short_id(&session.session_id));
    let name = match prompter.read(&prompt)? {
        Prompted::Exit => return Ok(Flow::Exit),
        Prompted::Line(name) => name,
    };

    if name.is_empty() {
        println!("{}", "Name unchanged.".yellow());
    } else if let Err(e) = app.storage.set_name(&session.session_id, &name) {
        print_error(e);
    } else {
        println!("{}", format!("Renamed to: {}", name).green());
    }
    Ok(Flow::Back)
}

fn delete_interactive(
    app: &AppContext,
    prompter: &mut Prompter,
    active: &mut ActiveSession,
    session: &SessionSummary,
) -> Result<Flow> {
    let label = display_label(&session.session_id, session.name.as_deref());
    let prompt = format!("Delete session '{}' forever? (yes/y, no/n): ", label);
    let answer = match prompter.read(&prompt)? {
        Prompted::Exit => return Ok(Flow::Exit),
        Prompted::Line(answer) => answer,
    };

    if !is_confirmation(&answer) {
        println!("{}", "Canceled.".yellow());
        return Ok(Flow::Back);
    }

    match app.storage.delete_session(&session.session_id) {
        Ok(_) => {
            active.forget(&session.session_id);
            println!("{}", "Session deleted.".green());
        }
        Err(e) => print_error(e),
    }
    Ok(Flow::Back)
}
