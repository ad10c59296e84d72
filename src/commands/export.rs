//! Transcript export commands

use crate::app::AppContext;
use crate::commands::display::{print_error, print_sessions_table};
use crate::commands::input::select_export_session;
use crate::commands::prompt::{Prompted, Prompter};
use crate::commands::Flow;
use crate::error::Result;
use crate::export::export_session;
use chrono::Local;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Export the session matching `session` (id or unique prefix)
///
/// Writes into `output_dir`, or the configured export directory.
pub fn export_command(
    app: &AppContext,
    session: &str,
    output_dir: Option<&Path>,
) -> Result<PathBuf> {
    let session_id = app.storage.resolve_session(session)?;
    let path = write_export(app, &session_id, output_dir)?;
    println!("{}", format!("Exported: {}", path.display()).green());
    Ok(path)
}

fn write_export(app: &AppContext, session_id: &str, output_dir: Option<&Path>) -> Result<PathBuf> {
    let document = export_session(&app.storage, session_id, Local::now())?;
    let dir = output_dir.unwrap_or(app.config.chat.export_dir.as_path());
    document.write_to(dir)
}

/// Interactive export: pick one of the most recent sessions by number or
/// id prefix
pub(crate) fn export_menu(app: &AppContext, prompter: &mut Prompter) -> Result<Flow> {
    let sessions = match app.storage.list_sessions(app.config.chat.export_list_limit) {
        Ok(sessions) => sessions,
        Err(e) => {
            print_error(e);
            return Ok(Flow::Back);
        }
    };
    if sessions.is_empty() {
        println!("{}", "No sessions to export.".red());
        return Ok(Flow::Back);
    }

    println!("\n{}", "Recent Sessions (choose to export):".bold());
    print_sessions_table(&sessions);

    let line = match prompter.read("\nEnter #, ID, or skip: ")? {
        Prompted::Exit => return Ok(Flow::Exit),
        Prompted::Line(line) => line,
    };

    let session = match select_export_session(&line, &sessions) {
        Ok(Some(session)) => session,
        Ok(None) => return Ok(Flow::Back),
        Err(e) => {
            print_error(e);
            return Ok(Flow::Back);
        }
    };

    match write_export(app, &session.session_id, None) {
        Ok(path) => println!("{}", format!("Exported: {}", path.display()).green()),
        Err(e) => print_error(e),
    }
    Ok(Flow::Back)
}
