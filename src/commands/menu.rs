//! Interactive menu loop
//!
//! Numbered main menu with chat, search, session management, export, model
//! selection and exit. Every handler returns a [`Flow`] telling the loop
//! where to go next; an exit word, Ctrl-C or Ctrl-D at any prompt ends it.

use crate::app::AppContext;
use crate::chat::{clean_reply, run_turn};
use crate::commands::display::{format_usage, print_error};
use crate::commands::export::export_menu;
use crate::commands::input::{is_confirmation, parse_chat_input, parse_menu_choice, ChatInput, MenuChoice};
use crate::commands::models::switch_model_menu;
use crate::commands::prompt::{Prompted, Prompter};
use crate::commands::search::search_menu;
use crate::commands::sessions::manage_sessions;
use crate::commands::Flow;
use crate::error::{as_parley_error, ParleyError, Result};
use crate::session::{display_label, ActiveSession, SessionId};
use colored::Colorize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How the interactive menu ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    /// The user left; shut down
    Exit,
    /// A new model was saved; reload configuration and start again
    Restart,
}

/// Cancel `cancel` when the process receives Ctrl-C
///
/// The watcher ends on its own once the token is cancelled elsewhere.
pub fn spawn_interrupt_watcher(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    tracing::info!("Interrupt received, shutting down");
                    cancel.cancel();
                }
            }
            _ = cancel.cancelled() => {}
        }
    })
}

/// Run the interactive menu until the user exits or a restart is needed
///
/// With `resume` set, the loop starts in that session's chat.
pub async fn run_menu(
    app: &AppContext,
    resume: Option<SessionId>,
    cancel: &CancellationToken,
) -> Result<MenuOutcome> {
    let mut prompter = Prompter::new(cancel.clone())?;
    let mut active = ActiveSession::new();

    print_banner(app);

    let mut next = match resume {
        Some(id) => Flow::Chat(id),
        None => Flow::Back,
    };

    loop {
        next = match next {
            Flow::Exit => return Ok(MenuOutcome::Exit),
            Flow::Restart => return Ok(MenuOutcome::Restart),
            Flow::Chat(id) => {
                active.switch_to(id);
                chat_loop(app, &mut prompter, &mut active, cancel).await?
            }
            Flow::NewChat => {
                let id = active.start_new();
                println!("{}", format!("New session: {}...", id.short()).magenta());
                chat_loop(app, &mut prompter, &mut active, cancel).await?
            }
            Flow::Back => main_menu(app, &mut prompter, &mut active).await?,
        };
    }
}

/// Session to resume for `chat --resume <prefix>`
///
/// An unknown or ambiguous prefix is reported and the menu starts without
/// a session.
pub fn resolve_resume(app: &AppContext, prefix: &str) -> Option<SessionId> {
    match app.storage.resolve_session(prefix) {
        Ok(session_id) => {
            tracing::debug!("Resuming session: {}", session_id);
            Some(SessionId::from(session_id.as_str()))
        }
        Err(e) => {
            print_error(e);
            None
        }
    }
}

fn print_banner(app: &AppContext) {
    println!("{}", "Parley for Ollama".bold());
    println!(
        "{} | {}",
        format!("Model: {}", app.model()).magenta(),
        format!("DB: {}", app.storage.db_path().display()).yellow()
    );
    println!(
        "{}\n",
        "Type 'exit', 'quit', or 'q' anywhere to quit.".cyan()
    );
}

fn print_menu() {
    println!("{}", "=".repeat(50));
    println!("1. Chat (with memory)");
    println!("2. Search logs");
    println!("3. List sessions");
    println!("4. Export session");
    println!("5. Set model");
    println!("6. Exit");
    println!("{}", "=".repeat(50));
}

async fn main_menu(
    app: &AppContext,
    prompter: &mut Prompter,
    active: &mut ActiveSession,
) -> Result<Flow> {
    print_menu();
    let line = match prompter.read("Choose (1-6): ")? {
        Prompted::Exit => return Ok(Flow::Exit),
        Prompted::Line(line) => line,
    };

    let choice = match parse_menu_choice(&line) {
        Ok(choice) => choice,
        Err(e) => {
            print_error(e);
            return Ok(Flow::Back);
        }
    };

    let result = match choice {
        MenuChoice::Chat => choose_chat_session(app, prompter, active),
        MenuChoice::Search => search_menu(app, prompter),
        MenuChoice::Sessions => manage_sessions(app, prompter, active),
        MenuChoice::Export => export_menu(app, prompter),
        MenuChoice::SwitchModel => switch_model_menu(app, prompter).await,
        MenuChoice::Exit => Ok(Flow::Exit),
    };
    recover(result)
}

/// Report a failed menu action and go back to the main menu
///
/// Only errors from outside [`ParleyError`], such as a broken terminal,
/// end the loop.
fn recover(result: Result<Flow>) -> Result<Flow> {
    match result {
        Err(e) if as_parley_error(&e).is_some() => {
            print_error(e);
            Ok(Flow::Back)
        }
        other => other,
    }
}

/// Continue the current session, or offer to resume a stored one
fn choose_chat_session(
    app: &AppContext,
    prompter: &mut Prompter,
    active: &mut ActiveSession,
) -> Result<Flow> {
    if let Some(current) = active.current() {
        return Ok(Flow::Chat(current.clone()));
    }

    match app.storage.list_sessions(1) {
        Ok(recent) if recent.is_empty() => return Ok(Flow::NewChat),
        Ok(_) => {}
        Err(e) => {
            print_error(e);
            return Ok(Flow::Back);
        }
    }

    let answer = match prompter.read("Resume last? (y/n): ")? {
        Prompted::Exit => return Ok(Flow::Exit),
        Prompted::Line(answer) => answer,
    };
    if !is_confirmation(&answer) {
        return Ok(Flow::NewChat);
    }

    match manage_sessions(app, prompter, active)? {
        Flow::Back => Ok(Flow::NewChat),
        other => Ok(other),
    }
}

async fn chat_loop(
    app: &AppContext,
    prompter: &mut Prompter,
    active: &mut ActiveSession,
    cancel: &CancellationToken,
) -> Result<Flow> {
    let mut session = active.get_or_create().clone();
    let name = app.storage.get_name(session.as_str()).ok().flatten();
    println!(
        "\n{}",
        format!("Session: {}", display_label(session.as_str(), name.as_deref())).magenta()
    );
    println!("{}\n", "Type 'menu' to return, 'new' for new session.".cyan());

    loop {
        let line = match prompter.read("You: ")? {
            Prompted::Exit => return Ok(Flow::Exit),
            Prompted::Line(line) => line,
        };

        match parse_chat_input(&line) {
            ChatInput::Empty => continue,
            ChatInput::Exit => return Ok(Flow::Exit),
            ChatInput::Menu => return Ok(Flow::Back),
            ChatInput::NewSession => {
                session = active.start_new().clone();
                println!("{}", format!("New session: {}...", session.short()).magenta());
            }
            ChatInput::Prompt(prompt) => {
                match run_turn(app, session.as_str(), &prompt, cancel).await {
                    Ok(outcome) => {
                        println!("{}\n{}\n", "Ollama:".green().bold(), clean_reply(&outcome.reply));
                        if let Some(usage) = &outcome.usage {
                            tracing::debug!(session_id = session.as_str(), "{}", format_usage(usage));
                        }
                    }
                    Err(e) if matches!(as_parley_error(&e), Some(ParleyError::Cancelled)) => {
                        return Ok(Flow::Exit);
                    }
                    Err(e) => print_error(e),
                }
            }
        }
    }
}

/// Release the active model on the backend before exiting
///
/// Failures are logged and otherwise ignored.
pub async fn shutdown(app: &AppContext) {
    println!("{}", "Stopping model and exiting...".yellow());
    if let Err(e) = app.provider.unload_model(app.model()).await {
        tracing::warn!(model = %app.model(), "Failed to unload model: {}", e);
    }
    println!("{}", "Goodbye!".yellow());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::providers::create_provider;
    use crate::storage::tests::create_test_storage;
    use crate::storage::SqliteStorage;

    fn app_with(storage: SqliteStorage, dir: &tempfile::TempDir) -> AppContext {
        let config = Config::default();
        let provider = create_provider(&config).unwrap();
        let config_path = dir.path().join("config.yaml");
        AppContext::new(config, config_path.to_string_lossy(), storage, provider)
    }

    /// Context whose database file disappeared after startup
    fn app_with_missing_db() -> (AppContext, tempfile::TempDir) {
        let (storage, dir) = create_test_storage();
        std::fs::remove_file(storage.db_path()).unwrap();
        (app_with(storage, &dir), dir)
    }

    #[test]
    fn test_resolve_resume_by_prefix() {
        let (storage, dir) = create_test_storage();
        storage.append_turn("abcd1234-5678", "hi", "hello", "m").unwrap();
        let app = app_with(storage, &dir);

        let resumed = resolve_resume(&app, "abcd").unwrap();
        assert_eq!(resumed.as_str(), "abcd1234-5678");
    }

    #[test]
    fn test_resolve_resume_unknown_starts_fresh() {
        let (storage, dir) = create_test_storage();
        let app = app_with(storage, &dir);
        assert!(resolve_resume(&app, "nope").is_none());
    }

    #[test]
    fn test_session_menu_survives_storage_failure() {
        let (app, _dir) = app_with_missing_db();
        let mut prompter = Prompter::new(CancellationToken::new()).unwrap();
        let mut active = ActiveSession::new();

        let flow = manage_sessions(&app, &mut prompter, &mut active).unwrap();
        assert_eq!(flow, Flow::Back);
    }

    #[test]
    fn test_export_menu_survives_storage_failure() {
        let (app, _dir) = app_with_missing_db();
        let mut prompter = Prompter::new(CancellationToken::new()).unwrap();

        assert_eq!(export_menu(&app, &mut prompter).unwrap(), Flow::Back);
    }

    #[test]
    fn test_chat_choice_survives_storage_failure() {
        let (app, _dir) = app_with_missing_db();
        let mut prompter = Prompter::new(CancellationToken::new()).unwrap();
        let mut active = ActiveSession::new();

        let flow = choose_chat_session(&app, &mut prompter, &mut active).unwrap();
        assert_eq!(flow, Flow::Back);
    }

    #[test]
    fn test_recover_reports_domain_errors() {
        let err = ParleyError::StorageUnavailable("disk gone".into());
        assert_eq!(recover(Err(err.into())).unwrap(), Flow::Back);
        assert_eq!(recover(Ok(Flow::Exit)).unwrap(), Flow::Exit);
    }

    #[test]
    fn test_recover_propagates_terminal_errors() {
        let err = anyhow::anyhow!("terminal closed");
        assert!(recover(Err(err)).is_err());
    }
}
