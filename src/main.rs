//! Parley - conversational session manager for local Ollama models
//!
#![doc = "Parley - conversational session manager for local Ollama models"]
#![doc = "Main entry point for the Parley application."]

use anyhow::Result;
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parley::cli::{Cli, Commands, ModelCommand, SessionCommand};
use parley::commands;
use parley::commands::menu::{self, MenuOutcome};
use parley::config::Config;
use parley::AppContext;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let mut cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    let config_path = cli.config_path().to_string();

    let mut resume = match cli.command.clone() {
        None => None,
        Some(Commands::Chat { resume }) => resume,
        Some(command) => {
            let app = load_app(&cli, &config_path)?;
            return run_command(&app, command).await;
        }
    };

    let cancel = CancellationToken::new();
    let watcher = menu::spawn_interrupt_watcher(cancel.clone());

    loop {
        let app = load_app(&cli, &config_path)?;
        ensure_backend(&app).await;

        let resume_id = resume
            .take()
            .and_then(|prefix| menu::resolve_resume(&app, &prefix));

        match menu::run_menu(&app, resume_id, &cancel).await? {
            MenuOutcome::Exit => {
                menu::shutdown(&app).await;
                break;
            }
            MenuOutcome::Restart => {
                // The saved model wins over a one-off --model from now on
                cli.model = None;
                if std::env::var("PARLEY_MODEL").is_ok() {
                    tracing::warn!("PARLEY_MODEL is set and overrides the saved model");
                }
                tracing::info!("Restarting with the newly saved model");
            }
        }
    }

    cancel.cancel();
    let _ = watcher.await;
    Ok(())
}

/// Load and validate configuration, then open storage and the provider
fn load_app(cli: &Cli, config_path: &str) -> Result<AppContext> {
    let config = Config::load(config_path, cli)?;
    config.validate()?;
    AppContext::from_config(config, config_path)
}

/// Exit with status 1 when the backend cannot be reached
async fn ensure_backend(app: &AppContext) {
    if let Err(e) = app.provider.health_check().await {
        tracing::error!("Backend health check failed: {}", e);
        eprintln!(
            "{}",
            format!("Cannot reach Ollama at {}: {}", app.config.ollama.host, e).red()
        );
        eprintln!("Start it with {} and try again.", "ollama serve".cyan());
        std::process::exit(1);
    }
}

/// Run one of the one-shot subcommands
async fn run_command(app: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Chat { .. } => Ok(()),
        Commands::Sessions { command } => {
            tracing::info!("Starting session management command");
            match command {
                SessionCommand::List { limit } => commands::sessions::list_sessions(app, limit),
                SessionCommand::Rename { session, name } => {
                    commands::sessions::rename_session(app, &session, &name)
                }
                SessionCommand::Delete { session } => {
                    commands::sessions::delete_session(app, &session)
                }
            }
        }
        Commands::Search { query, limit } => {
            tracing::info!("Starting search command");
            commands::search::search_messages(app, &query, limit)
        }
        Commands::Export {
            session,
            output_dir,
        } => {
            tracing::info!("Starting export command");
            commands::export::export_command(app, &session, output_dir.as_deref())?;
            Ok(())
        }
        Commands::Models { command } => {
            tracing::info!("Starting model management command");
            match command {
                ModelCommand::List { json } => commands::models::list_models(app, json).await,
                ModelCommand::Current => {
                    commands::models::show_current_model(app);
                    Ok(())
                }
                ModelCommand::Set { name } => {
                    commands::models::set_model(app, &name).await?;
                    Ok(())
                }
            }
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so they never interleave with transcript output.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "parley=debug" } else { "parley=warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
