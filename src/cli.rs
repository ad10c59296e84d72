//! Command-line interface definition for Parley
//!
//! This module defines the CLI structure using clap's derive API. Without a
//! subcommand the interactive menu starts.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parley - chat with local Ollama models, with memory
///
/// Conversations are stored in SQLite and the most recent exchanges are
/// replayed as context on every turn.
#[derive(Parser, Debug, Clone)]
#[command(name = "parley")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "PARLEY_CONFIG", default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Path to the conversation database
    #[arg(long)]
    pub db: Option<String>,

    /// Model to use for this run (not persisted)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute (defaults to the interactive menu)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for Parley
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the interactive menu
    Chat {
        /// Resume a session by id or id prefix
        #[arg(short, long)]
        resume: Option<String>,
    },

    /// List, rename, or delete sessions
    Sessions {
        /// Session management subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Search message content across all sessions
    Search {
        /// Text to look for
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Export a session transcript to markdown
    Export {
        /// Session id or id prefix
        session: String,

        /// Directory to write the export into
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Manage the active model
    Models {
        /// Model management subcommand
        #[command(subcommand)]
        command: ModelCommand,
    },
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List recent sessions
    List {
        /// Maximum number of sessions
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Give a session a display name
    Rename {
        /// Session id or id prefix
        session: String,

        /// New display name
        name: String,
    },

    /// Delete a session and all of its messages
    Delete {
        /// Session id or id prefix
        session: String,
    },
}

/// Model management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ModelCommand {
    /// List models installed on the backend
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the configured model
    Current,

    /// Save a new active model (applies on next start)
    Set {
        /// Model name
        name: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Configuration file path, falling back to the default location
    pub fn config_path(&self) -> &str {
        self.config.as_deref().unwrap_or("config/config.yaml")
    }
}
