//! Parley - conversational session manager for local Ollama models
//!
//! Every exchange with the model is persisted to SQLite, and the most recent
//! exchanges of a session are replayed as context on each new turn. Sessions
//! can be named, listed, searched, deleted and exported to markdown.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `storage`: message store, session directory and search over SQLite
//! - `context`: bounded context assembly for a new turn
//! - `chat`: one turn end to end (assemble, converse, persist on success)
//! - `export`: markdown transcripts and filename sanitization
//! - `providers`: inference backend abstraction and the Ollama client
//! - `session`: session identifiers and the lazily created active session
//! - `config`: configuration management and validation
//! - `commands`: interactive menu and one-shot subcommands
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use parley::{AppContext, Config};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let app = AppContext::from_config(config, "config/config.yaml")?;
//!     let session = parley::session::SessionId::generate();
//!     let turn = parley::chat::run_turn(&app, session.as_str(), "Hello!", &CancellationToken::new()).await?;
//!     println!("{}", turn.reply);
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod providers;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use app::AppContext;
pub use config::{Config, ConfigChange};
pub use error::{ParleyError, Result};
pub use session::SessionId;
pub use storage::SqliteStorage;
