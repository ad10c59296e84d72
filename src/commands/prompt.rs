//! Line input for the interactive menu
//!
//! Wraps a `rustyline` editor so that every prompt honors the same exit
//! rules: an exit word, Ctrl-C, Ctrl-D, or a cancelled token all come back
//! as [`Prompted::Exit`].

use crate::commands::input::is_exit_word;
use crate::error::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio_util::sync::CancellationToken;

/// Result of reading one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompted {
    /// A trimmed line (possibly empty)
    Line(String),
    /// The user asked to leave
    Exit,
}

/// Interactive line reader bound to the shutdown token
pub struct Prompter {
    editor: DefaultEditor,
    cancel: CancellationToken,
}

impl Prompter {
    /// Create a reader; interrupts cancel `cancel`
    pub fn new(cancel: CancellationToken) -> Result<Self> {
        let editor = DefaultEditor::new()?;
        Ok(Self { editor, cancel })
    }

    /// Read one line
    pub fn read(&mut self, prompt: &str) -> Result<Prompted> {
        if self.cancel.is_cancelled() {
            return Ok(Prompted::Exit);
        }

        match self.editor.readline(&prompt.cyan().bold().to_string()) {
            Ok(line) => {
                let line = line.trim().to_string();
                if is_exit_word(&line) {
                    return Ok(Prompted::Exit);
                }
                if !line.is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Prompted::Line(line))
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                self.cancel.cancel();
                Ok(Prompted::Exit)
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                self.cancel.cancel();
                Ok(Prompted::Exit)
            }
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                Err(err.into())
            }
        }
    }

    /// Wait for Enter before redrawing the menu
    pub fn pause(&mut self) -> Result<Prompted> {
        self.read("Press Enter...")
    }
}
