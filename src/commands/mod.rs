/*!
Command handlers for the CLI

The interactive menu lives in `menu`; the one-shot subcommands share the
same handlers:

- `sessions` lists, renames and deletes sessions
- `search` finds messages across sessions
- `export` writes a transcript to markdown
- `models` lists, shows and sets the active model

`input` holds the pure parsers for everything typed at a prompt, `prompt`
the line reader, and `display` the shared table and formatting helpers.
*/

use crate::session::SessionId;

pub mod display;
pub mod export;
pub mod input;
pub mod menu;
pub mod models;
pub mod prompt;
pub mod search;
pub mod sessions;

/// Where an interactive handler sends the menu loop next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Show the main menu again
    Back,
    /// Leave the program
    Exit,
    /// A new model was saved; restart
    Restart,
    /// Chat in an existing session
    Chat(SessionId),
    /// Chat in a brand new session
    NewChat,
}
