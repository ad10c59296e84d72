//! Message search commands

use crate::app::AppContext;
use crate::commands::display::{print_error, print_full_message, print_search_results};
use crate::commands::input::{parse_search_selection, SearchSelection};
use crate::commands::prompt::{Prompted, Prompter};
use crate::commands::Flow;
use crate::error::Result;
use crate::session::{display_label, SessionId};
use colored::Colorize;

/// Search all sessions and print the newest matches
pub fn search_messages(app: &AppContext, query: &str, limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(app.config.chat.search_page_size);
    let hits = app.storage.search(query, limit)?;
    if hits.is_empty() {
        println!("{}", "No results.".yellow());
        return Ok(());
    }
    print_search_results(query.trim(), &hits);
    Ok(())
}

/// Interactive search: query, list, then view a message or jump into its
/// session
pub(crate) fn search_menu(app: &AppContext, prompter: &mut Prompter) -> Result<Flow> {
    let query = match prompter.read("\nSearch query (or 'exit'): ")? {
        Prompted::Exit => return Ok(Flow::Exit),
        Prompted::Line(query) => query,
    };
    if query.is_empty() {
        return Ok(Flow::Back);
    }

    let hits = match app.storage.search(&query, app.config.chat.search_page_size) {
        Ok(hits) => hits,
        Err(e) => {
            print_error(e);
            return Ok(Flow::Back);
        }
    };
    if hits.is_empty() {
        println!("{}", "No results.".red());
        return Ok(Flow::Back);
    }
    print_search_results(&query, &hits);

    let line = match prompter.read("View #, 's#' to chat, or Enter: ")? {
        Prompted::Exit => return Ok(Flow::Exit),
        Prompted::Line(line) => line,
    };

    match parse_search_selection(&line, hits.len()) {
        Ok(SearchSelection::Back) => Ok(Flow::Back),
        Ok(SearchSelection::View(index)) => {
            print_full_message(&hits[index].message);
            Ok(match prompter.pause()? {
                Prompted::Exit => Flow::Exit,
                Prompted::Line(_) => Flow::Back,
            })
        }
        Ok(SearchSelection::Jump(index)) => {
            let hit = &hits[index];
            let session_id = hit.message.session_id.as_str();
            println!(
                "{}",
                format!(
                    "Jumped to: {}",
                    display_label(session_id, hit.session_name.as_deref())
                )
                .green()
            );
            Ok(Flow::Chat(SessionId::from(session_id)))
        }
        Err(e) => {
            print_error(e);
            Ok(Flow::Back)
        }
    }
}
