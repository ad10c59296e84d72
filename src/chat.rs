//! Conversational turns
//!
//! A turn is: assemble context from stored history, call the provider, and
//! only on success write the user and assistant messages together. A failed
//! or cancelled call leaves the store untouched, so the session can simply
//! continue with the next prompt.

use crate::app::AppContext;
use crate::context::build_context;
use crate::error::{as_parley_error, ParleyError, Result};
use crate::providers::TokenUsage;
use crate::storage::MessageId;
use tokio_util::sync::CancellationToken;

/// A completed, persisted turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Raw reply as stored
    pub reply: String,
    /// Token usage, when the backend reports it
    pub usage: Option<TokenUsage>,
    /// Row id of the stored user message
    pub user_message_id: MessageId,
    /// Row id of the stored assistant message
    pub assistant_message_id: MessageId,
}

/// Run one turn for `session_id`
///
/// The provider call is raced against `cancel`; cancellation abandons the
/// call and nothing is written.
///
/// # Errors
///
/// * `ParleyError::Inference` when the provider fails
/// * `ParleyError::Cancelled` when `cancel` fires first
/// * `ParleyError::StorageUnavailable` when history cannot be read or the
///   turn cannot be written
pub async fn run_turn(
    app: &AppContext,
    session_id: &str,
    prompt: &str,
    cancel: &CancellationToken,
) -> Result<TurnOutcome> {
    let messages = build_context(&app.storage, session_id, prompt, app.config.chat.context_window)?;
    let model = app.model();

    let response = tokio::select! {
        _ = cancel.cancelled() => {
            tracing::info!(session_id, "Turn cancelled before reply");
            return Err(ParleyError::Cancelled.into());
        }
        result = app.provider.complete(model, &messages) => result,
    };

    let response = response.map_err(|e| {
        tracing::warn!(session_id, "Inference failed: {}", e);
        match as_parley_error(&e) {
            Some(_) => e,
            None => ParleyError::Inference(e.to_string()).into(),
        }
    })?;

    let (user_message_id, assistant_message_id) =
        app.storage
            .append_turn(session_id, prompt, &response.content, model)?;

    Ok(TurnOutcome {
        reply: response.content,
        usage: response.usage,
        user_message_id,
        assistant_message_id,
    })
}

/// Tidy a reply for terminal display
///
/// Outside fenced code blocks, trailing whitespace is stripped and runs of
/// blank lines collapse to one; fenced blocks are kept verbatim. Leading and
/// trailing blank lines are dropped. The stored reply is never altered.
///
/// # Examples
///
/// ```
/// use parley::chat::clean_reply;
///
/// let raw = "\n\nHello   \n\n\n\nWorld\n";
/// assert_eq!(clean_reply(raw), "Hello\n\nWorld");
/// ```
pub fn clean_reply(reply: &str) -> String {
    let mut cleaned: Vec<&str> = Vec::new();
    let mut in_code_block = false;

    for line in reply.trim().lines() {
        if line.trim().starts_with("```") {
            in_code_block = !in_code_block;
            cleaned.push(line);
            continue;
        }
        if in_code_block {
            cleaned.push(line);
            continue;
        }
        let stripped = line.trim_end();
        let previous_has_text = cleaned.last().is_some_and(|l| !l.trim().is_empty());
        if !stripped.is_empty() || previous_has_text {
            cleaned.push(stripped);
        }
    }

    while cleaned.first().is_some_and(|l| l.trim().is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|l| l.trim().is_empty()) {
        cleaned.pop();
    }
    cleaned.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_reply_keeps_code_blocks_verbatim() {
        let raw = "Here:\n\n```python\ndef f():   \n\n\n    return 1\n```\n\n\nDone  ";
        assert_eq!(
            clean_reply(raw),
            "Here:\n\n```python\ndef f():   \n\n\n    return 1\n```\n\nDone"
        );
    }

    #[test]
    fn test_clean_reply_empty() {
        assert_eq!(clean_reply("   \n\n  "), "");
    }
}
