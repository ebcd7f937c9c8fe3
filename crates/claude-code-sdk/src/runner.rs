use futures::StreamExt;

use crate::stream::QueryStream;
use crate::types::{Message, ResultMessage};
use crate::{query, ClaudeCodeError, ClaudeCodeOptions, Result};

// ─── QueryOutcome ─────────────────────────────────────────────────────────

/// Everything a completed session produced.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// The terminal `result` message.
    pub result: ResultMessage,
    /// Every message in arrival order, the result included.
    pub messages: Vec<Message>,
}

impl QueryOutcome {
    /// The final answer text.
    pub fn text(&self) -> &str {
        self.result.text()
    }
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Run one prompt to completion and return its outcome.
///
/// Fails with the first error the session produced, or with a transport
/// error when the CLI exited without sending a `result` message.
///
/// ```rust,ignore
/// use claude_code_sdk::{query_simple, ClaudeCodeOptions};
///
/// let outcome = query_simple("What is 2+2?", ClaudeCodeOptions::default()).await?;
/// println!("{}", outcome.text());
/// ```
pub async fn query_simple(
    prompt: impl Into<String>,
    options: ClaudeCodeOptions,
) -> Result<QueryOutcome> {
    collect(query(prompt, options)).await
}

/// Drain `stream` to its end and gather its messages.
///
/// The stream is consumed fully so that an error reported after the result
/// message (such as an abnormal CLI exit) is not lost.
pub async fn collect(mut stream: QueryStream) -> Result<QueryOutcome> {
    let mut messages = Vec::new();
    let mut result = None;

    while let Some(msg) = stream.next().await {
        let msg = msg?;
        if let Message::Result(r) = &msg {
            result = Some(r.clone());
        }
        messages.push(msg);
    }

    let result = result.ok_or_else(|| ClaudeCodeError::transport("no result message received"))?;
    Ok(QueryOutcome { result, messages })
}

// ─── Tests ────────────────────────────────────────────────────────────────
