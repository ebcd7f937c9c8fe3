//! `claude-code-sdk` — drive the `claude` CLI as a subprocess and stream its
//! responses as typed messages.
//!
//! Each query spawns `claude --verbose --output-format stream-json …`, writes
//! the prompt to stdin as one JSON line and decodes the JSON lines the CLI
//! prints to stdout until the terminal `result` message.
//!
//! # Architecture
//!
//! ```text
//! ClaudeCodeOptions
//!     │  build_args / find_cli
//!     ▼
//! Transport       ← owns the child process and its three pipes
//!     │              stdout: bounded JSON lines; stderr: pending errors
//!     ▼
//! decode_message  ← reads the `type` discriminator, then the variant
//!     │
//!     ▼
//! QueryStream     ← futures::Stream<Item = Result<Message>>
//!                    background task + mpsc channel
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use claude_code_sdk::{query, ClaudeCodeOptions, Message};
//! use futures::StreamExt;
//!
//! let opts = ClaudeCodeOptions {
//!     model: Some("claude-sonnet-4-6".into()),
//!     max_turns: Some(3),
//!     ..Default::default()
//! };
//!
//! let mut stream = query("What is 2+2?", opts);
//! while let Some(msg) = stream.next().await {
//!     match msg? {
//!         Message::Assistant(a) => print!("{}", a.text()),
//!         Message::Result(r) => println!("\ncost: {:?}", r.total_cost()),
//!         _ => {}
//!     }
//! }
//! ```

pub mod decode;
pub mod discovery;
pub mod error;
pub mod options;
pub mod runner;
pub mod stream;
pub mod transport;
pub mod types;

#[cfg(test)]
mod tests;

use tokio_util::sync::CancellationToken;

pub use decode::{decode_message, parse_content_block};
pub use discovery::{find_cli, CLI_PATH_ENV_VAR};
pub use error::ClaudeCodeError;
pub use options::{
    build_args, ClaudeCodeOptions, McpRemoteConfig, McpServerConfig, McpStdioConfig,
    McpTransportType, PermissionMode, TransportConfig, DEFAULT_CLOSE_GRACE,
    DEFAULT_READ_TIMEOUT, MAX_BUFFER_SIZE,
};
pub use runner::{collect, query_simple, QueryOutcome};
pub use stream::QueryStream;
pub use transport::Transport;
pub use types::{
    AssistantBody, AssistantMessage, ContentBlock, Cost, Message, MessageType, RawMessage,
    ResultMessage, SessionInfo, SystemMessage, Usage, UserMessage,
};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, ClaudeCodeError>;

/// Start a session for `prompt` and stream its messages.
///
/// The returned stream ends after the `result` message, a clean end of CLI
/// output, or the first error, which is always the last item. Must be called
/// from within a Tokio runtime.
pub fn query(prompt: impl Into<String>, options: ClaudeCodeOptions) -> QueryStream {
    query_with_cancel(prompt, options, CancellationToken::new())
}

/// Like [`query`], but the session is also cancelled when `cancel` is.
///
/// On cancellation the pending read returns [`ClaudeCodeError::Cancelled`]
/// and the subprocess is killed without waiting for it to exit.
pub fn query_with_cancel(
    prompt: impl Into<String>,
    options: ClaudeCodeOptions,
    cancel: CancellationToken,
) -> QueryStream {
    QueryStream::new(prompt.into(), options, cancel)
}
