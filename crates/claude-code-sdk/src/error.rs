use std::time::Duration;

use thiserror::Error;

/// Boxed cause carried by [`ClaudeCodeError::Transport`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ClaudeCodeError {
    #[error("claude CLI not found")]
    CliNotFound,

    #[error("failed to start CLI process: {source}")]
    ProcessSpawn {
        #[source]
        source: std::io::Error,
    },

    #[error("transport is closed")]
    TransportClosed,

    #[error("buffer overflow: line exceeds {limit} bytes")]
    BufferOverflow { limit: usize },

    #[error("parse error: {message} (data: {data})")]
    Parse { message: String, data: String },

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("operation cancelled")]
    Cancelled,

    /// A diagnostic line the CLI wrote to stderr.
    #[error("CLI error (code {code}): {message}")]
    Cli { message: String, code: i32 },

    #[error("transport error: {message}{}", fmt_cause(.source))]
    Transport {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl ClaudeCodeError {
    pub(crate) fn parse(message: impl Into<String>, data: impl Into<String>) -> Self {
        ClaudeCodeError::Parse {
            message: message.into(),
            data: data.into(),
        }
    }

    pub(crate) fn transport(message: impl Into<String>) -> Self {
        ClaudeCodeError::Transport {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn transport_with(
        message: impl Into<String>,
        cause: impl Into<BoxError>,
    ) -> Self {
        ClaudeCodeError::Transport {
            message: message.into(),
            source: Some(cause.into()),
        }
    }
}

fn fmt_cause(source: &Option<BoxError>) -> String {
    match source {
        Some(cause) => format!(": {cause}"),
        None => String::new(),
    }
}
