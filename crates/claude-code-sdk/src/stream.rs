use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::decode::decode_message;
use crate::discovery::find_cli;
use crate::options::{build_args, ClaudeCodeOptions};
use crate::transport::Transport;
use crate::types::Message;
use crate::{ClaudeCodeError, Result};

// ─── QueryStream ──────────────────────────────────────────────────────────

/// An async stream of [`Message`]s from one `claude` session.
///
/// A background task owns the [`Transport`]. It sends the prompt, then
/// forwards decoded messages until the terminal `result` message, a clean
/// end of output, or the first error. Errors are yielded as the last item.
/// The subprocess is always closed before the stream ends.
///
/// Dropping `QueryStream` cancels the session and kills the subprocess.
///
/// ```rust,ignore
/// use claude_code_sdk::{query, ClaudeCodeOptions, Message};
/// use futures::StreamExt;
///
/// let mut stream = query("say hello", ClaudeCodeOptions::default());
/// while let Some(msg) = stream.next().await {
///     if let Message::Result(r) = msg? {
///         println!("{}", r.text());
///     }
/// }
/// ```
pub struct QueryStream {
    rx: mpsc::Receiver<Result<Message>>,
    _cancel_on_drop: DropGuard,
}

impl QueryStream {
    pub(crate) fn new(prompt: String, opts: ClaudeCodeOptions, cancel: CancellationToken) -> Self {
        let session = cancel.child_token();
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn({
            let session = session.clone();
            async move {
                let cli = match find_cli(opts.path_to_executable.as_deref()) {
                    Ok(cli) => cli,
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                };
                let args = build_args(&opts);
                run_session(prompt, cli, args, opts, session, tx).await;
            }
        });

        QueryStream {
            rx,
            _cancel_on_drop: session.drop_guard(),
        }
    }

    /// Run a session against an already-resolved command line.
    #[cfg(test)]
    pub(crate) fn with_command(
        prompt: &str,
        cli: PathBuf,
        args: Vec<String>,
        opts: ClaudeCodeOptions,
        cancel: CancellationToken,
    ) -> Self {
        let session = cancel.child_token();
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(run_session(
            prompt.to_owned(),
            cli,
            args,
            opts,
            session.clone(),
            tx,
        ));
        QueryStream {
            rx,
            _cancel_on_drop: session.drop_guard(),
        }
    }

    /// Wrap a pre-filled channel, for tests that don't need a subprocess.
    #[cfg(test)]
    pub(crate) fn from_channel(rx: mpsc::Receiver<Result<Message>>) -> Self {
        QueryStream {
            rx,
            _cancel_on_drop: CancellationToken::new().drop_guard(),
        }
    }
}

impl Stream for QueryStream {
    type Item = Result<Message>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

// ─── Session task ─────────────────────────────────────────────────────────

async fn run_session(
    prompt: String,
    cli: PathBuf,
    args: Vec<String>,
    opts: ClaudeCodeOptions,
    cancel: CancellationToken,
    tx: mpsc::Sender<Result<Message>>,
) {
    let transport = match Transport::spawn(&cli, &args, &opts, cancel.clone()) {
        Ok(t) => t,
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            return;
        }
    };

    let outcome = forward_messages(&transport, &prompt, &cancel, &tx).await;
    if let Err(e) = &outcome {
        tracing::debug!(error = %e, "session ended with error");
    }

    // The session error goes out first; close may wait out the grace period.
    let failed = match outcome {
        Ok(()) => false,
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            true
        }
    };

    match transport.close().await {
        Ok(()) => {}
        Err(e) if failed => tracing::warn!(error = %e, "close failed after session error"),
        Err(e) => {
            let _ = tx.send(Err(e)).await;
        }
    }
}

/// Send the prompt, then forward messages until a terminal message or EOF.
async fn forward_messages(
    transport: &Transport,
    prompt: &str,
    cancel: &CancellationToken,
    tx: &mpsc::Sender<Result<Message>>,
) -> Result<()> {
    transport.send(prompt).await?;

    while let Some(raw) = transport.receive().await? {
        let msg = decode_message(&raw)?;
        tracing::debug!(kind = msg.message_type().as_str(), "message");
        let terminal = msg.is_terminal();

        tokio::select! {
            _ = cancel.cancelled() => return Err(ClaudeCodeError::Cancelled),
            sent = tx.send(Ok(msg)) => {
                if sent.is_err() {
                    // Receiver dropped; nobody is listening.
                    return Ok(());
                }
            }
        }

        if terminal {
            return Ok(());
        }
    }

    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────
