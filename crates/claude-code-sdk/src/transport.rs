use std::path::Path;
use std::process::Stdio;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::bytes::{Bytes, BytesMut};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder, FramedRead};
use tokio_util::sync::CancellationToken;

use crate::options::{ClaudeCodeOptions, TransportConfig};
use crate::types::RawMessage;
use crate::{ClaudeCodeError, Result};

// ─── Transport ────────────────────────────────────────────────────────────

/// A running `claude` subprocess with its three pipes.
///
/// `send` writes one `{"prompt": ...}` line to stdin, `receive` yields one
/// validated JSON line from stdout, and a background task turns stderr lines
/// into pending errors that the next `receive` reports before reading.
///
/// `send` and `close` share one lock over stdin, the child and the closed
/// flag. `receive` reads under a separate lock so that `close` can cancel
/// an in-flight read.
pub struct Transport {
    process: Mutex<ProcessState>,
    reader: Mutex<Option<LineReader>>,
    /// Cancellation requested by whoever owns the session.
    caller: CancellationToken,
    /// Cancelled by `close`, or when `caller` is cancelled.
    cancel: CancellationToken,
    config: TransportConfig,
}

struct ProcessState {
    child: Child,
    stdin: Option<ChildStdin>,
    monitor: Option<JoinHandle<()>>,
    closed: bool,
}

struct LineReader {
    lines: FramedRead<ChildStdout, LineCodec>,
    /// Single-slot handoff from the stderr monitor.
    errors: mpsc::Receiver<ClaudeCodeError>,
}

impl Transport {
    /// Start `cli_path` with `args` and piped stdio.
    ///
    /// `CLAUDECODE` is removed from the environment so the SDK also works
    /// when called from inside a running Claude session.
    pub fn spawn(
        cli_path: &Path,
        args: &[String],
        opts: &ClaudeCodeOptions,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let mut cmd = Command::new(cli_path);
        cmd.args(args).env_remove("CLAUDECODE");

        for (k, v) in &opts.env {
            cmd.env(k, v);
        }

        if let Some(cwd) = &opts.cwd {
            cmd.current_dir(cwd);
        }

        tracing::debug!(cli = %cli_path.display(), args = args.len(), "spawning claude");
        Self::from_command(cmd, opts.transport, cancel)
    }

    fn from_command(
        mut cmd: Command,
        config: TransportConfig,
        caller: CancellationToken,
    ) -> Result<Self> {
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|source| ClaudeCodeError::ProcessSpawn { source })?;

        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClaudeCodeError::transport("stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ClaudeCodeError::transport("stderr not captured"))?;

        let (err_tx, err_rx) = mpsc::channel(1);
        let monitor = tokio::spawn(monitor_stderr(stderr, config.max_line_bytes, err_tx));
        let lines = FramedRead::new(stdout, LineCodec::new(config.max_line_bytes));

        Ok(Self {
            process: Mutex::new(ProcessState {
                child,
                stdin,
                monitor: Some(monitor),
                closed: false,
            }),
            reader: Mutex::new(Some(LineReader {
                lines,
                errors: err_rx,
            })),
            cancel: caller.child_token(),
            caller,
            config,
        })
    }

    /// Write `{"prompt": <prompt>}` followed by a newline to stdin.
    pub async fn send(&self, prompt: &str) -> Result<()> {
        let mut process = self.process.lock().await;
        if process.closed {
            return Err(ClaudeCodeError::TransportClosed);
        }
        if self.cancel.is_cancelled() {
            return Err(ClaudeCodeError::Cancelled);
        }
        let stdin = process
            .stdin
            .as_mut()
            .ok_or(ClaudeCodeError::TransportClosed)?;

        let mut buf = serde_json::to_vec(&serde_json::json!({ "prompt": prompt }))
            .map_err(|e| ClaudeCodeError::transport_with("failed to marshal input", e))?;
        buf.push(b'\n');

        let write = async {
            stdin.write_all(&buf).await?;
            stdin.flush().await
        };
        tokio::select! {
            _ = self.cancel.cancelled() => Err(ClaudeCodeError::Cancelled),
            written = write => {
                written.map_err(|e| ClaudeCodeError::transport_with("failed to write to stdin", e))?;
                tracing::debug!(bytes = buf.len(), "prompt sent");
                Ok(())
            }
        }
    }

    /// Read the next JSON line from stdout.
    ///
    /// A pending stderr error is returned before any data is read. Blank
    /// lines are skipped. Returns `Ok(None)` when stdout ends cleanly.
    pub async fn receive(&self) -> Result<Option<RawMessage>> {
        if self.process.lock().await.closed {
            return Err(ClaudeCodeError::TransportClosed);
        }

        let mut guard = self.reader.lock().await;
        let reader = guard.as_mut().ok_or(ClaudeCodeError::TransportClosed)?;
        let read_timeout = self.config.read_timeout;

        loop {
            if let Ok(err) = reader.errors.try_recv() {
                return Err(err);
            }
            if self.cancel.is_cancelled() {
                return Err(ClaudeCodeError::Cancelled);
            }

            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(ClaudeCodeError::Cancelled),
                _ = tokio::time::sleep(read_timeout) => {
                    return Err(ClaudeCodeError::Timeout(read_timeout));
                }
                next = reader.lines.next() => next,
            };

            match next {
                Some(Ok(Frame::Line(bytes))) => {
                    let Ok(line) = std::str::from_utf8(&bytes) else {
                        let data = String::from_utf8_lossy(&bytes);
                        return Err(ClaudeCodeError::parse("invalid JSON", data.trim()));
                    };
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    return RawMessage::new(line)
                        .map(Some)
                        .map_err(|data| ClaudeCodeError::parse("invalid JSON", data));
                }
                Some(Ok(Frame::Overflow)) => {
                    return Err(ClaudeCodeError::BufferOverflow {
                        limit: self.config.max_line_bytes,
                    });
                }
                Some(Err(e)) => {
                    return Err(ClaudeCodeError::transport_with(
                        "failed to read from stdout",
                        e,
                    ));
                }
                None => {
                    return match reader.errors.try_recv() {
                        Ok(err) => Err(err),
                        Err(_) => Ok(None),
                    };
                }
            }
        }
    }

    /// Shut the session down. Idempotent.
    ///
    /// Closes all pipes, then waits up to the grace period for the CLI to
    /// exit before killing it. When the caller cancelled the session the
    /// CLI is killed without waiting. Only an abnormal exit observed during
    /// the graceful wait is reported.
    pub async fn close(&self) -> Result<()> {
        self.cancel.cancel();

        let mut process = self.process.lock().await;
        if process.closed {
            return Ok(());
        }
        process.closed = true;

        process.stdin.take();
        if let Some(monitor) = process.monitor.take() {
            monitor.abort();
        }
        self.reader.lock().await.take();

        if self.caller.is_cancelled() {
            tracing::debug!("session cancelled; killing claude");
            kill(&mut process.child).await;
            return Ok(());
        }

        let grace = self.config.close_grace;
        match tokio::time::timeout(grace, process.child.wait()).await {
            Ok(Ok(status)) if status.success() => Ok(()),
            Ok(Ok(status)) => Err(ClaudeCodeError::transport_with(
                "process exited with error",
                std::io::Error::other(status.to_string()),
            )),
            Ok(Err(e)) => Err(ClaudeCodeError::transport_with(
                "failed to wait for CLI process",
                e,
            )),
            Err(_) => {
                tracing::debug!(?grace, "claude did not exit in time; killing");
                kill(&mut process.child).await;
                Ok(())
            }
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.process.lock().await.closed
    }
}

async fn kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        tracing::warn!(error = %e, "failed to kill claude process");
    }
}

// ─── Line framing ─────────────────────────────────────────────────────────

/// One newline-delimited frame from a child pipe.
#[derive(Debug)]
enum Frame {
    /// Raw line bytes, newline excluded. Not yet checked as UTF-8.
    Line(Bytes),
    /// A line longer than the limit. The codec discards it up to the next
    /// newline and keeps framing after it.
    Overflow,
}

/// Bounded byte-level line framing.
///
/// An overlong line is yielded as [`Frame::Overflow`] instead of a decoder
/// error, so `FramedRead` never reports a spurious end of stream after it.
struct LineCodec(AnyDelimiterCodec);

impl LineCodec {
    fn new(max_line_bytes: usize) -> Self {
        LineCodec(AnyDelimiterCodec::new_with_max_length(
            b"\n".to_vec(),
            Vec::new(),
            max_line_bytes,
        ))
    }
}

impl Decoder for LineCodec {
    type Item = Frame;
    type Error = std::io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> std::io::Result<Option<Frame>> {
        to_frame(self.0.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> std::io::Result<Option<Frame>> {
        to_frame(self.0.decode_eof(buf))
    }
}

fn to_frame(
    decoded: std::result::Result<Option<Bytes>, AnyDelimiterCodecError>,
) -> std::io::Result<Option<Frame>> {
    match decoded {
        Ok(line) => Ok(line.map(Frame::Line)),
        Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => Ok(Some(Frame::Overflow)),
        Err(AnyDelimiterCodecError::Io(e)) => Err(e),
    }
}

// ─── Error monitor ────────────────────────────────────────────────────────

/// Drain stderr, offering each non-empty line as a pending error.
///
/// Lines are bounded like stdout lines; invalid UTF-8 is replaced.
async fn monitor_stderr(
    stderr: ChildStderr,
    max_line_bytes: usize,
    errors: mpsc::Sender<ClaudeCodeError>,
) {
    let mut lines = FramedRead::new(stderr, LineCodec::new(max_line_bytes));
    while let Some(frame) = lines.next().await {
        match frame {
            Ok(Frame::Line(bytes)) => {
                let line = String::from_utf8_lossy(&bytes);
                let line = line.trim_end_matches('\r');
                if line.trim().is_empty() {
                    continue;
                }
                tracing::debug!(%line, "claude stderr");
                offer(
                    &errors,
                    ClaudeCodeError::Cli {
                        message: line.to_owned(),
                        code: 1,
                    },
                );
            }
            Ok(Frame::Overflow) => offer(
                &errors,
                ClaudeCodeError::Cli {
                    message: format!("stderr line exceeds {max_line_bytes} bytes"),
                    code: 1,
                },
            ),
            Err(e) => {
                offer(
                    &errors,
                    ClaudeCodeError::transport_with("error reading stderr", e),
                );
                break;
            }
        }
    }
}

/// Non-blocking hand-off; the error is dropped when the slot is occupied.
fn offer(errors: &mpsc::Sender<ClaudeCodeError>, err: ClaudeCodeError) {
    if let Err(mpsc::error::TrySendError::Full(dropped)) = errors.try_send(err) {
        tracing::debug!(error = %dropped, "pending error slot full; dropping");
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
