mod cli_options;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use claude_code_sdk::{collect, query_with_cancel, PermissionMode};
use futures::StreamExt;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(
    name = "claude-query",
    about = "Send one prompt to the claude CLI and stream the reply",
    version
)]
struct Cli {
    /// Prompt to send
    prompt: String,

    /// Wait for the whole session, then print a summary
    #[arg(long)]
    collect: bool,

    /// Print each message as a JSON line
    #[arg(long, short = 'j')]
    json: bool,

    /// Show system messages and debug logs
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Model name
    #[arg(long)]
    model: Option<String>,

    /// Tools the assistant may use (comma-separated)
    #[arg(long, value_delimiter = ',')]
    allowed_tools: Vec<String>,

    /// Tools the assistant must not use (comma-separated)
    #[arg(long, value_delimiter = ',')]
    disallowed_tools: Vec<String>,

    /// Text appended to the default system prompt
    #[arg(long)]
    append_system_prompt: Option<String>,

    /// default, acceptEdits, bypassPermissions or plan
    #[arg(long)]
    permission_mode: Option<PermissionMode>,

    /// Maximum agentic turns
    #[arg(long)]
    max_turns: Option<u32>,

    /// Continue the most recent conversation
    #[arg(long = "continue")]
    continue_conversation: bool,

    /// Session ID to resume
    #[arg(long)]
    resume: Option<String>,

    /// Working directory for the session
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Path to the claude executable. Without it the CLI is searched on
    /// PATH and in the usual install locations, then taken from
    /// CLAUDE_CLI_PATH.
    #[arg(long)]
    cli_path: Option<PathBuf>,

    /// JSON file with a full options snapshot; flags override its fields
    #[arg(long)]
    options_file: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = tokio::runtime::Runtime::new()
        .context("failed to start tokio runtime")
        .and_then(|rt| rt.block_on(run(cli)));

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let options = cli_options::build(&cli)?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("interrupt received; cancelling session");
                cancel.cancel();
            }
        }
    });

    let stream = query_with_cancel(cli.prompt.clone(), options, cancel);

    if cli.collect {
        let outcome = collect(stream).await.context("query failed")?;
        output::print_outcome(&outcome, cli.json)?;
        if outcome.result.is_error {
            anyhow::bail!("session ended with an error result");
        }
        return Ok(());
    }

    let mut stream = stream;
    let mut printer = output::StreamPrinter::new(cli.json, cli.verbose);
    while let Some(msg) = stream.next().await {
        let msg = msg.context("query failed")?;
        printer.print(&msg)?;
    }
    printer.finish()
}
