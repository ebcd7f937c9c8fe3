use anyhow::{Context, Result};
use claude_code_sdk::ClaudeCodeOptions;

use crate::Cli;

/// Start from `--options-file` (or defaults) and apply every flag given.
pub fn build(cli: &Cli) -> Result<ClaudeCodeOptions> {
    let mut opts = match &cli.options_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid options file {}", path.display()))?
        }
        None => ClaudeCodeOptions::default(),
    };

    if cli.model.is_some() {
        opts.model = cli.model.clone();
    }
    if !cli.allowed_tools.is_empty() {
        opts.allowed_tools = cli.allowed_tools.clone();
    }
    if !cli.disallowed_tools.is_empty() {
        opts.disallowed_tools = cli.disallowed_tools.clone();
    }
    if cli.append_system_prompt.is_some() {
        opts.append_system_prompt = cli.append_system_prompt.clone();
    }
    if cli.permission_mode.is_some() {
        opts.permission_mode = cli.permission_mode;
    }
    if cli.max_turns.is_some() {
        opts.max_turns = cli.max_turns;
    }
    if cli.continue_conversation {
        opts.continue_conversation = true;
    }
    if cli.resume.is_some() {
        opts.resume = cli.resume.clone();
    }
    if cli.cwd.is_some() {
        opts.cwd = cli.cwd.clone();
    }
    if cli.cli_path.is_some() {
        opts.path_to_executable = cli.cli_path.clone();
    }

    Ok(opts)
}
