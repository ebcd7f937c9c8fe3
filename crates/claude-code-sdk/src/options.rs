use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Longest stdout line (newline excluded) the line reader will buffer.
pub const MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// How long a single stdout read may wait for data.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// How long `close` waits for the CLI to exit before killing it.
pub const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(5);

// ─── ClaudeCodeOptions ────────────────────────────────────────────────────

/// Options for a single `claude` invocation.
///
/// Every CLI-facing field maps 1:1 onto a command-line flag (see
/// [`build_args`]). The snapshot is consumed once when the session starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaudeCodeOptions {
    /// Tools the assistant may use without prompting (`--allowedTools`)
    pub allowed_tools: Vec<String>,
    /// Tools the assistant must not use (`--disallowedTools`)
    pub disallowed_tools: Vec<String>,
    /// Text appended to the default system prompt
    pub append_system_prompt: Option<String>,
    /// Permission mode for tool execution
    pub permission_mode: Option<PermissionMode>,
    /// Continue the most recent conversation
    pub continue_conversation: bool,
    /// Session ID to resume
    pub resume: Option<String>,
    /// Maximum number of agentic turns
    pub max_turns: Option<u32>,
    /// Model name (e.g. `"claude-sonnet-4-6"`)
    pub model: Option<String>,
    /// MCP tool used to answer permission prompts
    pub permission_prompt_tool_name: Option<String>,
    /// Working directory for the session
    pub cwd: Option<PathBuf>,
    /// MCP servers, each passed as one `--mcp-server` JSON object
    pub mcp_servers: Vec<McpServerConfig>,
    /// MCP tool descriptors, each passed verbatim as one `--mcp-tool` value
    pub mcp_tools: Vec<serde_json::Value>,

    // ── Launch settings (not forwarded as flags) ──
    /// Explicit path to the `claude` binary; skips discovery when it exists
    pub path_to_executable: Option<PathBuf>,
    /// Additional environment variables for the subprocess
    pub env: HashMap<String, String>,
    /// Pipe-level limits for the transport
    pub transport: TransportConfig,
}

/// Timeouts and framing limits applied by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub read_timeout: Duration,
    pub close_grace: Duration,
    pub max_line_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            close_grace: DEFAULT_CLOSE_GRACE,
            max_line_bytes: MAX_BUFFER_SIZE,
        }
    }
}

/// Permission mode — controls how tool executions are authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    /// Standard: prompts for dangerous operations
    Default,
    /// Auto-accept file edit operations
    AcceptEdits,
    /// Bypass all permission checks
    BypassPermissions,
    /// Planning mode; no tool execution
    Plan,
}

impl PermissionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionMode::Default => "default",
            PermissionMode::AcceptEdits => "acceptEdits",
            PermissionMode::BypassPermissions => "bypassPermissions",
            PermissionMode::Plan => "plan",
        }
    }
}

impl std::str::FromStr for PermissionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(PermissionMode::Default),
            "acceptEdits" => Ok(PermissionMode::AcceptEdits),
            "bypassPermissions" => Ok(PermissionMode::BypassPermissions),
            "plan" => Ok(PermissionMode::Plan),
            other => Err(format!("unknown permission mode: {other}")),
        }
    }
}

// ─── MCP server descriptors ───────────────────────────────────────────────

/// One MCP server, serialized as `{"type":"stdio","stdio_config":{...}}`
/// (or `sse_config` / `http_config`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum McpServerConfig {
    Stdio { stdio_config: McpStdioConfig },
    Sse { sse_config: McpRemoteConfig },
    Http { http_config: McpRemoteConfig },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpStdioConfig {
    pub command: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

/// Configuration shared by the SSE and HTTP server kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpRemoteConfig {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transports: Vec<McpTransportType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McpTransportType {
    Http,
    Sse,
}

// ─── Argument builder ─────────────────────────────────────────────────────

/// Flags present on every invocation: verbose stream-json output with
/// permission prompts skipped.
pub const FIXED_ARGS: [&str; 4] = [
    "--verbose",
    "--output-format",
    "stream-json",
    "--dangerously-skip-permissions",
];

/// Build the `claude` argument list for `opts`.
///
/// The prompt is not an argument; it is written to stdin by the transport.
pub fn build_args(opts: &ClaudeCodeOptions) -> Vec<String> {
    let mut args: Vec<String> = FIXED_ARGS.iter().map(|s| (*s).to_string()).collect();

    if !opts.allowed_tools.is_empty() {
        args.push("--allowedTools".into());
        args.push(opts.allowed_tools.join(","));
    }

    if let Some(append) = &opts.append_system_prompt {
        args.push("--append-system-prompt".into());
        args.push(append.clone());
    }

    if let Some(mode) = opts.permission_mode {
        args.push("--permission-mode".into());
        args.push(mode.as_str().into());
    }

    if opts.continue_conversation {
        args.push("--continue".into());
    }

    if let Some(resume) = &opts.resume {
        args.push("--resume".into());
        args.push(resume.clone());
    }

    if let Some(max_turns) = opts.max_turns {
        args.push("--max-turns".into());
        args.push(max_turns.to_string());
    }

    if !opts.disallowed_tools.is_empty() {
        args.push("--disallowedTools".into());
        args.push(opts.disallowed_tools.join(","));
    }

    if let Some(model) = &opts.model {
        args.push("--model".into());
        args.push(model.clone());
    }

    if let Some(tool) = &opts.permission_prompt_tool_name {
        args.push("--permission-prompt-tool-name".into());
        args.push(tool.clone());
    }

    if let Some(cwd) = &opts.cwd {
        args.push("--cwd".into());
        args.push(cwd.to_string_lossy().into_owned());
    }

    for server in &opts.mcp_servers {
        match serde_json::to_string(server) {
            Ok(json) => {
                args.push("--mcp-server".into());
                args.push(json);
            }
            Err(e) => tracing::warn!(error = %e, "skipping unserializable MCP server"),
        }
    }

    for tool in &opts.mcp_tools {
        args.push("--mcp-tool".into());
        args.push(tool.to_string());
    }

    args
}
