use serde::{Deserialize, Serialize};

use crate::decode::parse_content_block;
use crate::Result;

// ─── Raw line ─────────────────────────────────────────────────────────────

/// One stdout line that has been validated as JSON but not yet decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage(String);

impl RawMessage {
    /// Validate `line` as a JSON value. Returns the line back on failure.
    pub fn new(line: impl Into<String>) -> std::result::Result<Self, String> {
        let line = line.into();
        match serde_json::from_str::<serde::de::IgnoredAny>(&line) {
            Ok(_) => Ok(RawMessage(line)),
            Err(_) => Err(line),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

// ─── Message ──────────────────────────────────────────────────────────────

/// Discriminator values of [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    User,
    Assistant,
    System,
    Result,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::User => "user",
            MessageType::Assistant => "assistant",
            MessageType::System => "system",
            MessageType::Result => "result",
        }
    }
}

/// Every message emitted by `claude --output-format stream-json`.
/// Discriminated by the JSON `"type"` field.
///
/// Serialization produces the wire form; decoding goes through
/// [`crate::decode_message`], which rejects unknown discriminators.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    User(UserMessage),
    Assistant(AssistantMessage),
    System(SystemMessage),
    Result(ResultMessage),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::User(_) => MessageType::User,
            Message::Assistant(_) => MessageType::Assistant,
            Message::System(_) => MessageType::System,
            Message::Result(_) => MessageType::Result,
        }
    }

    /// `true` for the `result` message that ends a session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Message::Result(_))
    }

    pub fn as_result(&self) -> Option<&ResultMessage> {
        if let Message::Result(r) = self {
            Some(r)
        } else {
            None
        }
    }
}

/// `type = "user"`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UserMessage {
    #[serde(default)]
    pub content: String,
}

/// `type = "assistant"`: the model's response.
///
/// Content blocks are kept as raw JSON so that a block of an unknown kind
/// does not fail the whole message; decode them with [`Self::blocks`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AssistantMessage {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<serde_json::Value>,
    /// Nested envelope used by newer CLI versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<AssistantBody>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AssistantBody {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub content: Vec<serde_json::Value>,
}

impl AssistantMessage {
    /// Raw content blocks, from the top level or the nested envelope.
    pub fn content(&self) -> &[serde_json::Value] {
        match &self.message {
            Some(body) if self.content.is_empty() => &body.content,
            _ => &self.content,
        }
    }

    /// Decode each content block independently.
    pub fn blocks(&self) -> impl Iterator<Item = Result<ContentBlock>> + '_ {
        self.content().iter().map(parse_content_block)
    }

    /// Concatenated text of all text blocks; other blocks are skipped.
    pub fn text(&self) -> String {
        self.blocks()
            .filter_map(|b| match b {
                Ok(ContentBlock::Text { text }) => Some(text),
                _ => None,
            })
            .collect()
    }
}

/// `type = "system"`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SystemMessage {
    #[serde(default)]
    pub subtype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

// ─── Result message ───────────────────────────────────────────────────────

/// `type = "result"`, the terminal message of every session.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ResultMessage {
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Cost>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,

    // ── Fields emitted by current CLI versions ──
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_turns: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ResultMessage {
    /// The final answer: `result` when present, otherwise `content`.
    pub fn text(&self) -> &str {
        self.result.as_deref().unwrap_or(&self.content)
    }

    /// Total cost in USD, from whichever summary the CLI provided.
    pub fn total_cost(&self) -> Option<f64> {
        self.cost
            .as_ref()
            .map(|c| c.total_cost)
            .or(self.total_cost_usd)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session
            .as_ref()
            .map(|s| s.id.as_str())
            .or(self.session_id.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Cost {
    #[serde(default)]
    pub input_cached: u64,
    #[serde(default)]
    pub input_uncached: u64,
    #[serde(default)]
    pub output: u64,
    #[serde(default)]
    pub input_cached_cost: f64,
    #[serde(default)]
    pub input_uncached_cost: f64,
    #[serde(default)]
    pub output_cost: f64,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization_weights: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization_cost: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_creation_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_input_tokens: Option<u64>,
    #[serde(default)]
    pub total_tokens: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SessionInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_window: Option<u64>,
}

// ─── Content blocks ───────────────────────────────────────────────────────

/// Content blocks within an assistant message.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        /// Tool inputs are schema-polymorphic (varies per tool).
        #[serde(default)]
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        /// Either a string or an array of nested blocks, depending on the tool.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status_code: Option<i32>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<serde_json::Value>,
    },
}

impl ContentBlock {
    pub fn block_type(&self) -> &'static str {
        match self {
            ContentBlock::Text { .. } => "text",
            ContentBlock::ToolUse { .. } => "tool_use",
            ContentBlock::ToolResult { .. } => "tool_result",
        }
    }
}
