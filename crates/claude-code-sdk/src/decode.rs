//! Two-phase decoding: read only the `type` discriminator, then decode the
//! selected variant in full.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::types::{
    AssistantMessage, ContentBlock, Message, RawMessage, ResultMessage, SystemMessage,
    UserMessage,
};
use crate::{ClaudeCodeError, Result};

#[derive(Deserialize)]
struct Discriminator {
    #[serde(rename = "type")]
    kind: String,
}

/// Decode one stdout line into a [`Message`].
///
/// Fails with [`ClaudeCodeError::Parse`] carrying the raw line when the
/// discriminator is missing, malformed or unknown, or when the payload does
/// not match the selected variant.
pub fn decode_message(raw: &RawMessage) -> Result<Message> {
    let data = raw.as_str();
    let Discriminator { kind } = serde_json::from_str(data)
        .map_err(|_| ClaudeCodeError::parse("failed to parse message type", data))?;

    match kind.as_str() {
        "user" => variant::<UserMessage>(data, "user").map(Message::User),
        "assistant" => variant::<AssistantMessage>(data, "assistant").map(Message::Assistant),
        "system" => variant::<SystemMessage>(data, "system").map(Message::System),
        "result" => variant::<ResultMessage>(data, "result").map(Message::Result),
        other => Err(ClaudeCodeError::parse(
            format!("unknown message type: {other}"),
            data,
        )),
    }
}

fn variant<T: DeserializeOwned>(data: &str, kind: &str) -> Result<T> {
    serde_json::from_str(data)
        .map_err(|e| ClaudeCodeError::parse(format!("failed to parse {kind} message: {e}"), data))
}

/// Decode one entry of an assistant message's `content` array.
///
/// An unknown block kind is an error for that block only; callers iterating
/// over a message's blocks are expected to skip it.
pub fn parse_content_block(value: &serde_json::Value) -> Result<ContentBlock> {
    let data = || value.to_string();

    let kind = match value.get("type") {
        None => {
            return Err(ClaudeCodeError::parse(
                "missing 'type' field in content block",
                data(),
            ))
        }
        Some(serde_json::Value::String(kind)) => kind.as_str(),
        Some(_) => {
            return Err(ClaudeCodeError::parse(
                "malformed 'type' field in content block",
                data(),
            ))
        }
    };

    match kind {
        "text" | "tool_use" | "tool_result" => ContentBlock::deserialize(value).map_err(|e| {
            ClaudeCodeError::parse(format!("failed to parse {kind} block: {e}"), data())
        }),
        other => Err(ClaudeCodeError::parse(
            format!("unknown content block type: {other}"),
            data(),
        )),
    }
}
