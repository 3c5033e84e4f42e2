//! Shared frame model and JSON codec for the agent chat websocket.
//!
//! Inbound frames are loosely typed on the wire: `content` may be a string or
//! structured JSON, and `source` is an opaque label that only sometimes names
//! a known agent. This crate keeps those fields flexible and leaves meaning to
//! the session layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error returned by [`decode_frame`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text payload is not valid JSON or does not have the frame shape.
    #[error("failed to decode frame: {0}")]
    Json(#[from] serde_json::Error),
}

/// Kind of an inbound frame, taken from its `type` field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameType {
    /// A complete chat message, from an agent or a control message from the server.
    TextMessage,
    /// An agent asked for a tool to be run.
    ToolCallRequestEvent,
    /// A tool finished running on behalf of an agent.
    ToolCallExecutionEvent,
    /// An agent is composing a reply.
    TypingMessage,
    /// Any `type` this client does not understand.
    #[serde(other)]
    Unknown,
}

impl FrameType {
    /// Frames that mean an agent is busy producing a reply.
    #[must_use]
    pub fn is_activity(&self) -> bool {
        matches!(
            self,
            Self::ToolCallRequestEvent | Self::ToolCallExecutionEvent | Self::TypingMessage
        )
    }
}

/// Agent identity attached by the server when it knows who spoke.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Optional side-channel attached to an inbound frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameMetadata {
    #[serde(default)]
    pub agent: Option<AgentMetadata>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A frame received from the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InboundFrame {
    #[serde(rename = "type")]
    pub frame_type: FrameType,
    /// `"user"`, `"server"`, or an agent label.
    #[serde(default)]
    pub source: String,
    /// Either a string or structured JSON.
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub metadata: Option<FrameMetadata>,
    #[serde(default)]
    pub models_usage: Option<Value>,
}

impl InboundFrame {
    /// Render `content` as text. Strings pass through; structured content is
    /// serialized to compact JSON.
    #[must_use]
    pub fn content_text(&self) -> String {
        match &self.content {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }

    /// The server's acknowledgment that the conversation is live.
    #[must_use]
    pub fn is_handshake(&self) -> bool {
        self.frame_type == FrameType::TextMessage
            && self.source == SERVER_SOURCE
            && self.content.as_str() == Some(HANDSHAKE_CONTENT)
    }

    /// Echo of something the local user sent.
    #[must_use]
    pub fn is_from_user(&self) -> bool {
        self.source == USER_SOURCE
    }

    #[must_use]
    pub fn agent_metadata(&self) -> Option<&AgentMetadata> {
        self.metadata.as_ref().and_then(|m| m.agent.as_ref())
    }

    #[must_use]
    pub fn error_metadata(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.error.as_deref())
    }
}

/// A frame sent by the client on behalf of the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    pub source: String,
    pub content: String,
}

impl OutboundFrame {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { source: USER_SOURCE.to_owned(), content: content.into() }
    }
}

/// Source label used for frames typed by the local user.
pub const USER_SOURCE: &str = "user";
/// Source label used for server control frames.
pub const SERVER_SOURCE: &str = "server";
/// Content of the server's handshake frame.
pub const HANDSHAKE_CONTENT: &str = "connected";

/// Decode a websocket text payload into a frame.
///
/// # Errors
///
/// Returns [`CodecError::Json`] when the text is not JSON, or is JSON without
/// a string `type` field.
pub fn decode_frame(text: &str) -> Result<InboundFrame, CodecError> {
    Ok(serde_json::from_str(text)?)
}

/// Encode an outbound frame as websocket text.
#[must_use]
pub fn encode_frame(frame: &OutboundFrame) -> String {
    // Two string fields; serialization cannot fail.
    serde_json::to_string(frame).unwrap_or_default()
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
