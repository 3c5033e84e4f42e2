//! Conversation session model and inbound frame dispatch.
//!
//! DESIGN
//! ======
//! `SessionState` is the pure half of the session client: it takes raw
//! websocket text, decodes it, and returns the events the view should apply.
//! It never touches the socket, so every dispatch rule can be exercised
//! without a network.
//!
//! DISPATCH
//! ========
//! - `TextMessage` from `server` with `connected` → handshake, clears typing
//!   (reported as `Typing(false)` if it was on)
//! - `TextMessage` from `user` → echo of an optimistic local append, ignored
//! - any other `TextMessage` → clears typing and the pending reply, appends
//!   an attributed agent message
//! - tool/typing events not from `user` → typing on
//! - malformed payloads and unknown types → dropped, state untouched

use tracing::debug;
use uuid::Uuid;

use crate::agent::AgentRef;
use crate::attribution::attribute;
use crate::message::Message;

// =============================================================================
// ERROR
// =============================================================================

/// Setup and transport failures.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("missing auth token; pass --token or set AGENTCHAT_TOKEN")]
    MissingToken,
    #[error("missing session endpoint; pass --endpoint or set AGENTCHAT_ENDPOINT")]
    MissingEndpoint,
    #[error("no agents supplied for this chat")]
    NoAgents,
    #[error("websocket connect failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("timed out connecting to {0}")]
    ConnectTimeout(String),
    #[error("websocket error: {0}")]
    Ws(Box<tokio_tungstenite::tungstenite::Error>),
}

// =============================================================================
// SESSION
// =============================================================================

/// Who the conversation is with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatTarget {
    /// One-on-one chat; every agent message belongs to this agent.
    Single(AgentRef),
    /// Group chat; messages are attributed heuristically. List order is the
    /// attribution search order.
    Group(Vec<AgentRef>),
}

impl ChatTarget {
    #[must_use]
    pub fn agents(&self) -> &[AgentRef] {
        match self {
            Self::Single(agent) => std::slice::from_ref(agent),
            Self::Group(agents) => agents,
        }
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }
}

/// One active conversation, created when the user enters a chat with a
/// chosen language model.
#[derive(Clone, Debug)]
pub struct ConversationSession {
    pub id: Uuid,
    /// Language model the backend negotiated for this conversation.
    pub model: String,
    pub target: ChatTarget,
    /// Realtime endpoint from the backend, without the auth token.
    pub endpoint: String,
}

impl ConversationSession {
    #[must_use]
    pub fn new(model: impl Into<String>, target: ChatTarget, endpoint: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(), model: model.into(), target, endpoint: endpoint.into() }
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// What the view should do in response to transport activity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Server acknowledged the conversation.
    Connected,
    /// Agent typing indicator changed.
    Typing(bool),
    /// Append this agent message to the transcript.
    Message(Message),
    /// Connection-level failure to show the user. Not retried.
    TransportError(String),
    /// The connection is gone; sending is disabled until a new session opens.
    Closed,
}

// =============================================================================
// STATE
// =============================================================================

/// Per-connection dispatch state.
#[derive(Debug)]
pub struct SessionState {
    target: ChatTarget,
    typing: bool,
    awaiting_reply: bool,
    acknowledged: bool,
}

impl SessionState {
    #[must_use]
    pub fn new(target: ChatTarget) -> Self {
        Self { target, typing: false, awaiting_reply: false, acknowledged: false }
    }

    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    #[must_use]
    pub fn awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    #[must_use]
    pub fn acknowledged(&self) -> bool {
        self.acknowledged
    }

    /// Record that a user message went out; further sends wait for a reply.
    pub fn mark_sent(&mut self) {
        self.awaiting_reply = true;
    }

    /// Decode one websocket text payload and apply it.
    pub fn handle_text(&mut self, raw: &str) -> Vec<SessionEvent> {
        match frames::decode_frame(raw) {
            Ok(frame) => self.handle_frame(&frame),
            Err(e) => {
                debug!(error = %e, len = raw.len(), "session: dropping malformed frame");
                Vec::new()
            }
        }
    }

    /// Apply one decoded frame.
    pub fn handle_frame(&mut self, frame: &frames::InboundFrame) -> Vec<SessionEvent> {
        use frames::FrameType;

        match frame.frame_type {
            FrameType::TextMessage if frame.is_handshake() => {
                self.acknowledged = true;
                let mut events = Vec::with_capacity(2);
                if self.typing {
                    events.push(SessionEvent::Typing(false));
                }
                self.typing = false;
                events.push(SessionEvent::Connected);
                events
            }
            FrameType::TextMessage if frame.is_from_user() => Vec::new(),
            FrameType::TextMessage => {
                let mut events = Vec::with_capacity(2);
                if self.typing {
                    events.push(SessionEvent::Typing(false));
                }
                self.typing = false;
                self.awaiting_reply = false;

                let attribution = attribute(frame.agent_metadata(), &frame.source, &self.target);
                let error = frame.error_metadata().map(ToOwned::to_owned);
                events.push(SessionEvent::Message(Message::agent(frame.content_text(), attribution, error)));
                events
            }
            ref kind if kind.is_activity() && !frame.is_from_user() => {
                if self.typing {
                    return Vec::new();
                }
                self.typing = true;
                vec![SessionEvent::Typing(true)]
            }
            FrameType::Unknown => {
                debug!(source = %frame.source, "session: ignoring frame of unknown type");
                Vec::new()
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
