//! Conversation session client for the agent chat service.
//!
//! SYSTEM CONTEXT
//! ==============
//! A conversation binds a chat (one agent or a group), a language model, and
//! one realtime websocket. This crate owns the client side of that socket:
//! framing, the typing indicator, and attributing group-chat messages to
//! known agents. Agent, chat, and session records live in the backend; they
//! arrive here as plain values.
//!
//! - `frames` (sibling crate): wire shapes and JSON codec
//! - `attribution`: pure source → agent matching
//! - `session`: inbound dispatch state machine
//! - `transport`: socket task, `send`, idempotent `close`

pub mod agent;
pub mod attribution;
pub mod config;
pub mod message;
pub mod session;
pub mod transport;

pub use agent::AgentRef;
pub use attribution::{Attribution, attribute, match_agent};
pub use config::{ClientConfig, ConfigError};
pub use message::{Message, Sender, Transcript};
pub use session::{ChatTarget, ConversationSession, SessionError, SessionEvent, SessionState};
pub use transport::{SessionHandle, TransportOptions, connection_url};
