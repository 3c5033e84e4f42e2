//! Transcript messages.
//!
//! Messages are appended in arrival order and never edited afterwards.
//! `timestamp` is for display only.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attribution::Attribution;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
}

/// A single chat bubble.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    /// Plain text, or structured content serialized as JSON.
    pub content: String,
    pub sender: Sender,
    pub agent_id: Option<String>,
    pub agent_name: Option<String>,
    pub agent_avatar_url: Option<String>,
    /// Server-reported failure for this agent turn, if any.
    pub error: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Message {
    /// A message typed by the local user.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            sender: Sender::User,
            agent_id: None,
            agent_name: None,
            agent_avatar_url: None,
            error: None,
            timestamp: now_ms(),
        }
    }

    /// A message produced by an agent. Always carries a display name.
    #[must_use]
    pub fn agent(content: impl Into<String>, attribution: Attribution, error: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            sender: Sender::Agent,
            agent_id: attribution.agent_id,
            agent_name: Some(attribution.agent_name),
            agent_avatar_url: attribution.avatar_url,
            error,
            timestamp: now_ms(),
        }
    }
}

/// Append-only message list owned by the active view.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

fn now_ms() -> i64 {
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(duration.as_millis()).unwrap_or(0)
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
