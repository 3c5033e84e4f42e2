//! Read-only agent references supplied before a session starts.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// An agent the user can converse with. The session only looks these up for
/// attribution; it never creates or edits them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl AgentRef {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), avatar_url: None }
    }

    #[must_use]
    pub fn with_avatar(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }
}

impl From<&frames::AgentMetadata> for AgentRef {
    fn from(meta: &frames::AgentMetadata) -> Self {
        Self { id: meta.id.clone(), name: meta.name.clone(), avatar_url: meta.avatar_url.clone() }
    }
}

/// Load an agent list from a JSON array file. Order is preserved; it is the
/// search order used for attribution.
///
/// # Errors
///
/// Returns [`ConfigError::AgentsFile`] if the file cannot be read or parsed.
pub fn load_agents(path: &Path) -> Result<Vec<AgentRef>, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::AgentsFile(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::AgentsFile(format!("{}: {e}", path.display())))
}

/// Parse a `id=name[=avatar_url]` command-line agent spec.
///
/// # Errors
///
/// Returns [`ConfigError::AgentSpec`] when the id or name part is missing.
pub fn parse_agent_spec(raw: &str) -> Result<AgentRef, ConfigError> {
    let mut parts = raw.splitn(3, '=');
    let id = parts.next().map(str::trim).filter(|s| !s.is_empty());
    let name = parts.next().map(str::trim).filter(|s| !s.is_empty());
    let avatar = parts.next().map(str::trim).filter(|s| !s.is_empty());

    let (Some(id), Some(name)) = (id, name) else {
        return Err(ConfigError::AgentSpec(raw.to_owned()));
    };
    let agent = AgentRef::new(id, name);
    Ok(match avatar {
        Some(url) => agent.with_avatar(url),
        None => agent,
    })
}

#[cfg(test)]
#[path = "agent_test.rs"]
mod tests;
