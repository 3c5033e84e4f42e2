//! Client configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::transport::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_EVENT_BUFFER, TransportOptions};

pub const DEFAULT_MODEL: &str = "default";

/// Errors produced while assembling client configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The agents file could not be read or is not a JSON agent list.
    #[error("invalid agents file: {0}")]
    AgentsFile(String),

    /// A command-line agent was not of the form `id=name[=avatar_url]`.
    #[error("invalid agent spec '{0}' (expected id=name[=avatar_url])")]
    AgentSpec(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub model: String,
    pub agents_file: Option<PathBuf>,
    pub connect_timeout_secs: u64,
    pub event_buffer: usize,
}

impl ClientConfig {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `AGENTCHAT_ENDPOINT`: realtime endpoint for the session
    /// - `AGENTCHAT_TOKEN`: auth token appended to the endpoint
    /// - `AGENTCHAT_MODEL`: language model label, default `default`
    /// - `AGENTCHAT_AGENTS_FILE`: JSON list of agents for attribution
    /// - `AGENTCHAT_CONNECT_TIMEOUT_SECS`: default 10
    /// - `AGENTCHAT_EVENT_BUFFER`: default 64
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConfigParse`] when a numeric value is present
    /// but zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let connect_timeout_secs =
            parse_u64(non_empty("AGENTCHAT_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS);
        if connect_timeout_secs == 0 {
            return Err(ConfigError::ConfigParse("AGENTCHAT_CONNECT_TIMEOUT_SECS must be positive".into()));
        }
        let event_buffer = parse_usize(non_empty("AGENTCHAT_EVENT_BUFFER"), DEFAULT_EVENT_BUFFER);
        if event_buffer == 0 {
            return Err(ConfigError::ConfigParse("AGENTCHAT_EVENT_BUFFER must be positive".into()));
        }

        Ok(Self {
            endpoint: non_empty("AGENTCHAT_ENDPOINT"),
            token: non_empty("AGENTCHAT_TOKEN"),
            model: non_empty("AGENTCHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            agents_file: non_empty("AGENTCHAT_AGENTS_FILE").map(PathBuf::from),
            connect_timeout_secs,
            event_buffer,
        })
    }

    #[must_use]
    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            event_buffer: self.event_buffer,
        }
    }
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.parse::<u64>().ok()).unwrap_or(default)
}

fn parse_usize(raw: Option<String>, default: usize) -> usize {
    raw.and_then(|v| v.parse::<usize>().ok()).unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
