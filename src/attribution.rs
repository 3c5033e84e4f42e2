//! Agent attribution for inbound messages.
//!
//! DESIGN
//! ======
//! Group chat frames carry an opaque `source` label that often does not match
//! any agent's display name exactly. Resolution runs in priority order:
//!
//! 1. Server-supplied `metadata.agent` wins outright.
//! 2. The known agent list is searched tier by tier: exact name, then
//!    case-insensitive name, then normalized equality, then normalized
//!    substring containment in either direction. Each tier scans the whole
//!    list before the next one runs; the first hit wins.
//! 3. On a miss, a display name is synthesized from `source` and the first
//!    known agent lends its id and avatar so the UI always has an icon.
//!
//! The substring tier can pick the wrong agent when names overlap (e.g.
//! `Bot` and `ChatBot`). List order decides; there is no tie-break.

use frames::AgentMetadata;

use crate::agent::AgentRef;
use crate::session::ChatTarget;

/// Who a message is shown as coming from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribution {
    pub agent_id: Option<String>,
    pub agent_name: String,
    pub avatar_url: Option<String>,
}

impl From<&AgentRef> for Attribution {
    fn from(agent: &AgentRef) -> Self {
        Self {
            agent_id: Some(agent.id.clone()),
            agent_name: agent.name.clone(),
            avatar_url: agent.avatar_url.clone(),
        }
    }
}

/// Strip everything but alphanumerics and lowercase the rest.
///
/// Alphanumeric is the Unicode definition, so non-ASCII letters and digits
/// survive (`"Météo Bot"` → `"météobot"`).
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(|c| c.is_alphanumeric()).flat_map(char::to_lowercase).collect()
}

/// Find the agent a `source` label most likely refers to.
#[must_use]
pub fn match_agent<'a>(source: &str, candidates: &'a [AgentRef]) -> Option<&'a AgentRef> {
    if let Some(agent) = candidates.iter().find(|a| a.name == source) {
        return Some(agent);
    }

    let lowered = source.to_lowercase();
    if let Some(agent) = candidates.iter().find(|a| a.name.to_lowercase() == lowered) {
        return Some(agent);
    }

    let needle = normalize(source);
    if needle.is_empty() {
        return None;
    }
    let normalized: Vec<String> = candidates.iter().map(|a| normalize(&a.name)).collect();

    if let Some(idx) = normalized.iter().position(|name| *name == needle) {
        return candidates.get(idx);
    }

    normalized
        .iter()
        .position(|name| !name.is_empty() && (name.contains(&needle) || needle.contains(name.as_str())))
        .and_then(|idx| candidates.get(idx))
}

/// Turn a machine label like `newsAgent` or `weather_bot` into `News Agent`
/// or `Weather Bot`. A run of capitals stays one word (`HTTPFetcher` →
/// `HTTP Fetcher`).
#[must_use]
pub fn humanize_source(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut spaced = String::with_capacity(source.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            spaced.push(' ');
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                spaced.push(' ');
            }
        }
        spaced.push(c);
    }

    let words: Vec<String> = spaced.split_whitespace().map(capitalize).collect();
    if words.is_empty() { "Agent".to_owned() } else { words.join(" ") }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Resolve the display identity for an agent frame.
#[must_use]
pub fn attribute(metadata: Option<&AgentMetadata>, source: &str, target: &ChatTarget) -> Attribution {
    let agents = match target {
        ChatTarget::Single(agent) => return Attribution::from(agent),
        ChatTarget::Group(agents) => agents.as_slice(),
    };

    if let Some(meta) = metadata {
        return Attribution::from(&AgentRef::from(meta));
    }

    if let Some(agent) = match_agent(source, agents) {
        return Attribution::from(agent);
    }

    let fallback = agents.first();
    Attribution {
        agent_id: fallback.map(|a| a.id.clone()),
        agent_name: humanize_source(source),
        avatar_url: fallback.and_then(|a| a.avatar_url.clone()),
    }
}

#[cfg(test)]
#[path = "attribution_test.rs"]
mod tests;
