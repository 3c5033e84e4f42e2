use super::*;
use std::collections::HashMap;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> =
        pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn defaults_when_nothing_is_set() {
    let cfg = ClientConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg.endpoint, None);
    assert_eq!(cfg.token, None);
    assert_eq!(cfg.model, DEFAULT_MODEL);
    assert_eq!(cfg.agents_file, None);
    assert_eq!(cfg.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
    assert_eq!(cfg.event_buffer, DEFAULT_EVENT_BUFFER);
    assert_eq!(cfg.transport_options(), TransportOptions::default());
}

#[test]
fn reads_all_overrides() {
    let cfg = ClientConfig::from_lookup(lookup(&[
        ("AGENTCHAT_ENDPOINT", "wss://chat.test/ws/9"),
        ("AGENTCHAT_TOKEN", " tok "),
        ("AGENTCHAT_MODEL", "gpt-4o"),
        ("AGENTCHAT_AGENTS_FILE", "/tmp/agents.json"),
        ("AGENTCHAT_CONNECT_TIMEOUT_SECS", "3"),
        ("AGENTCHAT_EVENT_BUFFER", "8"),
    ]))
    .unwrap();

    assert_eq!(cfg.endpoint.as_deref(), Some("wss://chat.test/ws/9"));
    assert_eq!(cfg.token.as_deref(), Some("tok"));
    assert_eq!(cfg.model, "gpt-4o");
    assert_eq!(cfg.agents_file, Some(PathBuf::from("/tmp/agents.json")));
    let opts = cfg.transport_options();
    assert_eq!(opts.connect_timeout, Duration::from_secs(3));
    assert_eq!(opts.event_buffer, 8);
}

#[test]
fn blank_values_count_as_unset() {
    let cfg = ClientConfig::from_lookup(lookup(&[("AGENTCHAT_TOKEN", "   "), ("AGENTCHAT_MODEL", "")])).unwrap();
    assert_eq!(cfg.token, None);
    assert_eq!(cfg.model, DEFAULT_MODEL);
}

#[test]
fn unparseable_numbers_fall_back_to_defaults() {
    let cfg = ClientConfig::from_lookup(lookup(&[("AGENTCHAT_CONNECT_TIMEOUT_SECS", "soon")])).unwrap();
    assert_eq!(cfg.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
}

#[test]
fn zero_values_are_rejected() {
    let err = ClientConfig::from_lookup(lookup(&[("AGENTCHAT_CONNECT_TIMEOUT_SECS", "0")])).unwrap_err();
    assert!(matches!(err, ConfigError::ConfigParse(_)));

    let err = ClientConfig::from_lookup(lookup(&[("AGENTCHAT_EVENT_BUFFER", "0")])).unwrap_err();
    assert!(matches!(err, ConfigError::ConfigParse(_)));
}
