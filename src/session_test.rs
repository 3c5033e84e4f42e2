use super::*;
use crate::message::Sender;

fn group_state() -> SessionState {
    SessionState::new(ChatTarget::Group(vec![
        AgentRef::new("a1", "NewsAgent").with_avatar("/a1.png"),
        AgentRef::new("a2", "Weather Agent").with_avatar("/a2.png"),
    ]))
}

fn text_frame(source: &str, content: &str) -> String {
    serde_json::json!({"type": "TextMessage", "source": source, "content": content}).to_string()
}

fn messages(events: &[SessionEvent]) -> Vec<&Message> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Message(m) => Some(m),
            _ => None,
        })
        .collect()
}

// =============================================================
// handshake / echo
// =============================================================

#[test]
fn handshake_clears_typing_and_appends_nothing() {
    let mut state = group_state();
    state.handle_text(r#"{"type":"TypingMessage","source":"a2","content":""}"#);
    assert!(state.is_typing());

    let events = state.handle_text(&text_frame("server", "connected"));
    assert_eq!(events, vec![SessionEvent::Typing(false), SessionEvent::Connected]);
    assert!(!state.is_typing());
    assert!(state.acknowledged());
}

#[test]
fn handshake_without_typing_reports_only_connected() {
    let mut state = group_state();
    let events = state.handle_text(&text_frame("server", "connected"));
    assert_eq!(events, vec![SessionEvent::Connected]);
}

#[test]
fn user_echo_is_ignored() {
    let mut state = group_state();
    state.mark_sent();
    let events = state.handle_text(&text_frame("user", "hi"));
    assert!(events.is_empty());
    assert!(state.awaiting_reply());
}

#[test]
fn other_server_text_is_treated_as_agent_message() {
    let mut state = group_state();
    let events = state.handle_text(&text_frame("server", "maintenance at noon"));
    assert_eq!(messages(&events).len(), 1);
}

// =============================================================
// typing
// =============================================================

#[test]
fn tool_call_sets_typing_and_next_text_clears_it() {
    let mut state = group_state();
    state.mark_sent();

    let events = state.handle_text(r#"{"type":"ToolCallRequestEvent","source":"a2","content":[{"name":"forecast"}]}"#);
    assert_eq!(events, vec![SessionEvent::Typing(true)]);
    assert!(state.is_typing());

    let events = state.handle_text(&text_frame("Weather Agent", "Sunny"));
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], SessionEvent::Typing(false));
    let appended = messages(&events);
    assert_eq!(appended.len(), 1);
    assert_eq!(appended[0].content, "Sunny");
    assert!(!state.is_typing());
    assert!(!state.awaiting_reply());
}

#[test]
fn repeated_activity_reports_typing_once() {
    let mut state = group_state();
    assert_eq!(
        state.handle_text(r#"{"type":"TypingMessage","source":"a1","content":""}"#),
        vec![SessionEvent::Typing(true)]
    );
    assert!(state.handle_text(r#"{"type":"ToolCallExecutionEvent","source":"a1","content":"ok"}"#).is_empty());
    assert!(state.is_typing());
}

#[test]
fn user_activity_frames_do_not_set_typing() {
    let mut state = group_state();
    let events = state.handle_text(r#"{"type":"TypingMessage","source":"user","content":""}"#);
    assert!(events.is_empty());
    assert!(!state.is_typing());
}

// =============================================================
// attribution
// =============================================================

#[test]
fn agent_text_is_attributed_by_source() {
    let mut state = group_state();
    let events = state.handle_text(&text_frame("newsagent", "Headlines"));
    let msg = messages(&events)[0];
    assert_eq!(msg.sender, Sender::Agent);
    assert_eq!(msg.agent_id.as_deref(), Some("a1"));
    assert_eq!(msg.agent_name.as_deref(), Some("NewsAgent"));
}

#[test]
fn unmatched_source_gets_synthesized_name_and_fallback_avatar() {
    let mut state = group_state();
    let events = state.handle_text(&text_frame("UnknownBot", "?"));
    let msg = messages(&events)[0];
    assert_eq!(msg.agent_name.as_deref(), Some("Unknown Bot"));
    assert_eq!(msg.agent_avatar_url.as_deref(), Some("/a1.png"));
}

#[test]
fn metadata_agent_and_error_flow_into_message() {
    let mut state = group_state();
    let raw = serde_json::json!({
        "type": "TextMessage",
        "source": "x",
        "content": {"summary": "partial"},
        "metadata": {"agent": {"id": "a2", "name": "Weather Agent"}, "error": "tool timeout"},
        "models_usage": {"prompt_tokens": 10}
    })
    .to_string();

    let events = state.handle_text(&raw);
    let msg = messages(&events)[0];
    assert_eq!(msg.agent_id.as_deref(), Some("a2"));
    assert_eq!(msg.error.as_deref(), Some("tool timeout"));
    assert_eq!(msg.content, r#"{"summary":"partial"}"#);
}

#[test]
fn single_agent_session_always_attributes_to_that_agent() {
    let mut state = SessionState::new(ChatTarget::Single(AgentRef::new("s1", "Solo")));
    let events = state.handle_text(&text_frame("assistant", "hello"));
    let msg = messages(&events)[0];
    assert_eq!(msg.agent_id.as_deref(), Some("s1"));
    assert_eq!(msg.agent_name.as_deref(), Some("Solo"));
}

// =============================================================
// dropped frames
// =============================================================

#[test]
fn malformed_payload_is_dropped_without_state_change() {
    let mut state = group_state();
    state.handle_text(r#"{"type":"TypingMessage","source":"a1"}"#);
    state.mark_sent();

    assert!(state.handle_text("not json at all").is_empty());
    assert!(state.handle_text(r#"{"source":"a1","content":"no type"}"#).is_empty());
    assert!(state.is_typing());
    assert!(state.awaiting_reply());
}

#[test]
fn unknown_frame_type_is_ignored() {
    let mut state = group_state();
    let events = state.handle_text(r#"{"type":"HandoffMessage","source":"a1","content":"x"}"#);
    assert!(events.is_empty());
    assert!(!state.is_typing());
}

// =============================================================
// ChatTarget
// =============================================================

#[test]
fn chat_target_exposes_agents() {
    let solo = ChatTarget::Single(AgentRef::new("s1", "Solo"));
    assert_eq!(solo.agents().len(), 1);
    assert!(!solo.is_group());
    assert!(group_state().target.is_group());
}
