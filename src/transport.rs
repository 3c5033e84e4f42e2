//! Realtime connection for one conversation.
//!
//! DESIGN
//! ======
//! `SessionHandle::open` spawns a single connection task and returns
//! immediately; everything the socket produces reaches the caller as
//! `SessionEvent`s on a channel. The task owns the websocket and multiplexes
//! three inputs in a `select!` loop:
//! - shutdown notification from `close()`
//! - outbound user frames queued by `send()`
//! - inbound frames, dispatched through `SessionState`
//!
//! LIFECYCLE
//! =========
//! 1. `open` → one connect attempt, bounded by `connect_timeout`
//! 2. Connect failure → `TransportError` then `Closed`; no retry
//! 3. Server `connected` frame → `Connected`
//! 4. `close()` (any number of times, from any teardown path) or remote
//!    hangup → `Closed` exactly once, sending disabled
//!
//! Event delivery races against shutdown, so a caller that stops reading
//! events can still close the socket.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use frames::OutboundFrame;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{Notify, mpsc};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use crate::session::{ConversationSession, SessionError, SessionEvent, SessionState};

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Tunables for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    pub connect_timeout: Duration,
    /// Capacity of the event channel handed back by `open`.
    pub event_buffer: usize,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

/// Append the auth token as a `token` query parameter.
#[must_use]
pub fn connection_url(endpoint: &str, token: &str) -> String {
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{separator}token={token}")
}

// =============================================================================
// HANDLE
// =============================================================================

struct Shared {
    closed: AtomicBool,
    connected: AtomicBool,
    shutdown: Notify,
    state: Mutex<SessionState>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The one live connection for a conversation view.
///
/// Dropping the handle closes the connection.
pub struct SessionHandle {
    session: ConversationSession,
    shared: Arc<Shared>,
    outbound: mpsc::UnboundedSender<OutboundFrame>,
}

impl SessionHandle {
    /// Start connecting to the session endpoint.
    ///
    /// Never fails here: connection errors arrive later as
    /// [`SessionEvent::TransportError`] followed by [`SessionEvent::Closed`].
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn open(
        session: ConversationSession,
        token: &str,
        options: TransportOptions,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        let url = connection_url(&session.endpoint, token);
        let shared = Arc::new(Shared {
            closed: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            shutdown: Notify::new(),
            state: Mutex::new(SessionState::new(session.target.clone())),
        });
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(options.event_buffer.max(1));

        info!(session_id = %session.id, model = %session.model, endpoint = %session.endpoint, "session: opening");
        tokio::spawn(run_connection(
            url,
            session.id,
            Arc::clone(&shared),
            outbound_rx,
            event_tx,
            options.connect_timeout,
        ));

        (Self { session, shared, outbound: outbound_tx }, event_rx)
    }

    #[must_use]
    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    /// Queue a user message. Returns `false` without sending when the
    /// connection is closed, not yet established, or still waiting on an
    /// agent reply.
    pub fn send(&self, text: &str) -> bool {
        if !self.is_connected() {
            debug!(session_id = %self.session.id, "session: send ignored, not connected");
            return false;
        }

        let mut state = self.shared.state();
        if state.awaiting_reply() {
            debug!(session_id = %self.session.id, "session: send ignored, reply pending");
            return false;
        }
        if self.outbound.send(OutboundFrame::user(text)).is_err() {
            return false;
        }
        state.mark_sent();
        true
    }

    /// Tear down the connection. Safe to call any number of times.
    pub fn close(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(session_id = %self.session.id, "session: close requested");
        self.shared.shutdown.notify_one();
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.shared.closed.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.is_open() && self.shared.connected.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.shared.state().is_typing()
    }

    #[must_use]
    pub fn awaiting_reply(&self) -> bool {
        self.shared.state().awaiting_reply()
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.close();
    }
}

// =============================================================================
// CONNECTION TASK
// =============================================================================

async fn run_connection(
    url: String,
    session_id: uuid::Uuid,
    shared: Arc<Shared>,
    mut outbound_rx: mpsc::UnboundedReceiver<OutboundFrame>,
    events: mpsc::Sender<SessionEvent>,
    connect_timeout: Duration,
) {
    let connect = tokio::time::timeout(connect_timeout, connect_async(url.as_str()));
    let result = tokio::select! {
        biased;
        () = shared.shutdown.notified() => {
            info!(%session_id, "session: closed before connecting");
            finish(&shared, &events).await;
            return;
        }
        result = connect => match result {
            Ok(Ok((stream, _))) => Ok(stream),
            Ok(Err(e)) => Err(SessionError::WsConnect(Box::new(e))),
            Err(_) => Err(SessionError::ConnectTimeout(redact_token(&url))),
        },
    };

    let stream = match result {
        Ok(stream) => stream,
        Err(e) => {
            warn!(%session_id, error = %e, "session: connect failed");
            let _ = events.send(SessionEvent::TransportError(e.to_string())).await;
            finish(&shared, &events).await;
            return;
        }
    };

    shared.connected.store(true, Ordering::SeqCst);
    info!(%session_id, "session: connected");

    let (mut ws_write, mut ws_read) = stream.split();

    loop {
        tokio::select! {
            biased;
            () = shared.shutdown.notified() => {
                let _ = ws_write.send(WsMessage::Close(None)).await;
                break;
            }
            Some(frame) = outbound_rx.recv() => {
                let text = frames::encode_frame(&frame);
                if let Err(e) = ws_write.send(WsMessage::Text(text.into())).await {
                    let e = SessionError::Ws(Box::new(e));
                    warn!(%session_id, error = %e, "session: send failed");
                    emit(&shared, &events, SessionEvent::TransportError(e.to_string())).await;
                    break;
                }
            }
            msg = ws_read.next() => {
                match msg {
                    Some(Ok(WsMessage::Text(text))) => {
                        let produced = shared.state().handle_text(text.as_str());
                        let mut shutdown = false;
                        for event in produced {
                            if !emit(&shared, &events, event).await {
                                shutdown = true;
                                break;
                            }
                        }
                        if shutdown {
                            let _ = ws_write.send(WsMessage::Close(None)).await;
                            break;
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        info!(%session_id, "session: server closed connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        let e = SessionError::Ws(Box::new(e));
                        warn!(%session_id, error = %e, "session: receive failed");
                        emit(&shared, &events, SessionEvent::TransportError(e.to_string())).await;
                        break;
                    }
                }
            }
        }
    }

    drop(ws_write);
    drop(ws_read);
    finish(&shared, &events).await;
    info!(%session_id, "session: disconnected");
}

/// Deliver one event unless shutdown is requested first. A full event
/// channel must not keep `close()` from reaching the socket.
///
/// Returns `false` when shutdown won the race.
async fn emit(shared: &Shared, events: &mpsc::Sender<SessionEvent>, event: SessionEvent) -> bool {
    tokio::select! {
        biased;
        () = shared.shutdown.notified() => false,
        result = events.send(event) => {
            if result.is_err() {
                debug!("session: event receiver dropped");
            }
            true
        }
    }
}

async fn finish(shared: &Shared, events: &mpsc::Sender<SessionEvent>) {
    shared.connected.store(false, Ordering::SeqCst);
    shared.closed.store(true, Ordering::SeqCst);
    let _ = events.send(SessionEvent::Closed).await;
}

fn redact_token(url: &str) -> String {
    match url.find("token=") {
        Some(idx) => format!("{}token=***", &url[..idx]),
        None => url.to_owned(),
    }
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
