//! Connection state machine.
//!
//! [`ChatSession`] owns everything that lives for the duration of one
//! connection: the local [`Session`], the channel generation, the
//! `connected` flag, and the [`HeartbeatScheduler`].  It is driven entirely
//! by the event loop (see `events`), so every transition below happens on a
//! single task.
//!
//! ```text
//!             connect()                Opened
//!   Idle ───────────────> Connecting ─────────> Connected
//!     ^                      │                     │
//!     │ connect()            │ Failed              │ Closed
//!     │                      v                     v
//!     └──────────────── Error <──── Failed ──  Disconnected
//! ```
//!
//! `Disconnected` and `Error` end one attempt; a fresh `connect()` starts the
//! next one from either.  There is no automatic reconnect.
//!
//! Each call to `connect()` allocates a new [`ChannelId`].  Channel events and
//! heartbeat ticks carry the id they belong to, and anything tagged with a
//! superseded id is ignored.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use wschat_core::{encode, EncodeError, ProtocolMessage, Session, Severity, ValidationError};

use crate::application::events::EventSender;
use crate::application::heartbeat::{HeartbeatScheduler, DEFAULT_HEARTBEAT_INTERVAL};
use crate::application::presenter::PresentationAdapter;
use crate::application::router::{MessageRouter, OnlineCountSource};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failures reported by a [`ChatChannel`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The channel target is not a usable URL.
    #[error("invalid channel target {target:?}: {reason}")]
    InvalidTarget { target: String, reason: String },

    /// The channel could not be opened.
    #[error("failed to open channel: {0}")]
    Open(String),

    /// No open channel with the given id.
    #[error("channel {0} is not open")]
    NotOpen(ChannelId),

    /// The writer task has gone away.
    #[error("channel writer has shut down")]
    WriterClosed,
}

/// Errors returned by the user-facing operations of [`ChatSession`].
///
/// Every one of these has already been shown to the user as a notice by the
/// time it is returned; callers only need it for logging or tests.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("not connected to the chat server")]
    NotConnected,

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

// ── Channel port ──────────────────────────────────────────────────────────────

/// Generation number of one channel.  Unique per [`ChatSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u64);

impl ChannelId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Transport port for the chat channel.
///
/// `open` only starts the attempt; its outcome arrives later as a
/// `ChannelEvent` tagged with the same [`ChannelId`].  All other calls return
/// immediately.
pub trait ChatChannel: Send + Sync {
    /// Begins opening a channel to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if the attempt cannot even be started (for
    /// example an unparseable target).
    fn open(&self, target: &str, channel: ChannelId) -> Result<(), ChannelError>;

    /// Queues one text frame on `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if `channel` is not open or its writer is gone.
    fn send_text(&self, channel: ChannelId, text: String) -> Result<(), ChannelError>;

    /// Requests an orderly close.  The resulting `Closed` event arrives
    /// asynchronously.  Closing an unknown or already-closed channel is a
    /// no-op.
    fn close(&self, channel: ChannelId);

    /// Returns `true` if `channel` is open and accepting writes right now.
    fn is_writable(&self, channel: ChannelId) -> bool;
}

// ── State ─────────────────────────────────────────────────────────────────────

/// Lifecycle state of the chat connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Disconnected,
    Error,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime settings for a [`ChatSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// `host[:port]` of the chat server.
    pub server_host: String,
    pub heartbeat_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_host: "localhost:8081".to_string(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

/// Builds `ws://<host>/ws?user_id=<id>&username=<percent-encoded name>`.
pub fn channel_target(server_host: &str, session: &Session) -> String {
    format!(
        "ws://{server_host}/ws?user_id={}&username={}",
        session.user_id(),
        urlencoding::encode(session.username())
    )
}

/// The live channel and its heartbeat.
#[derive(Debug)]
struct Connection {
    id: ChannelId,
    connected: bool,
    closing: bool,
    heartbeat: HeartbeatScheduler,
}

impl Connection {
    fn new(id: ChannelId, heartbeat_interval: Duration) -> Self {
        Self {
            id,
            connected: false,
            closing: false,
            heartbeat: HeartbeatScheduler::new(heartbeat_interval),
        }
    }
}

// ── ChatSession ───────────────────────────────────────────────────────────────

/// The chat client: connection lifecycle, heartbeat, routing, and sending.
pub struct ChatSession {
    config: SessionConfig,
    channel: Arc<dyn ChatChannel>,
    presenter: Arc<dyn PresentationAdapter>,
    counts: Arc<dyn OnlineCountSource>,
    events: EventSender,
    state: ConnectionState,
    session: Option<Session>,
    connection: Option<Connection>,
    next_channel: u64,
    router: MessageRouter,
}

impl ChatSession {
    pub fn new(
        config: SessionConfig,
        channel: Arc<dyn ChatChannel>,
        presenter: Arc<dyn PresentationAdapter>,
        counts: Arc<dyn OnlineCountSource>,
        events: EventSender,
    ) -> Self {
        Self {
            config,
            channel,
            presenter,
            counts,
            events,
            state: ConnectionState::Idle,
            session: None,
            connection: None,
            next_channel: 1,
            router: MessageRouter::new(),
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The local participant, while a connection attempt or connection is live.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Id of the current channel, if any.
    pub fn channel_id(&self) -> Option<ChannelId> {
        self.connection.as_ref().map(|c| c.id)
    }

    pub fn is_heartbeat_running(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|c| c.heartbeat.is_running())
    }

    pub fn router(&self) -> &MessageRouter {
        &self.router
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub(crate) fn presenter(&self) -> &dyn PresentationAdapter {
        self.presenter.as_ref()
    }

    // ── User operations ───────────────────────────────────────────────────────

    /// Validates the identity and starts opening a channel.
    ///
    /// Any existing connection is torn down first.  On success the state is
    /// `Connecting`; the open outcome arrives later as a channel event.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Validation`] for a bad user ID or blank username; no
    ///   channel is opened.
    /// - [`ClientError::Channel`] if the open attempt could not be started;
    ///   the state becomes `Error`.
    pub fn connect(&mut self, user_id: &str, username: &str) -> Result<ChannelId, ClientError> {
        let session = match Session::from_input(user_id, username) {
            Ok(session) => session,
            Err(e) => {
                self.presenter.render_system_notice(&e.to_string(), Severity::Warning);
                return Err(e.into());
            }
        };

        self.replace_connection();

        let id = ChannelId::new(self.next_channel);
        self.next_channel += 1;
        let target = channel_target(&self.config.server_host, &session);

        info!(
            "connecting to {} as user {} ({}) on channel {id}",
            self.config.server_host,
            session.user_id(),
            session.username()
        );
        self.session = Some(session);
        self.connection = Some(Connection::new(id, self.config.heartbeat_interval));
        self.set_state(ConnectionState::Connecting);

        if let Err(e) = self.channel.open(&target, id) {
            warn!("could not start channel {id}: {e}");
            self.connection = None;
            self.session = None;
            self.set_state(ConnectionState::Error);
            self.presenter
                .render_system_notice(&format!("connection failed: {e}"), Severity::Error);
            return Err(e.into());
        }
        Ok(id)
    }

    /// Requests an orderly close of the open channel.
    ///
    /// The `Connected → Disconnected` transition happens when the close event
    /// arrives.  Calling this without an open channel, or again before the
    /// close completes, does nothing.
    pub fn disconnect(&mut self) {
        let Some(conn) = self.connection.as_mut() else {
            debug!("disconnect requested with no connection");
            return;
        };
        if !conn.connected {
            info!("disconnect ignored: channel {} is still opening", conn.id);
            return;
        }
        if conn.closing {
            debug!("disconnect already in progress on channel {}", conn.id);
            return;
        }
        conn.closing = true;
        info!("closing channel {}", conn.id);
        self.channel.close(conn.id);
    }

    /// Encodes and sends `msg` on the open channel.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NotConnected`] unless the state is `Connected`.
    /// - [`ClientError::Encode`] if the message cannot be serialized.
    /// - [`ClientError::Channel`] if the channel rejects the write.
    pub fn send(&self, msg: &ProtocolMessage) -> Result<(), ClientError> {
        let id = match &self.connection {
            Some(conn) if self.state == ConnectionState::Connected && conn.connected => conn.id,
            _ => return Err(ClientError::NotConnected),
        };
        let text = encode(msg)?;
        self.channel.send_text(id, text)?;
        Ok(())
    }

    /// Closes any channel and stops the heartbeat without emitting notices.
    /// Used when the client exits.
    pub fn shutdown(&mut self) {
        if let Some(mut conn) = self.connection.take() {
            conn.heartbeat.stop();
            self.channel.close(conn.id);
            info!("closed channel {} on shutdown", conn.id);
        }
        self.session = None;
    }

    // ── Channel events ────────────────────────────────────────────────────────

    pub(crate) fn on_channel_open(&mut self, id: ChannelId) {
        let events = self.events.clone();
        let Some(conn) = self.current_mut(id) else {
            debug!("ignoring open event from stale channel {id}");
            return;
        };
        if conn.connected {
            debug!("duplicate open event on channel {id}");
            return;
        }
        conn.connected = true;
        conn.heartbeat.start(id, events);

        let who = self
            .session
            .as_ref()
            .map(|s| format!("{} ({})", s.username(), s.user_id()))
            .unwrap_or_default();
        info!("channel {id} connected as {who}");
        self.set_state(ConnectionState::Connected);
        self.presenter.set_input_enabled(true);
        self.presenter
            .render_system_notice("connected to chat server", Severity::Info);
    }

    pub(crate) fn on_channel_frame(&mut self, id: ChannelId, frame: &str) {
        if self.current_mut(id).is_none() {
            debug!("dropping frame from stale channel {id}");
            return;
        }
        let outcomes = self
            .router
            .route_frame(frame, self.presenter.as_ref(), self.counts.as_ref());
        debug!("channel {id}: routed {outcomes:?}");
    }

    pub(crate) fn on_channel_close(&mut self, id: ChannelId, reason: Option<String>) {
        if self.current_mut(id).is_none() {
            debug!("ignoring close event from stale channel {id}");
            return;
        }
        if let Some(mut conn) = self.connection.take() {
            conn.heartbeat.stop();
        }
        self.session = None;
        match &reason {
            Some(reason) => info!("channel {id} closed: {reason}"),
            None => info!("channel {id} closed"),
        }
        self.set_state(ConnectionState::Disconnected);
        self.presenter.set_input_enabled(false);
        self.presenter
            .render_system_notice("disconnected from chat server", Severity::Info);
    }

    pub(crate) fn on_channel_error(&mut self, id: ChannelId, reason: &str) {
        if self.current_mut(id).is_none() {
            debug!("ignoring error event from stale channel {id}: {reason}");
            return;
        }
        if let Some(mut conn) = self.connection.take() {
            conn.heartbeat.stop();
        }
        self.channel.close(id);
        self.session = None;
        warn!("channel {id} failed: {reason}");
        self.set_state(ConnectionState::Error);
        self.presenter.set_input_enabled(false);
        self.presenter
            .render_system_notice(&format!("connection error: {reason}"), Severity::Warning);
    }

    /// Sends a heartbeat if `id` is the live channel and it is writable.
    /// Returns `true` if a heartbeat was handed to the channel.
    pub(crate) fn on_heartbeat_tick(&mut self, id: ChannelId) -> bool {
        let live = matches!(
            &self.connection,
            Some(conn) if conn.id == id && conn.connected && !conn.closing
        );
        if !live || self.state != ConnectionState::Connected || !self.channel.is_writable(id) {
            debug!("heartbeat skipped on channel {id}: not writable");
            return false;
        }
        match self.send(&ProtocolMessage::heartbeat()) {
            Ok(()) => {
                debug!("heartbeat sent on channel {id}");
                true
            }
            Err(e) => {
                warn!("heartbeat on channel {id} failed: {e}");
                false
            }
        }
    }

    pub(crate) fn on_online_count(&mut self, count: usize) {
        debug!("online count refreshed: {count}");
        self.presenter.set_online_count(count);
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
        self.presenter.set_connection_status(state);
    }

    fn current_mut(&mut self, id: ChannelId) -> Option<&mut Connection> {
        self.connection.as_mut().filter(|conn| conn.id == id)
    }

    /// Tears down the current connection before a new `connect()`.
    fn replace_connection(&mut self) {
        let Some(mut conn) = self.connection.take() else {
            return;
        };
        conn.heartbeat.stop();
        self.channel.close(conn.id);
        self.session = None;
        info!("closing channel {} for a new connection", conn.id);
        if conn.connected {
            self.set_state(ConnectionState::Disconnected);
            self.presenter.set_input_enabled(false);
            self.presenter
                .render_system_notice("disconnected from chat server", Severity::Info);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::{event_channel, EventReceiver};
    use crate::infrastructure::network::mock::{MockChannel, RecordingCountSource};
    use crate::infrastructure::ui_bridge::mock::{PresenterCall, RecordingPresenter};

    struct Harness {
        session: ChatSession,
        channel: Arc<MockChannel>,
        presenter: Arc<RecordingPresenter>,
        _events: EventReceiver,
    }

    fn harness() -> Harness {
        let channel = Arc::new(MockChannel::new());
        let presenter = Arc::new(RecordingPresenter::new());
        let (tx, rx) = event_channel();
        let session = ChatSession::new(
            SessionConfig::default(),
            channel.clone(),
            presenter.clone(),
            Arc::new(RecordingCountSource::new()),
            tx,
        );
        Harness {
            session,
            channel,
            presenter,
            _events: rx,
        }
    }

    #[test]
    fn test_channel_target_percent_encodes_username() {
        let session = Session::from_input("3", "zoë smith&co").unwrap();
        assert_eq!(
            channel_target("localhost:8081", &session),
            "ws://localhost:8081/ws?user_id=3&username=zo%C3%AB%20smith%26co"
        );
    }

    #[test]
    fn test_connect_with_invalid_input_opens_nothing() {
        // Arrange
        let mut h = harness();

        // Act
        let result = h.session.connect("abc", "alice");

        // Assert
        assert!(matches!(
            result,
            Err(ClientError::Validation(ValidationError::InvalidUserId(_)))
        ));
        assert!(h.channel.opened().is_empty());
        assert_eq!(h.session.state(), ConnectionState::Idle);
        assert_eq!(h.presenter.notices()[0].1, Severity::Warning);
    }

    #[test]
    fn test_connect_moves_to_connecting_and_opens_target() {
        // Arrange
        let mut h = harness();

        // Act
        let id = h.session.connect("1", "alice").unwrap();

        // Assert
        assert_eq!(h.session.state(), ConnectionState::Connecting);
        assert_eq!(
            h.channel.opened(),
            vec![(id, "ws://localhost:8081/ws?user_id=1&username=alice".to_string())]
        );
        assert!(h
            .presenter
            .calls()
            .contains(&PresenterCall::Status(ConnectionState::Connecting)));
    }

    #[test]
    fn test_open_failure_moves_to_error() {
        let mut h = harness();
        h.channel.set_fail_open(true);

        let result = h.session.connect("1", "alice");

        assert!(matches!(result, Err(ClientError::Channel(_))));
        assert_eq!(h.session.state(), ConnectionState::Error);
        assert!(h.session.session().is_none());
    }

    #[tokio::test]
    async fn test_open_event_connects_and_starts_heartbeat() {
        // Arrange
        let mut h = harness();
        let id = h.session.connect("1", "alice").unwrap();

        // Act
        h.session.on_channel_open(id);

        // Assert
        assert_eq!(h.session.state(), ConnectionState::Connected);
        assert!(h.session.is_heartbeat_running());
        let calls = h.presenter.calls();
        assert!(calls.contains(&PresenterCall::InputEnabled(true)));
        assert!(calls.contains(&PresenterCall::Status(ConnectionState::Connected)));
    }

    #[tokio::test]
    async fn test_send_before_open_is_not_connected() {
        let mut h = harness();
        h.session.connect("1", "alice").unwrap();

        let result = h.session.send(&ProtocolMessage::heartbeat());

        assert!(matches!(result, Err(ClientError::NotConnected)));
        assert!(h.channel.sent().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_requests_close_once() {
        // Arrange
        let mut h = harness();
        let id = h.session.connect("1", "alice").unwrap();
        h.session.on_channel_open(id);

        // Act
        h.session.disconnect();
        h.session.disconnect();

        // Assert
        assert_eq!(h.channel.closed(), vec![id]);
        assert_eq!(h.session.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_disconnect_while_connecting_is_a_no_op() {
        let mut h = harness();
        h.session.connect("1", "alice").unwrap();

        h.session.disconnect();

        assert!(h.channel.closed().is_empty());
        assert_eq!(h.session.state(), ConnectionState::Connecting);
    }

    #[tokio::test]
    async fn test_close_event_disconnects_and_stops_heartbeat() {
        // Arrange
        let mut h = harness();
        let id = h.session.connect("1", "alice").unwrap();
        h.session.on_channel_open(id);

        // Act
        h.session.on_channel_close(id, None);

        // Assert
        assert_eq!(h.session.state(), ConnectionState::Disconnected);
        assert!(!h.session.is_heartbeat_running());
        assert!(h.session.session().is_none());
        assert!(h
            .presenter
            .calls()
            .contains(&PresenterCall::InputEnabled(false)));
    }

    #[tokio::test]
    async fn test_error_event_releases_connection() {
        // Arrange
        let mut h = harness();
        let id = h.session.connect("1", "alice").unwrap();
        h.session.on_channel_open(id);

        // Act
        h.session.on_channel_error(id, "connection reset");
        let notices_after_error = h.presenter.notices().len();
        h.session.on_channel_close(id, None);

        // Assert
        assert_eq!(h.session.state(), ConnectionState::Error);
        assert!(!h.session.is_heartbeat_running());
        assert_eq!(h.channel.closed(), vec![id]);
        assert_eq!(
            h.presenter.notices().len(),
            notices_after_error,
            "a close after an error is stale"
        );
    }

    #[tokio::test]
    async fn test_reconnect_closes_previous_channel_first() {
        // Arrange
        let mut h = harness();
        let first = h.session.connect("1", "alice").unwrap();
        h.session.on_channel_open(first);

        // Act
        let second = h.session.connect("2", "bob").unwrap();
        h.session.on_channel_open(first);

        // Assert
        assert_ne!(first, second);
        assert_eq!(h.channel.closed(), vec![first]);
        assert_eq!(h.session.state(), ConnectionState::Connecting);
        assert_eq!(h.session.session().map(Session::user_id), Some(2));
        assert!(h
            .presenter
            .notices()
            .iter()
            .any(|(text, _)| text == "disconnected from chat server"));
    }

    #[tokio::test]
    async fn test_heartbeat_tick_skipped_when_channel_not_writable() {
        // Arrange
        let mut h = harness();
        let id = h.session.connect("1", "alice").unwrap();
        h.session.on_channel_open(id);
        h.channel.set_writable(false);

        // Act
        let sent = h.session.on_heartbeat_tick(id);

        // Assert
        assert!(!sent);
        assert!(h.channel.sent().is_empty());
        assert_eq!(h.session.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_heartbeat_tick_for_stale_channel_is_ignored() {
        let mut h = harness();
        let id = h.session.connect("1", "alice").unwrap();
        h.session.on_channel_open(id);

        let sent = h.session.on_heartbeat_tick(ChannelId::new(id.get() + 10));

        assert!(!sent);
        assert!(h.channel.sent().is_empty());
    }

    #[test]
    fn test_connection_state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ConnectionState::Connected).unwrap(),
            "\"connected\""
        );
        assert_eq!(ConnectionState::default(), ConnectionState::Idle);
    }
}
