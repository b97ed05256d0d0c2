//! Event vocabulary and the single-actor event loop.
//!
//! Every source of change is turned into a [`ClientEvent`] and posted to one
//! unbounded `mpsc` queue:
//!
//! ```text
//! stdin reader ──── Intent ──────────┐
//! WebSocket task ── Channel{id, ..} ─┤
//! heartbeat task ── HeartbeatTick ───┼──> run_event_loop ──> ChatSession
//! REST count task ─ OnlineCount ─────┘
//! ```
//!
//! Only the loop touches [`ChatSession`], so connection, session, and roster
//! state is never mutated concurrently and needs no locks.

use std::ops::ControlFlow;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::application::connection::{ChannelId, ChatSession};

/// A request made by the user through the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIntent {
    /// Open a connection as `user_id`/`username` (raw, unvalidated input).
    Connect { user_id: String, username: String },
    /// Close the current connection.
    Disconnect,
    /// Send `content` to `target` (raw, unvalidated input).
    SendPrivate { target: String, content: String },
    /// Close everything and leave the event loop.
    Quit,
}

/// Something that happened on a chat channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The handshake completed; the channel is writable.
    Opened,
    /// A text frame arrived.  May hold several newline-separated messages.
    Frame(String),
    /// The channel closed, either end initiated.
    Closed { reason: Option<String> },
    /// The channel could not be opened or broke with a transport error.
    Failed(String),
}

/// Everything the event loop reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Intent(UserIntent),
    /// A channel event tagged with the channel that produced it.  Events from
    /// a channel that is no longer current are dropped.
    Channel {
        channel: ChannelId,
        event: ChannelEvent,
    },
    /// The heartbeat interval elapsed for `channel`.
    HeartbeatTick { channel: ChannelId },
    /// Fresh online-user count from the REST collaborator.
    OnlineCount(usize),
}

/// Sending half of the event queue, handed to every event producer.
pub type EventSender = mpsc::UnboundedSender<ClientEvent>;

/// Receiving half of the event queue, owned by the event loop.
pub type EventReceiver = mpsc::UnboundedReceiver<ClientEvent>;

/// Creates the event queue.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Drains `events` into `session` until a [`UserIntent::Quit`] arrives or
/// every sender has been dropped, then shuts the session down.
pub async fn run_event_loop(mut session: ChatSession, mut events: EventReceiver) {
    while let Some(event) = events.recv().await {
        if session.handle_event(event).is_break() {
            info!("quit requested; leaving event loop");
            break;
        }
    }
    debug!("event loop finished");
    session.shutdown();
}

impl ChatSession {
    /// Applies one event.  Returns [`ControlFlow::Break`] when the loop
    /// should stop.
    pub fn handle_event(&mut self, event: ClientEvent) -> ControlFlow<()> {
        match event {
            ClientEvent::Intent(intent) => return self.handle_intent(intent),
            ClientEvent::Channel { channel, event } => match event {
                ChannelEvent::Opened => self.on_channel_open(channel),
                ChannelEvent::Frame(text) => self.on_channel_frame(channel, &text),
                ChannelEvent::Closed { reason } => self.on_channel_close(channel, reason),
                ChannelEvent::Failed(reason) => self.on_channel_error(channel, &reason),
            },
            ClientEvent::HeartbeatTick { channel } => {
                self.on_heartbeat_tick(channel);
            }
            ClientEvent::OnlineCount(count) => self.on_online_count(count),
        }
        ControlFlow::Continue(())
    }

    fn handle_intent(&mut self, intent: UserIntent) -> ControlFlow<()> {
        match intent {
            UserIntent::Connect { user_id, username } => {
                if let Err(e) = self.connect(&user_id, &username) {
                    debug!("connect intent rejected: {e}");
                }
            }
            UserIntent::Disconnect => self.disconnect(),
            UserIntent::SendPrivate { target, content } => {
                if let Err(e) = self.send_private_message(&target, &content) {
                    debug!("send intent rejected: {e}");
                }
            }
            UserIntent::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }
}
