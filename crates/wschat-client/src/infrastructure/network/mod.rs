//! Network infrastructure for the chat client.
//!
//! Architecture:
//! - [`WebSocketChannel`] implements the `ChatChannel` port.  Each `open`
//!   spawns one socket task that owns the WebSocket stream.
//! - Inbound text frames and lifecycle changes are posted to the event loop as
//!   `ClientEvent::Channel` tagged with the channel's id.
//! - Outbound frames go through an unbounded queue to the socket task, so
//!   `send_text` never blocks the event loop.
//! - [`online_users::HttpOnlineCount`] implements the `OnlineCountSource` port.

pub mod mock;
pub mod online_users;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest, handshake::client::Request, Error as WsError,
        Message as WsMessage,
    },
};
use tracing::{debug, info, warn};

use crate::application::connection::{ChannelError, ChannelId, ChatChannel};
use crate::application::events::{ChannelEvent, ClientEvent, EventSender};

pub use online_users::HttpOnlineCount;

/// How long a locally initiated close waits for the server's close reply.
pub const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Commands from the event loop to a socket task.
#[derive(Debug)]
enum Outbound {
    Text(String),
    Close,
}

/// Handle to the socket task of the current channel.
#[derive(Debug)]
struct ActiveSocket {
    id: ChannelId,
    writer: mpsc::UnboundedSender<Outbound>,
    writable: Arc<AtomicBool>,
}

impl ActiveSocket {
    fn shut(&self) {
        self.writable.store(false, Ordering::SeqCst);
        // The task may already be gone.
        let _ = self.writer.send(Outbound::Close);
    }
}

/// WebSocket implementation of the chat channel.
///
/// Holds at most one socket.  Opening a new channel closes the previous one.
pub struct WebSocketChannel {
    events: EventSender,
    active: Mutex<Option<ActiveSocket>>,
    close_grace: Duration,
}

impl WebSocketChannel {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            active: Mutex::new(None),
            close_grace: DEFAULT_CLOSE_GRACE,
        }
    }

    pub fn with_close_grace(mut self, grace: Duration) -> Self {
        self.close_grace = grace;
        self
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<ActiveSocket>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChatChannel for WebSocketChannel {
    fn open(&self, target: &str, channel: ChannelId) -> Result<(), ChannelError> {
        let request = target
            .into_client_request()
            .map_err(|e| ChannelError::InvalidTarget {
                target: target.to_string(),
                reason: e.to_string(),
            })?;

        let (writer, outbound) = mpsc::unbounded_channel();
        let writable = Arc::new(AtomicBool::new(false));
        let socket = ActiveSocket {
            id: channel,
            writer,
            writable: Arc::clone(&writable),
        };
        if let Some(previous) = self.slot().replace(socket) {
            debug!("channel {} replaced by {channel}", previous.id);
            previous.shut();
        }

        tokio::spawn(run_socket(
            request,
            channel,
            outbound,
            writable,
            self.events.clone(),
            self.close_grace,
        ));
        Ok(())
    }

    fn send_text(&self, channel: ChannelId, text: String) -> Result<(), ChannelError> {
        let slot = self.slot();
        match slot.as_ref() {
            Some(socket) if socket.id == channel && socket.writable.load(Ordering::SeqCst) => {
                socket
                    .writer
                    .send(Outbound::Text(text))
                    .map_err(|_| ChannelError::WriterClosed)
            }
            _ => Err(ChannelError::NotOpen(channel)),
        }
    }

    fn close(&self, channel: ChannelId) {
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|socket| socket.id == channel) {
            if let Some(socket) = slot.take() {
                socket.shut();
            }
        }
    }

    fn is_writable(&self, channel: ChannelId) -> bool {
        self.slot()
            .as_ref()
            .is_some_and(|socket| socket.id == channel && socket.writable.load(Ordering::SeqCst))
    }
}

/// Drives one WebSocket from handshake to close.
///
/// Emits exactly one terminal event: `Failed` if the handshake or the
/// transport fails, `Closed` otherwise.
async fn run_socket(
    request: Request,
    id: ChannelId,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    writable: Arc<AtomicBool>,
    events: EventSender,
    close_grace: Duration,
) {
    let emit = |event: ChannelEvent| {
        // Event loop gone means the client is exiting.
        let _ = events.send(ClientEvent::Channel { channel: id, event });
    };

    let uri = request.uri().to_string();
    let ws_stream = match connect_async(request).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            warn!("channel {id}: could not connect to {uri}: {e}");
            emit(ChannelEvent::Failed(e.to_string()));
            return;
        }
    };
    info!("channel {id}: WebSocket connected to {uri}");

    writable.store(true, Ordering::SeqCst);
    emit(ChannelEvent::Opened);

    let (mut sink, mut stream) = ws_stream.split();

    let reason = loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => emit(ChannelEvent::Frame(text)),
                Some(Ok(WsMessage::Close(frame))) => {
                    debug!("channel {id}: close frame from server");
                    break frame
                        .map(|f| f.reason.to_string())
                        .filter(|reason| !reason.is_empty());
                }
                Some(Ok(WsMessage::Binary(_))) => {
                    debug!("channel {id}: unexpected binary frame (ignored)");
                }
                // Ping/Pong are answered by tungstenite.
                Some(Ok(_)) => {}
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                    debug!("channel {id}: stream ended");
                    break None;
                }
                Some(Err(e)) => {
                    writable.store(false, Ordering::SeqCst);
                    warn!("channel {id}: WebSocket error: {e}");
                    emit(ChannelEvent::Failed(e.to_string()));
                    return;
                }
            },

            command = outbound.recv() => match command {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = sink.send(WsMessage::Text(text)).await {
                        writable.store(false, Ordering::SeqCst);
                        warn!("channel {id}: write failed: {e}");
                        emit(ChannelEvent::Failed(e.to_string()));
                        return;
                    }
                }
                Some(Outbound::Close) | None => {
                    writable.store(false, Ordering::SeqCst);
                    debug!("channel {id}: closing");
                    let _ = sink.send(WsMessage::Close(None)).await;
                    // Wait for the server's close reply; frames that arrive
                    // meanwhile are discarded.
                    let drained = timeout(close_grace, async {
                        while let Some(Ok(_)) = stream.next().await {}
                    })
                    .await;
                    if drained.is_err() {
                        debug!("channel {id}: no close reply within {close_grace:?}");
                    }
                    break None;
                }
            },
        }
    };

    writable.store(false, Ordering::SeqCst);
    emit(ChannelEvent::Closed { reason });
}

// ── Tests ─────────────────────────────────────────────────────────────────────
