//! Message router: dispatches decoded inbound messages by `type`.
//!
//! | type        | effect                                                   |
//! |-------------|----------------------------------------------------------|
//! | `private`   | render a received `DisplayMessage`                       |
//! | `user_list` | replace the roster, render it and its count              |
//! | `join`      | system notice, request an online-count refresh           |
//! | `leave`     | system notice, request an online-count refresh           |
//! | `error`     | error-severity notice with the server's text verbatim    |
//! | `heartbeat` | nothing                                                  |
//! | `read`      | count `delivered` receipts, nothing shown                |
//! | unknown     | logged, nothing else                                     |
//!
//! Frames that fail to decode are logged and dropped; they never reach the
//! match and never affect the connection.

use chrono::Utc;
use tracing::{debug, info, warn};
use wschat_core::{
    decode_frame, DisplayMessage, Inbound, MessageBody, OnlineUserRoster, ProtocolMessage,
    Severity,
};

use crate::application::presenter::PresentationAdapter;

/// Source of the online-user count.
///
/// `join`/`leave` carry no count, so the router asks for a refresh and the
/// implementation reports the new value back to the event loop when it has
/// one.  Failures are the implementation's to log; nothing is surfaced.
#[cfg_attr(test, mockall::automock)]
pub trait OnlineCountSource: Send + Sync {
    fn request_refresh(&self);
}

/// What the router did with one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A private message was rendered.
    Rendered,
    /// The roster was replaced and now holds `count` users.
    RosterReplaced { count: usize },
    /// A join/leave notice was shown and a count refresh requested.
    PresenceNotified,
    /// A server `error` was shown.
    ServerError,
    /// Heartbeat response; nothing to do.
    HeartbeatAck,
    /// A `delivered` receipt was counted.
    DeliveryObserved,
    /// A `read` message with some other status.
    ReceiptIgnored,
    /// A well-formed message of a type this client does not know.
    Unknown(String),
    /// The message could not be decoded.
    Dropped,
}

/// Routes inbound messages and owns the online-user roster.
#[derive(Debug, Default)]
pub struct MessageRouter {
    roster: OnlineUserRoster,
    delivered: u64,
}

impl MessageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes every message in `frame` and dispatches each one in order.
    pub fn route_frame(
        &mut self,
        frame: &str,
        presenter: &dyn PresentationAdapter,
        counts: &dyn OnlineCountSource,
    ) -> Vec<RouteOutcome> {
        decode_frame(frame)
            .into_iter()
            .map(|decoded| match decoded {
                Ok(inbound) => self.dispatch(inbound, presenter, counts),
                Err(e) => {
                    warn!("dropping undecodable message: {e}");
                    RouteOutcome::Dropped
                }
            })
            .collect()
    }

    /// Applies one decoded message.
    pub fn dispatch(
        &mut self,
        inbound: Inbound,
        presenter: &dyn PresentationAdapter,
        counts: &dyn OnlineCountSource,
    ) -> RouteOutcome {
        let msg = match inbound {
            Inbound::Known(msg) => msg,
            Inbound::Unknown { kind } => {
                info!("ignoring message of unknown type {kind:?}");
                return RouteOutcome::Unknown(kind);
            }
        };

        let ProtocolMessage { id, timestamp, body } = msg;

        match body {
            MessageBody::Private {
                from_user_id,
                content,
                data,
                ..
            } => {
                if let Some(meta) = data.filter(|meta| meta.is_offline) {
                    debug!(
                        "offline message {:?} from user {from_user_id} delivered late",
                        meta.message_id
                    );
                }
                let timestamp = timestamp.unwrap_or_else(Utc::now);
                let message = DisplayMessage::received(from_user_id, content, timestamp);
                presenter.render_message(&message);
                RouteOutcome::Rendered
            }

            MessageBody::UserList { data } => {
                self.roster.replace(data.users);
                let count = self.roster.len();
                debug!("roster replaced: {count} users online");
                presenter.render_roster(&self.roster);
                presenter.set_online_count(count);
                RouteOutcome::RosterReplaced { count }
            }

            MessageBody::Join { data } => {
                let text = format!("{} joined the chat", data.username);
                presenter.render_system_notice(&text, Severity::Info);
                counts.request_refresh();
                RouteOutcome::PresenceNotified
            }

            MessageBody::Leave { data } => {
                let text = format!("{} left the chat", data.username);
                presenter.render_system_notice(&text, Severity::Info);
                counts.request_refresh();
                RouteOutcome::PresenceNotified
            }

            MessageBody::Error { data } => {
                match data.code {
                    Some(code) => warn!("server error {code}: {}", data.message),
                    None => warn!("server error: {}", data.message),
                }
                let text = format!("error: {}", data.message);
                presenter.render_system_notice(&text, Severity::Error);
                RouteOutcome::ServerError
            }

            MessageBody::Heartbeat { .. } => RouteOutcome::HeartbeatAck,

            MessageBody::Read { data } => {
                if data.is_delivered() {
                    self.delivered += 1;
                    debug!(
                        "message {:?} delivered (receipt {:?})",
                        data.original_message_id, id
                    );
                    RouteOutcome::DeliveryObserved
                } else {
                    debug!("ignoring read receipt with status {:?}", data.status);
                    RouteOutcome::ReceiptIgnored
                }
            }
        }
    }

    /// The roster as last reported by the server.
    pub fn roster(&self) -> &OnlineUserRoster {
        &self.roster
    }

    /// Number of `delivered` receipts seen so far.
    pub fn delivered_count(&self) -> u64 {
        self.delivered
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
