//! Protocol message types for the chat channel.
//!
//! # Wire shape
//!
//! Every frame is one JSON object.  The `"type"` field names the variant and
//! the remaining fields sit beside it in the same object:
//!
//! ```json
//! {"type":"private","timestamp":"2024-05-01T10:00:00Z","from_user_id":1,"to_user_id":2,"content":"hi"}
//! {"type":"join","data":{"user_id":5,"username":"bob"}}
//! {"type":"heartbeat","content":"ping","timestamp":"2024-05-01T10:00:30Z"}
//! ```
//!
//! The envelope fields (`id`, `timestamp`) are shared by all variants and are
//! optional: the server omits them on some system messages, and the encoder
//! never writes an absent field.
//!
//! Serde's `#[serde(tag = "type")]` on [`MessageBody`] plus `#[serde(flatten)]`
//! on [`ProtocolMessage::body`] produce exactly this flat layout.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::roster::OnlineUser;
use crate::domain::session::UserId;

/// Content carried by every client-originated heartbeat.
pub const HEARTBEAT_PING: &str = "ping";

/// `read.data.status` value the server uses for a delivery acknowledgement.
pub const STATUS_DELIVERED: &str = "delivered";

// ── Message kind ──────────────────────────────────────────────────────────────

/// The discriminant of a protocol message, as written in its `"type"` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Private,
    UserList,
    Join,
    Leave,
    Error,
    Heartbeat,
    Read,
}

impl MessageKind {
    /// All kinds this client understands.
    pub const ALL: [MessageKind; 7] = [
        MessageKind::Private,
        MessageKind::UserList,
        MessageKind::Join,
        MessageKind::Leave,
        MessageKind::Error,
        MessageKind::Heartbeat,
        MessageKind::Read,
    ];

    /// Returns the wire tag for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Private => "private",
            MessageKind::UserList => "user_list",
            MessageKind::Join => "join",
            MessageKind::Leave => "leave",
            MessageKind::Error => "error",
            MessageKind::Heartbeat => "heartbeat",
            MessageKind::Read => "read",
        }
    }

    /// Maps a wire tag back to a kind.  Returns `None` for tags this client
    /// does not understand (e.g. `"typing"`).
    pub fn from_wire(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Envelope ──────────────────────────────────────────────────────────────────

/// One message on the chat channel: the shared envelope plus a typed body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolMessage {
    /// Server-assigned message identifier.  Client-originated messages leave
    /// it unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// ISO-8601 creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Variant-specific payload, including the `"type"` discriminant.
    #[serde(flatten)]
    pub body: MessageBody,
}

impl ProtocolMessage {
    /// Wraps `body` in an envelope stamped with the current time.
    pub fn new(body: MessageBody) -> Self {
        Self {
            id: None,
            timestamp: Some(Utc::now()),
            body,
        }
    }

    /// Builds an outbound private message with a fresh timestamp.
    pub fn private(from_user_id: UserId, to_user_id: UserId, content: impl Into<String>) -> Self {
        Self::new(MessageBody::Private {
            from_user_id,
            to_user_id,
            content: content.into(),
            data: None,
        })
    }

    /// Builds the keep-alive message (`content: "ping"`) with a fresh timestamp.
    pub fn heartbeat() -> Self {
        Self::new(MessageBody::Heartbeat {
            content: Some(HEARTBEAT_PING.to_string()),
        })
    }

    /// Replaces the envelope timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Returns the kind of the body.
    pub fn kind(&self) -> MessageKind {
        self.body.kind()
    }
}

// ── Bodies ────────────────────────────────────────────────────────────────────

/// The seven message variants, tagged by `"type"` on the wire.
///
/// Every non-`Option` field is required: a message that omits one fails to
/// decode as a whole and is never partially processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageBody {
    /// A direct message between two users.
    Private {
        from_user_id: UserId,
        to_user_id: UserId,
        content: String,
        /// Storage metadata the server attaches to relayed messages.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<PrivateMeta>,
    },

    /// Full list of online users.  Replaces the roster wholesale.
    UserList { data: UserListData },

    /// A user came online.
    Join { data: OnlineUser },

    /// A user went offline.
    Leave { data: OnlineUser },

    /// A server-reported problem (unknown target, bad request, ...).
    Error { data: ErrorData },

    /// Keep-alive.  The client sends `"ping"`; the server answers `"pong"`.
    Heartbeat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },

    /// Delivery/read receipt for a previously sent private message.
    Read { data: ReadReceipt },
}

impl MessageBody {
    /// Returns the discriminant of this body.
    pub fn kind(&self) -> MessageKind {
        match self {
            MessageBody::Private { .. } => MessageKind::Private,
            MessageBody::UserList { .. } => MessageKind::UserList,
            MessageBody::Join { .. } => MessageKind::Join,
            MessageBody::Leave { .. } => MessageKind::Leave,
            MessageBody::Error { .. } => MessageKind::Error,
            MessageBody::Heartbeat { .. } => MessageKind::Heartbeat,
            MessageBody::Read { .. } => MessageKind::Read,
        }
    }
}

/// Metadata on a relayed private message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// `true` when the message was stored while the recipient was offline and
    /// is being delivered late.
    #[serde(default)]
    pub is_offline: bool,
}

/// Payload of a `user_list` message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserListData {
    pub users: Vec<OnlineUser>,
}

/// Payload of an `error` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorData {
    /// HTTP-style status code (e.g. `404` when the target is offline).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    /// Human-readable reason, shown to the user verbatim.
    pub message: String,
}

/// Payload of a `read` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadReceipt {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_message_id: Option<String>,
}

impl ReadReceipt {
    /// Returns `true` for a delivery acknowledgement.
    pub fn is_delivered(&self) -> bool {
        self.status == STATUS_DELIVERED
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
