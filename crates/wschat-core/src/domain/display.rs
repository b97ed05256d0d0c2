//! UI-facing projection of chat traffic.
//!
//! A [`DisplayMessage`] is never sent over the wire.  The client creates one
//! when its own private message is handed to the channel (an optimistic echo),
//! when a private message arrives, or for a system notice; the presentation
//! layer then owns it in its transcript.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::session::UserId;

/// Which way a displayed message travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
    System,
}

/// How prominently a notice should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One entry in the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMessage {
    /// Author.  `None` for system notices.
    pub from: Option<UserId>,
    /// Recipient, set on sent messages.
    pub to: Option<UserId>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    pub severity: Severity,
}

impl DisplayMessage {
    /// Local echo of a message this client just handed to the channel.
    pub fn sent(from: UserId, to: UserId, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            content: content.into(),
            timestamp,
            direction: Direction::Sent,
            severity: Severity::Info,
        }
    }

    /// A private message received from another user.
    pub fn received(from: UserId, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: None,
            content: content.into(),
            timestamp,
            direction: Direction::Received,
            severity: Severity::Info,
        }
    }

    /// A client- or server-originated notice, stamped now.
    pub fn system(content: impl Into<String>, severity: Severity) -> Self {
        Self {
            from: None,
            to: None,
            content: content.into(),
            timestamp: Utc::now(),
            direction: Direction::System,
            severity,
        }
    }
}
