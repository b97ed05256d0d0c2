//! # wschat-core
//!
//! Shared library for the wschat terminal client containing the JSON wire
//! protocol, its codec, and the session-level domain types.
//!
//! This crate performs no I/O: it has no sockets, no timers, and no terminal
//! access.  The client application (`wschat-client`) layers the connection
//! state machine, heartbeat, and presentation on top of it.
//!
//! - **`protocol`** – What travels over the chat channel.  Every frame is a
//!   JSON object whose `"type"` field selects one of seven message variants.
//!   The codec turns typed messages into text and back, and classifies
//!   anything it cannot use as a [`DecodeError`] or an unknown type.
//!
//! - **`domain`** – The local participant ([`Session`]), what the UI shows
//!   ([`DisplayMessage`]), and who is online ([`OnlineUserRoster`]).

pub mod domain;
pub mod protocol;

pub use domain::display::{Direction, DisplayMessage, Severity};
pub use domain::roster::{OnlineUser, OnlineUserRoster};
pub use domain::session::{Session, UserId, ValidationError};
pub use protocol::codec::{decode, decode_frame, encode, DecodeError, EncodeError, Inbound};
pub use protocol::messages::{MessageBody, MessageKind, ProtocolMessage};
