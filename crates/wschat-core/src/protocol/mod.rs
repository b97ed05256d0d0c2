//! JSON wire protocol: message types and the text codec.

pub mod codec;
pub mod messages;

pub use codec::{decode, decode_frame, encode, DecodeError, EncodeError, Inbound};
pub use messages::{MessageBody, MessageKind, ProtocolMessage};
