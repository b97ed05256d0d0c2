//! Text codec for chat protocol messages.
//!
//! Wire format: one JSON object per message, UTF-8 text, no length prefix.
//! The reference server may coalesce several messages into a single text
//! frame separated by `\n`; [`decode_frame`] handles that case.
//!
//! Decoding happens in two steps so that the three failure modes stay
//! distinguishable:
//!
//! 1. Parse the text as generic JSON.  Failure → [`DecodeError::Syntax`].
//! 2. Read the `"type"` tag.  An unknown tag is *not* an error: it yields
//!    [`Inbound::Unknown`] so newer servers can add message types without
//!    breaking older clients.
//! 3. Deserialize the known variant.  Missing required fields →
//!    [`DecodeError::Malformed`]; nothing from that message is used.

use serde_json::Value;
use thiserror::Error;

use crate::protocol::messages::{MessageKind, ProtocolMessage};

/// Errors that can occur while decoding an inbound frame.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The text is not well-formed JSON.
    #[error("frame is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    /// The JSON is valid but is not an object (e.g. an array or a number).
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// The object has no string `"type"` field.
    #[error("message has no string \"type\" field")]
    MissingType,

    /// The type is known but required fields are missing or mistyped.
    #[error("malformed {kind} message: {source}")]
    Malformed {
        kind: MessageKind,
        #[source]
        source: serde_json::Error,
    },
}

/// A message could not be serialized.
#[derive(Debug, Error)]
#[error("failed to encode {kind} message: {source}")]
pub struct EncodeError {
    pub kind: MessageKind,
    #[source]
    pub source: serde_json::Error,
}

/// Result of successfully decoding one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A message of a type this client understands.
    Known(ProtocolMessage),
    /// A well-formed message whose `"type"` this client does not understand.
    Unknown { kind: String },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`ProtocolMessage`] as a single-line JSON object.
///
/// Absent optional fields are omitted rather than written as `null`.
///
/// # Errors
///
/// Returns [`EncodeError`] if serialization fails.
///
/// # Examples
///
/// ```rust
/// use wschat_core::protocol::{decode, encode, Inbound, ProtocolMessage};
///
/// let msg = ProtocolMessage::private(1, 2, "hi");
/// let text = encode(&msg).unwrap();
/// assert_eq!(decode(&text).unwrap(), Inbound::Known(msg));
/// ```
pub fn encode(msg: &ProtocolMessage) -> Result<String, EncodeError> {
    serde_json::to_string(msg).map_err(|source| EncodeError {
        kind: msg.kind(),
        source,
    })
}

/// Decodes one message from `raw`.
///
/// # Errors
///
/// Returns [`DecodeError`] if `raw` is not a JSON object with a string
/// `"type"`, or if a known type lacks its required fields.
pub fn decode(raw: &str) -> Result<Inbound, DecodeError> {
    let value: Value = serde_json::from_str(raw).map_err(DecodeError::Syntax)?;

    let tag = match &value {
        Value::Object(map) => match map.get("type") {
            Some(Value::String(tag)) => tag.clone(),
            _ => return Err(DecodeError::MissingType),
        },
        _ => return Err(DecodeError::NotAnObject),
    };

    let Some(kind) = MessageKind::from_wire(&tag) else {
        return Ok(Inbound::Unknown { kind: tag });
    };

    serde_json::from_value(value)
        .map(Inbound::Known)
        .map_err(|source| DecodeError::Malformed { kind, source })
}

/// Decodes every message in a text frame.
///
/// Each non-blank line is decoded independently, so a bad line yields one
/// `Err` entry without affecting its neighbours.  A frame holding a single
/// message produces a single entry.
pub fn decode_frame(frame: &str) -> Vec<Result<Inbound, DecodeError>> {
    frame
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(decode)
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::MessageBody;

    #[test]
    fn test_decode_rejects_truncated_json_as_syntax_error() {
        let result = decode("{not json");
        assert!(matches!(result, Err(DecodeError::Syntax(_))));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(matches!(decode("[1,2,3]"), Err(DecodeError::NotAnObject)));
        assert!(matches!(decode("42"), Err(DecodeError::NotAnObject)));
    }

    #[test]
    fn test_decode_rejects_missing_or_non_string_type() {
        assert!(matches!(decode(r#"{"content":"x"}"#), Err(DecodeError::MissingType)));
        assert!(matches!(decode(r#"{"type":7}"#), Err(DecodeError::MissingType)));
    }

    #[test]
    fn test_decode_unknown_type_is_not_an_error() {
        // Arrange – the reference server also emits "typing" messages
        let raw = r#"{"type":"typing","from_user_id":3,"to_user_id":1}"#;

        // Act
        let inbound = decode(raw).unwrap();

        // Assert
        assert_eq!(
            inbound,
            Inbound::Unknown {
                kind: "typing".to_string()
            }
        );
    }

    #[test]
    fn test_decode_join_without_timestamp() {
        // Arrange
        let raw = r#"{"type":"join","data":{"user_id":5,"username":"bob"}}"#;

        // Act
        let Inbound::Known(msg) = decode(raw).unwrap() else {
            panic!("expected a known message");
        };

        // Assert
        assert!(msg.timestamp.is_none());
        match msg.body {
            MessageBody::Join { data } => {
                assert_eq!(data.user_id, 5);
                assert_eq!(data.username, "bob");
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_decode_private_missing_content_is_malformed() {
        let raw = r#"{"type":"private","from_user_id":1,"to_user_id":2}"#;
        let err = decode(raw).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Malformed {
                kind: MessageKind::Private,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_user_list_missing_users_is_malformed() {
        let raw = r#"{"type":"user_list","data":{}}"#;
        assert!(matches!(
            decode(raw),
            Err(DecodeError::Malformed {
                kind: MessageKind::UserList,
                ..
            })
        ));
    }

    #[test]
    fn test_decode_tolerates_server_envelope_extras() {
        // Arrange – the reference server always writes every envelope field,
        // zero-valued where unused, plus extra user attributes.
        let raw = r#"{"id":"1714557600_ab12cd34","type":"leave","from_user_id":0,"to_user_id":0,"content":"","timestamp":"2024-05-01T10:00:00.123456789+08:00","data":{"user_id":9,"username":"zed","avatar":"","status":"online","last_seen":"2024-05-01T10:00:00+08:00"}}"#;

        // Act
        let Inbound::Known(msg) = decode(raw).unwrap() else {
            panic!("expected a known message");
        };

        // Assert
        assert_eq!(msg.id.as_deref(), Some("1714557600_ab12cd34"));
        assert!(msg.timestamp.is_some());
        assert_eq!(msg.kind(), MessageKind::Leave);
    }

    #[test]
    fn test_encode_omits_absent_optional_fields() {
        // Arrange
        let msg = ProtocolMessage {
            id: None,
            timestamp: None,
            body: MessageBody::Heartbeat { content: None },
        };

        // Act
        let text = encode(&msg).unwrap();

        // Assert
        assert_eq!(text, r#"{"type":"heartbeat"}"#);
        assert!(!text.contains("null"));
    }

    #[test]
    fn test_encode_private_writes_all_required_fields() {
        let msg = ProtocolMessage::private(1, 2, "hi");
        let value: Value = serde_json::from_str(&encode(&msg).unwrap()).unwrap();
        assert_eq!(value["type"], "private");
        assert_eq!(value["from_user_id"], 1);
        assert_eq!(value["to_user_id"], 2);
        assert_eq!(value["content"], "hi");
        assert!(value["timestamp"].is_string());
        assert!(value.get("data").is_none());
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_decode_frame_splits_coalesced_messages() {
        // Arrange – two messages written into one frame
        let frame = "{\"type\":\"heartbeat\",\"content\":\"pong\"}\n{\"type\":\"leave\",\"data\":{\"user_id\":2,\"username\":\"b\"}}";

        // Act
        let results = decode_frame(frame);

        // Assert
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(Result::is_ok));
    }

    #[test]
    fn test_decode_frame_isolates_bad_line() {
        let frame = "{not json\n{\"type\":\"heartbeat\"}";
        let results = decode_frame(frame);
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert!(results[1].is_ok());
    }

    #[test]
    fn test_decode_frame_ignores_blank_lines() {
        assert!(decode_frame("").is_empty());
        assert_eq!(decode_frame("\n{\"type\":\"heartbeat\"}\n\n").len(), 1);
    }
}
