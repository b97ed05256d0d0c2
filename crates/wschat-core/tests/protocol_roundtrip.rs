//! Integration tests for the wschat-core protocol codec.
//!
//! Every well-formed message variant must survive `encode` followed by
//! `decode` unchanged, and the captured server frames below must decode into
//! the expected variants.

use chrono::{TimeZone, Utc};
use wschat_core::{
    decode, decode_frame, encode,
    protocol::messages::{ErrorData, PrivateMeta, ReadReceipt, UserListData},
    DecodeError, Inbound, MessageBody, MessageKind, OnlineUser, ProtocolMessage,
};

/// Encodes a message and then decodes it, returning the decoded message.
fn roundtrip(msg: &ProtocolMessage) -> ProtocolMessage {
    let text = encode(msg).expect("encode must succeed");
    match decode(&text).expect("decode must succeed") {
        Inbound::Known(decoded) => decoded,
        Inbound::Unknown { kind } => panic!("encoded message decoded as unknown type {kind}"),
    }
}

fn fixed_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
}

#[test]
fn test_roundtrip_private_message() {
    let original = ProtocolMessage::private(1, 2, "hello there");
    assert_eq!(roundtrip(&original), original);
}

#[test]
fn test_roundtrip_private_message_with_metadata_and_id() {
    let original = ProtocolMessage {
        id: Some("1714557600_ab12cd34".to_string()),
        timestamp: Some(fixed_time()),
        body: MessageBody::Private {
            from_user_id: 7,
            to_user_id: 1,
            content: "stored while you were away".to_string(),
            data: Some(PrivateMeta {
                message_id: Some("6632f0".to_string()),
                session_id: Some("1_7".to_string()),
                is_offline: true,
            }),
        },
    };
    assert_eq!(roundtrip(&original), original);
}

#[test]
fn test_roundtrip_user_list() {
    let original = ProtocolMessage::new(MessageBody::UserList {
        data: UserListData {
            users: vec![OnlineUser::new(1, "a"), OnlineUser::new(2, "b")],
        },
    });
    assert_eq!(roundtrip(&original), original);
}

#[test]
fn test_roundtrip_join_and_leave() {
    let join = ProtocolMessage::new(MessageBody::Join {
        data: OnlineUser::new(5, "bob"),
    });
    let leave = ProtocolMessage::new(MessageBody::Leave {
        data: OnlineUser::new(5, "bob"),
    });
    assert_eq!(roundtrip(&join), join);
    assert_eq!(roundtrip(&leave), leave);
}

#[test]
fn test_roundtrip_error_with_and_without_code() {
    let with_code = ProtocolMessage::new(MessageBody::Error {
        data: ErrorData {
            code: Some(404),
            message: "target user is offline".to_string(),
        },
    });
    let without_code = ProtocolMessage::new(MessageBody::Error {
        data: ErrorData {
            code: None,
            message: "bad request".to_string(),
        },
    });
    assert_eq!(roundtrip(&with_code), with_code);
    assert_eq!(roundtrip(&without_code), without_code);
}

#[test]
fn test_roundtrip_heartbeat() {
    let original = ProtocolMessage::heartbeat();
    assert_eq!(roundtrip(&original), original);
}

#[test]
fn test_roundtrip_read_receipt() {
    let original = ProtocolMessage::new(MessageBody::Read {
        data: ReadReceipt {
            status: "delivered".to_string(),
            original_message_id: Some("1714557600_ab12cd34".to_string()),
        },
    })
    .with_timestamp(fixed_time());
    assert_eq!(roundtrip(&original), original);
}

#[test]
fn test_roundtrip_covers_every_kind() {
    // Guard: if a kind is added, this list must grow with it.
    let samples = [
        ProtocolMessage::private(1, 2, "x"),
        ProtocolMessage::new(MessageBody::UserList {
            data: UserListData::default(),
        }),
        ProtocolMessage::new(MessageBody::Join {
            data: OnlineUser::new(1, "a"),
        }),
        ProtocolMessage::new(MessageBody::Leave {
            data: OnlineUser::new(1, "a"),
        }),
        ProtocolMessage::new(MessageBody::Error {
            data: ErrorData {
                code: None,
                message: "e".to_string(),
            },
        }),
        ProtocolMessage::heartbeat(),
        ProtocolMessage::new(MessageBody::Read {
            data: ReadReceipt {
                status: "delivered".to_string(),
                original_message_id: None,
            },
        }),
    ];
    let kinds: Vec<MessageKind> = samples.iter().map(|m| roundtrip(m).kind()).collect();
    assert_eq!(kinds, MessageKind::ALL.to_vec());
}

#[test]
fn test_decode_server_user_list_frame() {
    // Arrange
    let raw = r#"{"type":"user_list","data":{"users":[{"user_id":1,"username":"a"},{"user_id":2,"username":"b"}]}}"#;

    // Act
    let inbound = decode(raw).unwrap();

    // Assert
    let Inbound::Known(ProtocolMessage {
        body: MessageBody::UserList { data },
        ..
    }) = inbound
    else {
        panic!("expected user_list, got {inbound:?}");
    };
    assert_eq!(data.users, vec![OnlineUser::new(1, "a"), OnlineUser::new(2, "b")]);
}

#[test]
fn test_decode_server_heartbeat_pong() {
    let raw = r#"{"id":"x","type":"heartbeat","from_user_id":0,"to_user_id":0,"content":"pong","timestamp":"2024-05-01T10:00:30Z"}"#;
    let Inbound::Known(msg) = decode(raw).unwrap() else {
        panic!("expected heartbeat");
    };
    assert_eq!(
        msg.body,
        MessageBody::Heartbeat {
            content: Some("pong".to_string())
        }
    );
}

#[test]
fn test_decode_error_without_message_is_malformed() {
    let raw = r#"{"type":"error","data":{"code":400}}"#;
    assert!(matches!(
        decode(raw),
        Err(DecodeError::Malformed {
            kind: MessageKind::Error,
            ..
        })
    ));
}

#[test]
fn test_decode_frame_with_unknown_and_known_lines() {
    let frame = "{\"type\":\"typing\",\"from_user_id\":3}\n{\"type\":\"heartbeat\",\"content\":\"pong\"}";
    let results = decode_frame(frame);
    assert!(matches!(results[0], Ok(Inbound::Unknown { .. })));
    assert!(matches!(results[1], Ok(Inbound::Known(_))));
}
