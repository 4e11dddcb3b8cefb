//! Tests for field mappers.

use super::*;
use bytes::Bytes;

fn native() -> NativeMessage {
    NativeMessage::new()
}

// ============================================================================
// Configured values
// ============================================================================

mod configured_field {
    use super::*;

    #[test]
    fn test_writes_fixed_value() {
        let mapper = FieldMapper::configured("userId", "mqadmin");
        let msg = GenericMessage::new();
        let mut native = native();
        mapper.to_native(&msg, &mut native).unwrap();
        assert_eq!(native.user_id, "mqadmin");
    }

    #[test]
    fn test_null_value_with_convert_null_writes_empty_string() {
        let mapper = FieldMapper::ConfiguredField {
            field_name: "applicationIdData".to_string(),
            value: None,
            byte_codec: None,
            convert_null: true,
        };
        let msg = GenericMessage::new();
        let mut native = native();
        native.application_id_data = "previous".to_string();
        mapper.to_native(&msg, &mut native).unwrap();
        assert_eq!(native.application_id_data, "");
    }

    #[test]
    fn test_null_value_without_convert_null_fails() {
        let mapper = FieldMapper::ConfiguredField {
            field_name: "applicationIdData".to_string(),
            value: None,
            byte_codec: None,
            convert_null: false,
        };
        let msg = GenericMessage::new();
        let mut native = native();
        assert!(mapper.to_native(&msg, &mut native).is_err());
    }

    #[test]
    fn test_from_native_is_unsupported() {
        let mapper = FieldMapper::configured("userId", "mqadmin");
        let mut msg = GenericMessage::new();
        let err = mapper.from_native(&native(), &mut msg).unwrap_err();
        assert!(matches!(
            err,
            WmqError::UnsupportedMapping {
                direction: MappingDirection::FromNative,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_field_name_fails() {
        let mapper = FieldMapper::configured("noSuchField", "value");
        let msg = GenericMessage::new();
        assert!(matches!(
            mapper.to_native(&msg, &mut native()),
            Err(WmqError::UnsupportedField { .. })
        ));
    }
}

// ============================================================================
// Metadata values
// ============================================================================

mod metadata_field {
    use super::*;

    #[test]
    fn test_copies_metadata_to_native() {
        let mapper = FieldMapper::metadata("replyToQueueName", "reply-queue");
        let msg = GenericMessage::new().with_metadata("reply-queue", "REPLY.QUEUE");
        let mut native = native();
        mapper.to_native(&msg, &mut native).unwrap();
        assert_eq!(native.reply_to_queue_name, "REPLY.QUEUE");
    }

    /// A missing key is a logged no-op, not an error.
    #[test]
    fn test_missing_key_is_ignored() {
        let mapper = FieldMapper::metadata("replyToQueueName", "reply-queue");
        let msg = GenericMessage::new();
        let mut native = native();
        native.reply_to_queue_name = "UNTOUCHED".to_string();
        mapper.to_native(&msg, &mut native).unwrap();
        assert_eq!(native.reply_to_queue_name, "UNTOUCHED");
    }

    #[test]
    fn test_copies_native_to_metadata() {
        let mapper = FieldMapper::metadata("priority", "mq-priority");
        let mut native = native();
        native.priority = 5;
        let mut msg = GenericMessage::new();
        mapper.from_native(&native, &mut msg).unwrap();
        assert_eq!(msg.metadata_value("mq-priority"), Some("5"));
    }

    #[test]
    fn test_binary_field_uses_codec() {
        let mapper =
            FieldMapper::metadata("correlationId", "correlation").with_byte_codec(ByteCodec::Hex);
        let msg = GenericMessage::new().with_metadata("correlation", "beef");
        let mut native = native();
        mapper.to_native(&msg, &mut native).unwrap();
        assert_eq!(native.correlation_id, vec![0xbe, 0xef]);

        let mut back = GenericMessage::new();
        mapper.from_native(&native, &mut back).unwrap();
        assert_eq!(back.metadata_value("correlation"), Some("beef"));
    }

    #[test]
    fn test_binary_field_without_codec_fails() {
        let mapper = FieldMapper::metadata("correlationId", "correlation");
        let msg = GenericMessage::new().with_metadata("correlation", "beef");
        assert!(matches!(
            mapper.to_native(&msg, &mut native()),
            Err(WmqError::MissingByteCodec { .. })
        ));
    }
}

// ============================================================================
// Generated identifiers
// ============================================================================

mod generated_id_field {
    use super::*;

    /// Every call writes a freshly generated token; the value is not
    /// replayable.
    #[test]
    fn test_generates_fresh_value_per_call() {
        let mapper = FieldMapper::generated_id("applicationIdData");
        let msg = GenericMessage::new();
        let mut first = native();
        let mut second = native();
        mapper.to_native(&msg, &mut first).unwrap();
        mapper.to_native(&msg, &mut second).unwrap();
        assert!(!first.application_id_data.is_empty());
        assert_ne!(first.application_id_data, second.application_id_data);
    }

    #[test]
    fn test_from_native_is_unsupported() {
        let mapper = FieldMapper::generated_id("applicationIdData");
        let mut msg = GenericMessage::new();
        let err = mapper.from_native(&native(), &mut msg).unwrap_err();
        assert!(matches!(err, WmqError::UnsupportedMapping { .. }));
    }
}

// ============================================================================
// Extracted expressions
// ============================================================================

mod json_path_field {
    use super::*;

    fn json_message(payload: &str) -> GenericMessage {
        GenericMessage::new().with_payload(Bytes::copy_from_slice(payload.as_bytes()))
    }

    #[test]
    fn test_extracts_single_match() {
        let mapper = FieldMapper::json_path("replyToQueueName", "order.replyTo");
        let msg = json_message(r#"{"order": {"replyTo": "REPLY.QUEUE", "id": 12}}"#);
        let mut native = native();
        mapper.to_native(&msg, &mut native).unwrap();
        assert_eq!(native.reply_to_queue_name, "REPLY.QUEUE");
    }

    #[test]
    fn test_numeric_match_is_stringified() {
        let mapper = FieldMapper::json_path("priority", "order.priority");
        let msg = json_message(r#"{"order": {"priority": 7}}"#);
        let mut native = native();
        mapper.to_native(&msg, &mut native).unwrap();
        assert_eq!(native.priority, 7);
    }

    #[test]
    fn test_array_index_segment() {
        let mapper = FieldMapper::json_path("userId", "users.1");
        let msg = json_message(r#"{"users": ["first", "second"]}"#);
        let mut native = native();
        mapper.to_native(&msg, &mut native).unwrap();
        assert_eq!(native.user_id, "second");
    }

    /// With multiple matches any one is acceptable; the choice is
    /// non-deterministic by design, so assert membership rather than a
    /// specific element.
    #[test]
    fn test_wildcard_picks_any_match() {
        let mapper = FieldMapper::json_path("userId", "entries.*.owner");
        let msg = json_message(
            r#"{"entries": [{"owner": "alpha"}, {"owner": "beta"}, {"owner": "gamma"}]}"#,
        );
        let mut native = native();
        mapper.to_native(&msg, &mut native).unwrap();
        assert!(["alpha", "beta", "gamma"].contains(&native.user_id.as_str()));
    }

    #[test]
    fn test_no_match_fails_without_convert_null() {
        let mapper = FieldMapper::json_path("userId", "missing.path");
        let msg = json_message(r#"{"present": 1}"#);
        assert!(matches!(
            mapper.to_native(&msg, &mut native()),
            Err(WmqError::Extraction { .. })
        ));
    }

    #[test]
    fn test_no_match_with_convert_null_writes_empty_string() {
        let mapper =
            FieldMapper::json_path("userId", "missing.path").with_convert_null(true);
        let msg = json_message(r#"{"present": 1}"#);
        let mut native = native();
        native.user_id = "previous".to_string();
        mapper.to_native(&msg, &mut native).unwrap();
        assert_eq!(native.user_id, "");
    }

    #[test]
    fn test_invalid_payload_fails() {
        let mapper = FieldMapper::json_path("userId", "a.b");
        let msg = json_message("not json at all");
        assert!(matches!(
            mapper.to_native(&msg, &mut native()),
            Err(WmqError::Extraction { .. })
        ));
    }

    #[test]
    fn test_from_native_is_unsupported() {
        let mapper = FieldMapper::json_path("userId", "a.b");
        let mut msg = GenericMessage::new();
        let err = mapper.from_native(&native(), &mut msg).unwrap_err();
        assert!(matches!(err, WmqError::UnsupportedMapping { .. }));
    }
}

// ============================================================================
// Identifier copies
// ============================================================================

mod message_id_field {
    use super::*;

    #[test]
    fn test_copies_unique_id_to_native() {
        let mapper = FieldMapper::message_id().with_byte_codec(ByteCodec::Utf8);
        let msg = GenericMessage::new();
        let mut native = native();
        mapper.to_native(&msg, &mut native).unwrap();
        assert_eq!(native.message_id, msg.unique_id().as_bytes());
    }

    #[test]
    fn test_copies_native_id_to_unique_id() {
        let mapper = FieldMapper::message_id().with_byte_codec(ByteCodec::Utf8);
        let mut native = native();
        native.message_id = b"restored-identifier".to_vec();
        let mut msg = GenericMessage::new();
        mapper.from_native(&native, &mut msg).unwrap();
        assert_eq!(msg.unique_id(), "restored-identifier");
    }

    #[test]
    fn test_alternate_target_field() {
        let mapper = FieldMapper::message_id_on("correlationId").with_byte_codec(ByteCodec::Utf8);
        let msg = GenericMessage::new();
        let mut native = native();
        mapper.to_native(&msg, &mut native).unwrap();
        assert_eq!(native.correlation_id, msg.unique_id().as_bytes());
    }
}

// ============================================================================
// Configuration shape
// ============================================================================

mod config {
    use super::*;

    #[test]
    fn test_deserializes_from_tagged_config() {
        let json = r#"{
            "type": "metadata-field",
            "field_name": "correlationId",
            "metadata_key": "correlation",
            "byte_codec": "Hex"
        }"#;
        let mapper: FieldMapper = serde_json::from_str(json).unwrap();
        assert_eq!(
            mapper,
            FieldMapper::metadata("correlationId", "correlation").with_byte_codec(ByteCodec::Hex)
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let mappers = vec![
            FieldMapper::configured("userId", "mqadmin"),
            FieldMapper::generated_id("correlationId").with_byte_codec(ByteCodec::Utf8),
            FieldMapper::json_path("priority", "order.priority").with_convert_null(true),
            FieldMapper::message_id(),
        ];
        let json = serde_json::to_string(&mappers).unwrap();
        let back: Vec<FieldMapper> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mappers);
    }
}
