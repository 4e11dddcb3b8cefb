//! Tests for error types.

use super::*;
use crate::broker::reason;

#[test]
fn test_no_message_classification() {
    let err = WmqError::Broker(BrokerError::failed(
        reason::MQRC_NO_MSG_AVAILABLE,
        "no message available",
    ));
    assert!(err.is_no_message());
    assert!(!err.is_connection_broken());
}

#[test]
fn test_connection_broken_classification() {
    let err = WmqError::Broker(BrokerError::failed(
        reason::MQRC_CONNECTION_BROKEN,
        "connection lost",
    ));
    assert!(err.is_connection_broken());
    assert!(!err.is_no_message());
}

/// Produce wrappers are inspected through to the underlying broker outcome.
#[test]
fn test_connection_broken_seen_through_produce_wrapper() {
    let err = WmqError::Produce {
        queue: "TARGET.QUEUE".to_string(),
        source: Box::new(WmqError::Broker(BrokerError::failed(
            reason::MQRC_CONNECTION_BROKEN,
            "connection lost",
        ))),
    };
    assert!(err.is_connection_broken());
}

#[test]
fn test_other_errors_are_not_special_cased() {
    let err = WmqError::UnknownOptionToken {
        token: "MQOO_BOGUS".to_string(),
    };
    assert!(!err.is_no_message());
    assert!(!err.is_connection_broken());

    let err = WmqError::Broker(BrokerError::failed(reason::MQRC_Q_FULL, "queue full"));
    assert!(!err.is_no_message());
    assert!(!err.is_connection_broken());
}

#[test]
fn test_broker_error_accessors() {
    let err = BrokerError::failed(reason::MQRC_UNKNOWN_OBJECT_NAME, "no such queue");
    assert_eq!(err.completion_code(), crate::broker::completion::MQCC_FAILED);
    assert_eq!(err.reason_code(), reason::MQRC_UNKNOWN_OBJECT_NAME);
}

#[test]
fn test_display_formats() {
    let err = WmqError::MissingByteCodec {
        field: "correlationId".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "correlationId is a binary field, no byte codec configured"
    );

    let err = WmqError::UnsupportedMapping {
        mapper: "generated-id-field".to_string(),
        direction: MappingDirection::FromNative,
    };
    assert_eq!(
        err.to_string(),
        "generated-id-field may not be used to copy native fields from the native message"
    );
}
