//! End-to-end error routing: untranslatable messages are forwarded to a
//! recovery queue instead of being lost.

mod common;

use bytes::Bytes;
use common::{init_tracing, RecordingListener};
use std::sync::Arc;
use wmq_bridge::{
    ConsumeBridge, ForwardingErrorHandler, InMemoryBroker, MessageFormat, MessageOptions,
    NativeMessage,
};

fn untranslatable() -> NativeMessage {
    // A Text-format message whose payload is not valid UTF-8
    let mut msg = MessageFormat::Text.create();
    msg.set_payload(Bytes::from(vec![0xd8, 0x00, 0xff]));
    msg.user_id = "upstream".to_string();
    msg
}

#[tokio::test]
async fn test_untranslatable_message_lands_on_recovery_queue() {
    init_tracing();
    let broker = InMemoryBroker::new();
    broker.push_message("IN.QUEUE", untranslatable());

    let listener = Arc::new(RecordingListener::default());
    let consumer = ConsumeBridge::new(Arc::new(broker.clone()), "IN.QUEUE", listener.clone())
        .with_error_handler(Arc::new(ForwardingErrorHandler::new("RECOVERY.QUEUE")));

    let count = consumer.process_messages().await;

    assert_eq!(count, 0);
    assert_eq!(listener.count(), 0);
    assert_eq!(broker.depth("IN.QUEUE"), 0);

    let recovered = broker.messages("RECOVERY.QUEUE");
    assert_eq!(recovered.len(), 1);
    assert_eq!(recovered[0].payload().as_ref(), &[0xd8, 0x00, 0xff]);
    assert_eq!(recovered[0].user_id, "upstream");
}

/// The recovered message can be drained from the recovery queue with a
/// shape that does not constrain the payload.
#[tokio::test]
async fn test_recovered_message_is_consumable_as_bytes() {
    init_tracing();
    let broker = InMemoryBroker::new();
    broker.push_message("IN.QUEUE", untranslatable());

    let dropped = Arc::new(RecordingListener::default());
    ConsumeBridge::new(Arc::new(broker.clone()), "IN.QUEUE", dropped)
        .with_error_handler(Arc::new(ForwardingErrorHandler::new("RECOVERY.QUEUE")))
        .process_messages()
        .await;

    let drained = Arc::new(RecordingListener::default());
    let count = ConsumeBridge::new(
        Arc::new(broker.clone()),
        "RECOVERY.QUEUE",
        drained.clone(),
    )
    .with_options(MessageOptions::default().with_message_format(MessageFormat::Bytes))
    .process_messages()
    .await;

    assert_eq!(count, 1);
    assert_eq!(drained.messages()[0].payload().as_ref(), &[0xd8, 0x00, 0xff]);
}

/// Good messages after a routed failure are picked up by the next cycle,
/// preserving broker order.
#[tokio::test]
async fn test_processing_resumes_on_next_cycle() {
    init_tracing();
    let broker = InMemoryBroker::new();
    broker.push_message("IN.QUEUE", untranslatable());
    let mut good = MessageFormat::Text.create();
    good.set_payload(Bytes::from("still translatable"));
    broker.push_message("IN.QUEUE", good);

    let listener = Arc::new(RecordingListener::default());
    let consumer = ConsumeBridge::new(Arc::new(broker.clone()), "IN.QUEUE", listener.clone())
        .with_error_handler(Arc::new(ForwardingErrorHandler::new("RECOVERY.QUEUE")));

    // First cycle routes the bad message and ends
    assert_eq!(consumer.process_messages().await, 0);
    assert_eq!(broker.depth("RECOVERY.QUEUE"), 1);

    // Second cycle picks up the remaining good message
    assert_eq!(consumer.process_messages().await, 1);
    assert_eq!(
        listener.messages()[0].payload().as_ref(),
        b"still translatable"
    );
}
