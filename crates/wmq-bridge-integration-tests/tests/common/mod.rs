//! Shared helpers for the bridge integration tests.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Mutex, Once};
use wmq_bridge::{GenericMessage, MessageListener, WmqError};

static INIT_TRACING: Once = Once::new();

/// Install a test tracing subscriber once per process.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Listener that records every dispatched message.
#[derive(Default)]
pub struct RecordingListener {
    messages: Mutex<Vec<GenericMessage>>,
}

#[allow(dead_code)]
impl RecordingListener {
    pub fn count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn messages(&self) -> Vec<GenericMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageListener for RecordingListener {
    async fn on_message(&self, msg: GenericMessage) -> Result<(), WmqError> {
        self.messages.lock().unwrap().push(msg);
        Ok(())
    }
}

/// A generic message with a UTF-8 text payload.
#[allow(dead_code)]
pub fn text_message(body: &str) -> GenericMessage {
    GenericMessage::new().with_payload(Bytes::copy_from_slice(body.as_bytes()))
}
