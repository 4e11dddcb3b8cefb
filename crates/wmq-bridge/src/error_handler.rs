//! Error routing for untranslatable consumed messages.
//!
//! Once a message has been retrieved from the queue it is gone from the
//! broker; if translation then fails the raw native message would be lost.
//! A configured handler receives that raw message for durable disposal,
//! typically by forwarding it to a recovery queue.

use crate::broker::QueueConnection;
use crate::error::WmqError;
use crate::message::NativeMessage;
use crate::options::MessageOptions;
use crate::producer::NativeMessageProducer;
use async_trait::async_trait;
use std::sync::Arc;

/// The consuming bridge's connection and options, made available to error
/// handlers so forwarding can inherit them.
pub struct ConsumerContext {
    pub connection: Arc<dyn QueueConnection>,
    pub options: MessageOptions,
}

/// Receives raw native messages that could not be translated.
#[async_trait]
pub trait NativeErrorHandler: Send + Sync {
    /// Dispose of a message that was consumed but cannot be translated.
    /// Failures propagate to the consuming bridge and abort its poll cycle.
    async fn on_error(
        &self,
        msg: &NativeMessage,
        parent: &ConsumerContext,
    ) -> Result<(), WmqError>;
}

/// Forwards untranslatable messages to a recovery queue.
///
/// The connection is always the parent consumer's; the options are the
/// parent's too unless overridden here. Options that select a message shape
/// have no effect on this path since the message already exists.
pub struct ForwardingErrorHandler {
    destination: String,
    options: Option<MessageOptions>,
}

impl ForwardingErrorHandler {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            options: None,
        }
    }

    /// Override the parent consumer's options for the forwarding put.
    pub fn with_options(mut self, options: MessageOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }
}

#[async_trait]
impl NativeErrorHandler for ForwardingErrorHandler {
    async fn on_error(
        &self,
        msg: &NativeMessage,
        parent: &ConsumerContext,
    ) -> Result<(), WmqError> {
        let options = self
            .options
            .clone()
            .unwrap_or_else(|| parent.options.clone());
        let producer = NativeMessageProducer::new(Arc::clone(&parent.connection), options);
        producer.produce(msg, &self.destination).await
    }
}

#[cfg(test)]
#[path = "error_handler_tests.rs"]
mod tests;
