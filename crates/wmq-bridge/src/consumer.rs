//! The consume path: poll a queue, translate native messages into generic
//! messages and dispatch them to a listener.

use crate::broker::{self, QueueConnection, QueueHandle, QueueManager};
use crate::error::WmqError;
use crate::error_handler::{ConsumerContext, NativeErrorHandler};
use crate::mapping::FieldMapper;
use crate::message::{GenericMessage, MessageFormat, NativeMessage};
use crate::options::MessageOptions;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error};

/// Downstream dispatch target for translated messages.
#[async_trait]
pub trait MessageListener: Send + Sync {
    async fn on_message(&self, msg: GenericMessage) -> Result<(), WmqError>;
}

/// Cooperative continuation check, evaluated between messages. In-flight
/// retrievals are never interrupted.
pub type ContinueProcessing = Box<dyn Fn() -> bool + Send + Sync>;

/// Bridge that consumes native messages from a queue and dispatches them as
/// generic messages.
///
/// One call to [`ConsumeBridge::process_messages`] is one poll cycle: open
/// the queue, drain it until the broker reports no message available, close
/// the queue. Retrieval is non-blocking; retry cadence belongs entirely to
/// the caller's scheduler.
pub struct ConsumeBridge {
    connection: Arc<dyn QueueConnection>,
    queue_name: String,
    options: MessageOptions,
    pre_get_field_mappers: Vec<FieldMapper>,
    field_mappers: Vec<FieldMapper>,
    error_handler: Option<Arc<dyn NativeErrorHandler>>,
    listener: Arc<dyn MessageListener>,
    continue_processing: ContinueProcessing,
    log_all_exceptions: bool,
}

impl ConsumeBridge {
    pub fn new(
        connection: Arc<dyn QueueConnection>,
        queue_name: impl Into<String>,
        listener: Arc<dyn MessageListener>,
    ) -> Self {
        let bridge = Self {
            connection,
            queue_name: queue_name.into(),
            options: MessageOptions::default(),
            pre_get_field_mappers: Vec::new(),
            field_mappers: Vec::new(),
            error_handler: None,
            listener,
            continue_processing: Box::new(|| true),
            log_all_exceptions: false,
        };
        bridge.normalize_options(MessageOptions::default())
    }

    /// Set the queue access and get options.
    pub fn with_options(self, options: MessageOptions) -> Self {
        self.normalize_options(options)
    }

    // Retrieval must not block waiting for messages; the poll scheduler owns
    // the retry cadence.
    fn normalize_options(mut self, mut options: MessageOptions) -> Self {
        if let Err(e) = options.add_message_option("MQGMO_NO_WAIT") {
            error!(error = %e, "failed to add MQGMO_NO_WAIT to message options");
        }
        self.options = options;
        self
    }

    /// Mappers applied to the empty native message before each retrieval,
    /// seeding fields the broker needs up front (e.g. message type or
    /// descriptor version).
    pub fn with_pre_get_field_mappers(mut self, mappers: Vec<FieldMapper>) -> Self {
        self.pre_get_field_mappers = mappers;
        self
    }

    /// Mappers run after retrieval, copying native fields into the generic
    /// message.
    pub fn with_field_mappers(mut self, mappers: Vec<FieldMapper>) -> Self {
        self.field_mappers = mappers;
        self
    }

    pub fn add_field_mapper(&mut self, mapper: FieldMapper) {
        self.field_mappers.push(mapper);
    }

    /// Route translation failures to the given handler instead of aborting
    /// the poll cycle.
    pub fn with_error_handler(mut self, handler: Arc<dyn NativeErrorHandler>) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Install the cooperative continuation predicate.
    pub fn with_continue_processing(
        mut self,
        predicate: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Self {
        self.continue_processing = Box::new(predicate);
        self
    }

    /// Log the full error chain for every swallowed error instead of the
    /// default one-line message.
    pub fn with_log_all_exceptions(mut self, enabled: bool) -> Self {
        self.log_all_exceptions = enabled;
        self
    }

    pub fn options(&self) -> &MessageOptions {
        &self.options
    }

    /// Run one poll cycle and return the number of messages dispatched.
    ///
    /// A failure to open the queue is recoverable: it is logged and the
    /// cycle returns 0, to be re-attempted on the next schedule. Close and
    /// disconnect failures are logged and never surfaced.
    pub async fn process_messages(&self) -> u32 {
        let mut count = 0;
        let (manager, mut queue) = match self.open_queue().await {
            Ok(pair) => pair,
            Err(e) => {
                error!(
                    queue = %self.queue_name,
                    "failed to open queue, will re-attempt on next schedule"
                );
                self.log_exception(&e);
                return count;
            }
        };

        loop {
            match self.consume_message(queue.as_mut()).await {
                Ok(true) => {
                    count += 1;
                    if !(self.continue_processing)() {
                        break;
                    }
                }
                Ok(false) => break,
                Err(e) => {
                    error!("failed to receive messages, will re-attempt on next schedule");
                    self.log_exception(&e);
                    break;
                }
            }
        }

        broker::close_quietly(queue.as_mut(), self.log_all_exceptions).await;
        broker::disconnect_quietly(&*self.connection, manager, self.log_all_exceptions).await;
        count
    }

    async fn open_queue(
        &self,
    ) -> Result<(Arc<dyn QueueManager>, Box<dyn QueueHandle>), WmqError> {
        let open_options = self.options.queue_open_options_value()?;
        let close_options = self.options.queue_close_options_value()?;
        let manager = self.connection.connect().await?;
        match manager.access_queue(&self.queue_name, open_options).await {
            Ok(mut queue) => {
                queue.set_close_options(close_options);
                Ok((manager, queue))
            }
            Err(e) => {
                broker::disconnect_quietly(&*self.connection, manager, self.log_all_exceptions)
                    .await;
                Err(e)
            }
        }
    }

    /// Retrieve and dispatch one message. `Ok(true)` means a message was
    /// consumed and the loop should carry on; `Ok(false)` ends the loop
    /// normally (queue drained, or a translation failure was handled).
    async fn consume_message(&self, queue: &mut dyn QueueHandle) -> Result<bool, WmqError> {
        let mut msg = GenericMessage::new();
        let format = self.options.message_format;
        let mut native = format.create();
        for mapper in &self.pre_get_field_mappers {
            mapper.to_native(&msg, &mut native)?;
        }
        let get_options = self.options.message_options_value()?;

        match queue.get(&mut native, get_options).await {
            Ok(()) => match self.translate(&native, &mut msg, format) {
                Ok(()) => {
                    self.listener.on_message(msg).await?;
                    Ok(true)
                }
                Err(e) => {
                    self.run_error_handler(&native, e).await?;
                    Ok(false)
                }
            },
            Err(e) if e.is_no_message() => Ok(false),
            Err(e) => {
                self.run_error_handler(&native, e).await?;
                Ok(false)
            }
        }
    }

    fn translate(
        &self,
        native: &NativeMessage,
        msg: &mut GenericMessage,
        format: MessageFormat,
    ) -> Result<(), WmqError> {
        format.write_to_generic(native, msg)?;
        for mapper in &self.field_mappers {
            mapper.from_native(native, msg)?;
        }
        Ok(())
    }

    async fn run_error_handler(
        &self,
        native: &NativeMessage,
        err: WmqError,
    ) -> Result<(), WmqError> {
        match &self.error_handler {
            None => Err(err),
            Some(handler) => {
                debug!("running error handler");
                let parent = ConsumerContext {
                    connection: Arc::clone(&self.connection),
                    options: self.options.clone(),
                };
                handler
                    .on_error(native, &parent)
                    .await
                    .map_err(|e| WmqError::Handler {
                        source: Box::new(e),
                    })
            }
        }
    }

    fn log_exception(&self, e: &WmqError) {
        if self.log_all_exceptions {
            error!(error = ?e, "processing error");
        }
    }
}

#[cfg(test)]
#[path = "consumer_tests.rs"]
mod tests;
