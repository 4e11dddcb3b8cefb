//! The produce path: build a native message from a generic message plus the
//! configured field mappers, and commit it to a queue.

use crate::broker::{self, QueueConnection, QueueHandle};
use crate::connection::RecoveryScheduler;
use crate::error::WmqError;
use crate::fields::{format_datetime, NativeField};
use crate::mapping::FieldMapper;
use crate::message::{GenericMessage, NativeMessage};
use crate::options::{flags, MessageOptions};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, trace};

/// Bridge that produces generic messages to a queue through the native
/// client.
///
/// When field mappers are configured the broker only honors the mapped
/// descriptor values if a set-context option is present on both the queue
/// open and put bitmasks; with option checking enabled (the default) the
/// set-all-context flag is ORed in automatically when neither context flag
/// was configured.
pub struct ProduceBridge {
    connection: Arc<dyn QueueConnection>,
    options: MessageOptions,
    field_mappers: Vec<FieldMapper>,
    check_options: bool,
    recovery: RecoveryScheduler,
}

impl ProduceBridge {
    pub fn new(connection: Arc<dyn QueueConnection>) -> Self {
        Self {
            connection,
            options: MessageOptions::default(),
            field_mappers: Vec::new(),
            check_options: true,
            recovery: RecoveryScheduler::new(),
        }
    }

    pub fn with_options(mut self, options: MessageOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_field_mappers(mut self, mappers: Vec<FieldMapper>) -> Self {
        self.field_mappers = mappers;
        self
    }

    pub fn add_field_mapper(&mut self, mapper: FieldMapper) {
        self.field_mappers.push(mapper);
    }

    /// Disable the automatic context-flag injection.
    pub fn with_check_options(mut self, check: bool) -> Self {
        self.check_options = check;
        self
    }

    pub fn with_recovery_scheduler(mut self, recovery: RecoveryScheduler) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn options(&self) -> &MessageOptions {
        &self.options
    }

    /// Produce one generic message to the named queue.
    ///
    /// Failures are wrapped as a produce error. A broken-connection failure
    /// additionally schedules the owning connection's recovery handler on a
    /// detached worker, after a short delay, while the error still returns
    /// synchronously.
    pub async fn produce(
        &self,
        msg: &GenericMessage,
        queue_name: &str,
    ) -> Result<(), WmqError> {
        match self.produce_inner(msg, queue_name).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if e.is_connection_broken() {
                    error!(queue = queue_name, "produce failed on a broken connection");
                    if let Some(handler) = self.connection.error_handler() {
                        self.recovery.schedule(handler);
                    }
                }
                Err(WmqError::Produce {
                    queue: queue_name.to_string(),
                    source: Box::new(e),
                })
            }
        }
    }

    async fn produce_inner(
        &self,
        msg: &GenericMessage,
        queue_name: &str,
    ) -> Result<(), WmqError> {
        let open_options = self.checked_queue_open_options()?;
        let put_options = self.checked_put_options()?;
        let close_options = self.options.queue_close_options_value()?;

        let manager = self.connection.connect().await?;
        let mut queue = match manager.access_queue(queue_name, open_options).await {
            Ok(queue) => queue,
            Err(e) => {
                broker::disconnect_quietly(&*self.connection, manager, true).await;
                return Err(e);
            }
        };
        queue.set_close_options(close_options);

        let result = self.write_and_put(msg, queue.as_mut(), put_options).await;

        broker::close_quietly(queue.as_mut(), true).await;
        broker::disconnect_quietly(&*self.connection, manager, true).await;
        result
    }

    async fn write_and_put(
        &self,
        msg: &GenericMessage,
        queue: &mut dyn QueueHandle,
        put_options: i32,
    ) -> Result<(), WmqError> {
        let format = self.options.message_format;
        let mut native = format.create();
        if put_options & flags::MQPMO_SET_ALL_CONTEXT != 0 {
            // Under set-all-context every descriptor field is caller-supplied,
            // so seed the put timestamp; an explicit mapper may overwrite it.
            NativeField::PutDateTime.set(&mut native, &format_datetime(Utc::now()), None)?;
        }
        for mapper in &self.field_mappers {
            mapper.to_native(msg, &mut native)?;
        }
        format.write_to_native(msg, &mut native)?;
        trace!(queue = %queue.name(), "writing message to queue");
        queue.put(&native, put_options).await?;
        info!(queue = %queue.name(), "message produced to destination");
        Ok(())
    }

    fn checked_queue_open_options(&self) -> Result<i32, WmqError> {
        let mut options = self.options.queue_open_options_value()?;
        if self.check_options
            && !self.field_mappers.is_empty()
            && options & (flags::MQOO_SET_ALL_CONTEXT | flags::MQOO_SET_IDENTITY_CONTEXT) == 0
        {
            trace!("configured field mappers: adding MQOO_SET_ALL_CONTEXT to queue open options");
            options |= flags::MQOO_SET_ALL_CONTEXT;
        }
        Ok(options)
    }

    fn checked_put_options(&self) -> Result<i32, WmqError> {
        let mut options = self.options.message_options_value()?;
        if self.check_options
            && !self.field_mappers.is_empty()
            && options & (flags::MQPMO_SET_ALL_CONTEXT | flags::MQPMO_SET_IDENTITY_CONTEXT) == 0
        {
            trace!("configured field mappers: adding MQPMO_SET_ALL_CONTEXT to message options");
            options |= flags::MQPMO_SET_ALL_CONTEXT;
        }
        Ok(options)
    }
}

/// Produces an already-built native message to a queue.
///
/// Used when the full descriptor is being forwarded verbatim (the error
/// router's recovery path), so a set-context option is always ensured on
/// both bitmasks regardless of mapper configuration.
pub struct NativeMessageProducer {
    connection: Arc<dyn QueueConnection>,
    options: MessageOptions,
}

impl NativeMessageProducer {
    pub fn new(connection: Arc<dyn QueueConnection>, options: MessageOptions) -> Self {
        Self {
            connection,
            options,
        }
    }

    /// Put the native message to the named queue.
    pub async fn produce(
        &self,
        msg: &NativeMessage,
        queue_name: &str,
    ) -> Result<(), WmqError> {
        self.produce_inner(msg, queue_name)
            .await
            .map_err(|e| WmqError::Produce {
                queue: queue_name.to_string(),
                source: Box::new(e),
            })
    }

    async fn produce_inner(&self, msg: &NativeMessage, queue_name: &str) -> Result<(), WmqError> {
        let open_options = self.checked_queue_open_options()?;
        let put_options = self.checked_put_options()?;
        let close_options = self.options.queue_close_options_value()?;

        let manager = self.connection.connect().await?;
        let mut queue = match manager.access_queue(queue_name, open_options).await {
            Ok(queue) => queue,
            Err(e) => {
                broker::disconnect_quietly(&*self.connection, manager, true).await;
                return Err(e);
            }
        };
        queue.set_close_options(close_options);

        trace!(queue = %queue.name(), "writing message to queue");
        let result = queue.put(msg, put_options).await;
        if result.is_ok() {
            info!(queue = %queue.name(), "message produced to destination");
        }

        broker::close_quietly(queue.as_mut(), true).await;
        broker::disconnect_quietly(&*self.connection, manager, true).await;
        result
    }

    fn checked_queue_open_options(&self) -> Result<i32, WmqError> {
        let mut options = self.options.queue_open_options_value()?;
        if options & (flags::MQOO_SET_ALL_CONTEXT | flags::MQOO_SET_IDENTITY_CONTEXT) == 0 {
            trace!("adding MQOO_SET_ALL_CONTEXT to queue open options");
            options |= flags::MQOO_SET_ALL_CONTEXT;
        }
        Ok(options)
    }

    fn checked_put_options(&self) -> Result<i32, WmqError> {
        let mut options = self.options.message_options_value()?;
        if options & (flags::MQPMO_SET_ALL_CONTEXT | flags::MQPMO_SET_IDENTITY_CONTEXT) == 0 {
            trace!("adding MQPMO_SET_ALL_CONTEXT to message options");
            options |= flags::MQPMO_SET_ALL_CONTEXT;
        }
        Ok(options)
    }
}

#[cfg(test)]
#[path = "producer_tests.rs"]
mod tests;
