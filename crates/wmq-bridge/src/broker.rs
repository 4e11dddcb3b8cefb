//! The native middleware boundary: connection, queue manager and queue
//! handle traits, plus the broker's completion and reason codes.
//!
//! The bridge never talks to the wire itself; everything below this seam is
//! owned by a broker implementation (see [`crate::brokers`]).

use crate::error::WmqError;
use crate::message::NativeMessage;
use async_trait::async_trait;
use std::sync::Arc;

/// Broker completion codes
pub mod completion {
    pub const MQCC_OK: i32 = 0;
    pub const MQCC_WARNING: i32 = 1;
    pub const MQCC_FAILED: i32 = 2;
}

/// Broker reason codes distinguishing benign conditions from genuine
/// errors.
pub mod reason {
    /// Normal loop-termination signal, not an error
    pub const MQRC_NO_MSG_AVAILABLE: i32 = 2033;
    /// The connection to the queue manager has been lost
    pub const MQRC_CONNECTION_BROKEN: i32 = 2009;
    pub const MQRC_GET_INHIBITED: i32 = 2016;
    pub const MQRC_NOT_AUTHORIZED: i32 = 2035;
    pub const MQRC_NOT_OPEN_FOR_INPUT: i32 = 2037;
    pub const MQRC_NOT_OPEN_FOR_OUTPUT: i32 = 2039;
    pub const MQRC_OBJECT_IN_USE: i32 = 2042;
    pub const MQRC_PUT_INHIBITED: i32 = 2051;
    pub const MQRC_Q_FULL: i32 = 2053;
    pub const MQRC_Q_MGR_NOT_AVAILABLE: i32 = 2059;
    pub const MQRC_UNKNOWN_OBJECT_NAME: i32 = 2085;
}

/// A connection to a queue manager.
///
/// One bridge invocation connects, works against the returned manager for a
/// single queue open/close cycle, and releases it on every exit path.
#[async_trait]
pub trait QueueConnection: Send + Sync {
    /// Connect and return a queue manager handle.
    async fn connect(&self) -> Result<Arc<dyn QueueManager>, WmqError>;

    /// Release a previously connected queue manager.
    async fn disconnect(&self, manager: Arc<dyn QueueManager>) -> Result<(), WmqError>;

    /// The recovery hook invoked when the connection is found broken.
    fn error_handler(&self) -> Option<Arc<dyn ConnectionErrorHandler>> {
        None
    }
}

/// A connected queue manager.
#[async_trait]
pub trait QueueManager: Send + Sync {
    /// Open the named queue with the resolved open-option bitmask.
    async fn access_queue(
        &self,
        queue_name: &str,
        open_options: i32,
    ) -> Result<Box<dyn QueueHandle>, WmqError>;
}

/// An open queue. Owned exclusively by one bridge invocation for the
/// duration of one open/close cycle.
#[async_trait]
pub trait QueueHandle: Send {
    fn name(&self) -> &str;

    /// Set the close-option bitmask applied when the handle is closed.
    fn set_close_options(&mut self, options: i32);

    /// Retrieve one message into `msg` with the resolved get-option
    /// bitmask. Fails with reason [`reason::MQRC_NO_MSG_AVAILABLE`] when the
    /// queue is empty.
    async fn get(&mut self, msg: &mut NativeMessage, get_options: i32) -> Result<(), WmqError>;

    /// Commit one message to the queue with the resolved put-option
    /// bitmask.
    async fn put(&mut self, msg: &NativeMessage, put_options: i32) -> Result<(), WmqError>;

    /// Close the queue with the configured close options.
    async fn close(&mut self) -> Result<(), WmqError>;
}

/// Asynchronous connection-recovery hook, triggered out-of-band when a
/// produce fails with a broken connection.
#[async_trait]
pub trait ConnectionErrorHandler: Send + Sync {
    async fn handle_connection_exception(&self);
}

/// Close a queue, logging and swallowing any failure. Close errors must not
/// mask an error already being propagated and must not stop the cycle from
/// returning its result.
pub(crate) async fn close_quietly(queue: &mut dyn QueueHandle, verbose: bool) {
    if let Err(e) = queue.close().await {
        tracing::warn!(queue = %queue.name(), "error closing queue");
        if verbose {
            tracing::warn!(error = ?e, "close failure detail");
        }
    }
}

/// Release a queue manager, logging and swallowing any failure.
pub(crate) async fn disconnect_quietly(
    connection: &dyn QueueConnection,
    manager: Arc<dyn QueueManager>,
    verbose: bool,
) {
    if let Err(e) = connection.disconnect(manager).await {
        tracing::warn!("error disconnecting queue manager");
        if verbose {
            tracing::warn!(error = ?e, "disconnect failure detail");
        }
    }
}
