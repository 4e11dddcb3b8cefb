//! In-memory broker implementation for testing and development.
//!
//! Provides a fully functional queue manager over process memory: FIFO
//! queues of native messages, open-option enforcement on get/put, and
//! failure injection for exercising the bridge's error paths.

use crate::broker::{
    reason, ConnectionErrorHandler, QueueConnection, QueueHandle, QueueManager,
};
use crate::error::{BrokerError, WmqError};
use crate::message::NativeMessage;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

// Open options that permit retrieval from a queue
const INPUT_OPTIONS: i32 = 0x0001 | 0x0002 | 0x0004;
// Open option that permits putting to a queue
const OUTPUT_OPTION: i32 = 0x0010;
// Close options requesting queue deletion
const CLOSE_DELETE: i32 = 0x0001;
const CLOSE_DELETE_PURGE: i32 = 0x0002;

/// Reason used when a delete-on-close finds messages still queued
const MQRC_Q_NOT_EMPTY: i32 = 2055;

// ============================================================================
// Internal storage
// ============================================================================

#[derive(Default)]
struct BrokerStorage {
    queues: HashMap<String, VecDeque<NativeMessage>>,
    /// Descriptor passed to the most recent get call, captured before the
    /// arriving message overwrites it
    last_get_template: Option<NativeMessage>,
    /// Bitmasks seen on the most recent access_queue and put calls
    last_open_options: Option<i32>,
    last_put_options: Option<i32>,
    injected: InjectedFailures,
}

#[derive(Default)]
struct InjectedFailures {
    connect: Option<i32>,
    open: Option<i32>,
    get: Option<i32>,
    put: Option<i32>,
}

// ============================================================================
// InMemoryBroker
// ============================================================================

/// An in-process queue manager usable as both [`QueueConnection`] and, once
/// connected, [`QueueManager`].
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    storage: Arc<RwLock<BrokerStorage>>,
    error_handler: Option<Arc<dyn ConnectionErrorHandler>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a connection-recovery hook.
    pub fn with_error_handler(mut self, handler: Arc<dyn ConnectionErrorHandler>) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Seed a message onto the named queue.
    pub fn push_message(&self, queue_name: &str, msg: NativeMessage) {
        let mut storage = self.storage.write().unwrap();
        storage
            .queues
            .entry(queue_name.to_string())
            .or_default()
            .push_back(msg);
    }

    /// Snapshot the messages currently on the named queue.
    pub fn messages(&self, queue_name: &str) -> Vec<NativeMessage> {
        let storage = self.storage.read().unwrap();
        storage
            .queues
            .get(queue_name)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of messages on the named queue.
    pub fn depth(&self, queue_name: &str) -> usize {
        let storage = self.storage.read().unwrap();
        storage.queues.get(queue_name).map_or(0, VecDeque::len)
    }

    /// The descriptor most recently handed to a get call, as seeded by the
    /// caller before retrieval.
    pub fn last_get_template(&self) -> Option<NativeMessage> {
        self.storage.read().unwrap().last_get_template.clone()
    }

    /// The open-option bitmask of the most recent queue open.
    pub fn last_open_options(&self) -> Option<i32> {
        self.storage.read().unwrap().last_open_options
    }

    /// The put-option bitmask of the most recent put.
    pub fn last_put_options(&self) -> Option<i32> {
        self.storage.read().unwrap().last_put_options
    }

    /// Fail every connect with the given reason code until cleared.
    pub fn inject_connect_failure(&self, reason_code: Option<i32>) {
        self.storage.write().unwrap().injected.connect = reason_code;
    }

    /// Fail every queue open with the given reason code until cleared.
    pub fn inject_open_failure(&self, reason_code: Option<i32>) {
        self.storage.write().unwrap().injected.open = reason_code;
    }

    /// Fail every get with the given reason code until cleared.
    pub fn inject_get_failure(&self, reason_code: Option<i32>) {
        self.storage.write().unwrap().injected.get = reason_code;
    }

    /// Fail every put with the given reason code until cleared.
    pub fn inject_put_failure(&self, reason_code: Option<i32>) {
        self.storage.write().unwrap().injected.put = reason_code;
    }
}

#[async_trait]
impl QueueConnection for InMemoryBroker {
    async fn connect(&self) -> Result<Arc<dyn QueueManager>, WmqError> {
        if let Some(reason_code) = self.storage.read().unwrap().injected.connect {
            return Err(BrokerError::failed(reason_code, "queue manager not available").into());
        }
        Ok(Arc::new(MemoryQueueManager {
            storage: Arc::clone(&self.storage),
        }))
    }

    async fn disconnect(&self, _manager: Arc<dyn QueueManager>) -> Result<(), WmqError> {
        Ok(())
    }

    fn error_handler(&self) -> Option<Arc<dyn ConnectionErrorHandler>> {
        self.error_handler.clone()
    }
}

struct MemoryQueueManager {
    storage: Arc<RwLock<BrokerStorage>>,
}

#[async_trait]
impl QueueManager for MemoryQueueManager {
    async fn access_queue(
        &self,
        queue_name: &str,
        open_options: i32,
    ) -> Result<Box<dyn QueueHandle>, WmqError> {
        {
            let mut storage = self.storage.write().unwrap();
            storage.last_open_options = Some(open_options);
            if let Some(reason_code) = storage.injected.open {
                return Err(BrokerError::failed(
                    reason_code,
                    format!("cannot open queue {queue_name}"),
                )
                .into());
            }
            storage.queues.entry(queue_name.to_string()).or_default();
        }
        Ok(Box::new(MemoryQueueHandle {
            name: queue_name.to_string(),
            storage: Arc::clone(&self.storage),
            open_options,
            close_options: 0,
        }))
    }
}

struct MemoryQueueHandle {
    name: String,
    storage: Arc<RwLock<BrokerStorage>>,
    open_options: i32,
    close_options: i32,
}

#[async_trait]
impl QueueHandle for MemoryQueueHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_close_options(&mut self, options: i32) {
        self.close_options = options;
    }

    async fn get(&mut self, msg: &mut NativeMessage, _get_options: i32) -> Result<(), WmqError> {
        let mut storage = self.storage.write().unwrap();
        storage.last_get_template = Some(msg.clone());
        if let Some(reason_code) = storage.injected.get {
            return Err(BrokerError::failed(
                reason_code,
                format!("get failed on queue {}", self.name),
            )
            .into());
        }
        if self.open_options & INPUT_OPTIONS == 0 {
            return Err(BrokerError::failed(
                reason::MQRC_NOT_OPEN_FOR_INPUT,
                format!("queue {} is not open for input", self.name),
            )
            .into());
        }
        let queue = storage.queues.entry(self.name.clone()).or_default();
        match queue.pop_front() {
            Some(stored) => {
                *msg = stored;
                Ok(())
            }
            None => Err(BrokerError::failed(
                reason::MQRC_NO_MSG_AVAILABLE,
                format!("no message available on queue {}", self.name),
            )
            .into()),
        }
    }

    async fn put(&mut self, msg: &NativeMessage, put_options: i32) -> Result<(), WmqError> {
        let mut storage = self.storage.write().unwrap();
        storage.last_put_options = Some(put_options);
        if let Some(reason_code) = storage.injected.put {
            return Err(BrokerError::failed(
                reason_code,
                format!("put failed on queue {}", self.name),
            )
            .into());
        }
        if self.open_options & OUTPUT_OPTION == 0 {
            return Err(BrokerError::failed(
                reason::MQRC_NOT_OPEN_FOR_OUTPUT,
                format!("queue {} is not open for output", self.name),
            )
            .into());
        }
        storage
            .queues
            .entry(self.name.clone())
            .or_default()
            .push_back(msg.clone());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), WmqError> {
        let mut storage = self.storage.write().unwrap();
        if self.close_options & CLOSE_DELETE_PURGE != 0 {
            storage.queues.remove(&self.name);
        } else if self.close_options & CLOSE_DELETE != 0 {
            let occupied = storage.queues.get(&self.name).is_some_and(|q| !q.is_empty());
            if occupied {
                return Err(BrokerError::failed(
                    MQRC_Q_NOT_EMPTY,
                    format!("queue {} is not empty", self.name),
                )
                .into());
            }
            storage.queues.remove(&self.name);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
