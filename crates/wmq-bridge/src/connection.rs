//! Connection-recovery scheduling.
//!
//! A produce that fails because the broker connection is broken must return
//! promptly to its caller; recovery of the owning connection happens
//! out-of-band, after a short delay that lets any enclosing transaction
//! unwind first.

use crate::broker::ConnectionErrorHandler;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

const DEFAULT_RECOVERY_DELAY: Duration = Duration::from_secs(2);
const DEFAULT_WORKER_LIMIT: usize = 4;

/// Bounded scheduler for detached connection-recovery triggers.
///
/// Each trigger runs on its own tokio task after a fixed delay; the number
/// of in-flight triggers is capped, and triggers beyond the cap are dropped
/// with a warning rather than queued.
#[derive(Clone)]
pub struct RecoveryScheduler {
    delay: Duration,
    permits: Arc<Semaphore>,
}

impl RecoveryScheduler {
    pub fn new() -> Self {
        Self {
            delay: DEFAULT_RECOVERY_DELAY,
            permits: Arc::new(Semaphore::new(DEFAULT_WORKER_LIMIT)),
        }
    }

    /// Override the delay before a scheduled trigger fires.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Schedule a recovery trigger, detached from the caller's stack.
    pub fn schedule(&self, handler: Arc<dyn ConnectionErrorHandler>) {
        let permit = match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("recovery worker pool is saturated, dropping trigger");
                return;
            }
        };
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!("running connection error handler");
            handler.handle_connection_exception().await;
            drop(permit);
        });
    }
}

impl Default for RecoveryScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
