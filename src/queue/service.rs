//! # QueueService: submission facade.
//!
//! Thin facade translating submit calls into
//! [`QueueExecutor`](crate::QueueExecutor) calls, with a default wait bound
//! for the blocking variant.

use std::time::Duration;

use crate::error::SchedulerError;
use crate::queue::contract::QueueTaskRef;
use crate::queue::executor::QueueExecutor;
use crate::queue::record::{QueueStats, QueueTaskRecord};

/// Default wait bound for [`QueueService::submit_and_wait`].
pub const DEFAULT_QUEUE_WAIT: Duration = Duration::from_secs(30);

/// Facade over [`QueueExecutor`].
#[derive(Clone)]
pub struct QueueService {
    executor: QueueExecutor,
}

impl QueueService {
    /// Creates a service delegating to the given executor.
    pub fn new(executor: QueueExecutor) -> Self {
        Self { executor }
    }

    /// Enqueues a task and returns its PENDING record.
    pub async fn submit(&self, task: QueueTaskRef) -> Result<QueueTaskRecord, SchedulerError> {
        self.executor.submit(task).await
    }

    /// Enqueues a task and waits up to [`DEFAULT_QUEUE_WAIT`] for its
    /// terminal record.
    pub async fn submit_and_wait(
        &self,
        task: QueueTaskRef,
    ) -> Result<QueueTaskRecord, SchedulerError> {
        self.executor.submit_and_wait(task, DEFAULT_QUEUE_WAIT).await
    }

    /// Number of items queued behind the current one.
    pub fn queue_size(&self) -> usize {
        self.executor.queue_size()
    }

    /// Snapshot of the in-flight item, if any.
    pub async fn current_task(&self) -> Option<QueueTaskRecord> {
        self.executor.current_task().await
    }

    /// Point-in-time counter snapshot.
    pub fn statistics(&self) -> QueueStats {
        self.executor.statistics()
    }

    /// Returns the underlying executor.
    pub fn executor(&self) -> &QueueExecutor {
        &self.executor
    }
}
