//! # TaskScheduler: submission facade.
//!
//! Thin facade translating submit calls into [`TaskExecutor`] calls. Holds
//! no state of its own beyond the executor handle.

use std::time::Duration;

use crate::core::executor::TaskExecutor;
use crate::core::handle::TaskHandle;
use crate::error::SchedulerError;
use crate::tasks::{TaskRecord, TaskRef};

/// Default wait bound for [`TaskScheduler::submit_with_timeout`] when the
/// task's own config carries none.
pub const DEFAULT_SUBMIT_WAIT: Duration = Duration::from_secs(30 * 60);

/// Facade over [`TaskExecutor`].
#[derive(Clone)]
pub struct TaskScheduler {
    executor: TaskExecutor,
}

impl TaskScheduler {
    /// Creates a scheduler delegating to the given executor.
    pub fn new(executor: TaskExecutor) -> Self {
        Self { executor }
    }

    /// Submits a task and waits for its terminal record.
    pub async fn submit(&self, task: TaskRef) -> Result<TaskRecord, SchedulerError> {
        self.executor.execute(task).await
    }

    /// Submits a task for detached execution.
    pub async fn submit_detached(&self, task: TaskRef) -> Result<TaskHandle, SchedulerError> {
        self.executor.execute_detached(task).await
    }

    /// Submits a task and waits up to the config's timeout (or
    /// [`DEFAULT_SUBMIT_WAIT`] when the config carries none) for the
    /// terminal record.
    pub async fn submit_with_timeout(&self, task: TaskRef) -> Result<TaskRecord, SchedulerError> {
        let wait = task.config().timeout_opt().unwrap_or(DEFAULT_SUBMIT_WAIT);
        self.executor.execute_with_timeout(task, wait).await
    }

    /// Returns the underlying executor.
    pub fn executor(&self) -> &TaskExecutor {
        &self.executor
    }
}
