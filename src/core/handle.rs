//! # Handle to a detached task execution.
//!
//! [`TaskHandle`] is returned by
//! [`TaskExecutor::execute_detached`](crate::TaskExecutor::execute_detached).
//! It lets the caller observe the record, wait (bounded or unbounded) for the
//! terminal state, and request cooperative cancellation.
//!
//! ## Rules
//! - A bounded wait that expires raises
//!   [`SchedulerError::WaitTimeout`](crate::SchedulerError) but never cancels
//!   the execution; the terminal state stays observable via the executor.
//! - `cancel` is best-effort: the body decides when (and whether) to honor
//!   the token. Once the record is SUCCESS or FAILED, cancellation is a
//!   no-op.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::time;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::SchedulerError;
use crate::tasks::{TaskRecord, TaskStatus};

/// Shared, executor-owned record of one execution.
pub(crate) type SharedRecord = Arc<RwLock<TaskRecord>>;

/// Handle to a task running detached from the caller.
pub struct TaskHandle {
    id: Uuid,
    record: SharedRecord,
    cancel: CancellationToken,
    done: watch::Receiver<TaskStatus>,
}

impl TaskHandle {
    pub(crate) fn new(
        id: Uuid,
        record: SharedRecord,
        cancel: CancellationToken,
        done: watch::Receiver<TaskStatus>,
    ) -> Self {
        Self {
            id,
            record,
            cancel,
            done,
        }
    }

    /// Returns the execution id of the underlying task.
    pub fn execution_id(&self) -> Uuid {
        self.id
    }

    /// Requests cooperative cancellation of the execution.
    ///
    /// The body observes the request through its [`CancellationToken`]; a
    /// body that never checks the token runs to completion.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns a point-in-time copy of the record.
    pub async fn snapshot(&self) -> TaskRecord {
        self.record.read().await.clone()
    }

    /// Waits until the execution reaches a terminal state.
    pub async fn wait(&mut self) -> TaskRecord {
        let _ = self.done.wait_for(|status| status.is_terminal()).await;
        self.record.read().await.clone()
    }

    /// Waits up to `wait` for the terminal state.
    ///
    /// On expiry returns [`SchedulerError::WaitTimeout`] carrying the
    /// execution id; the execution itself continues unaffected.
    pub async fn wait_timeout(&mut self, wait: Duration) -> Result<TaskRecord, SchedulerError> {
        let terminal = self.done.wait_for(|status| status.is_terminal());
        match time::timeout(wait, terminal).await {
            Ok(_) => Ok(self.record.read().await.clone()),
            Err(_elapsed) => Err(SchedulerError::WaitTimeout { wait, id: self.id }),
        }
    }
}
