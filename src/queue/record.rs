//! # Queue-task record and executor statistics.
//!
//! [`QueueTaskRecord`] is the entity describing one queue-managed work item.
//! Its lifecycle has the same shape as a scheduler task record but is driven
//! exclusively by the single queue worker; it never reaches CANCELLED.
//!
//! [`QueueStats`] is the snapshot type returned by
//! [`QueueExecutor::statistics`](crate::QueueExecutor::statistics); the
//! executor keeps the live counts in atomics.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::TaskError;
use crate::queue::config::QueueTaskConfig;
use crate::tasks::TaskStatus;

/// Record of one queue-managed task.
#[derive(Debug, Clone)]
pub struct QueueTaskRecord {
    /// Unique id of this work item.
    pub task_id: Uuid,
    /// Snapshot of the task configuration at submission.
    pub config: QueueTaskConfig,
    /// Current lifecycle status (never CANCELLED for queue tasks).
    pub status: TaskStatus,
    /// When the first attempt started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the record reached a terminal state.
    pub ended_at: Option<DateTime<Utc>>,
    /// Opaque result of a successful attempt.
    pub result: Option<Value>,
    /// Error captured from the final failed attempt.
    pub error: Option<TaskError>,
    /// Retries performed so far (the initial attempt is not a retry).
    pub retry_count: u32,
}

impl QueueTaskRecord {
    /// Creates a PENDING record for the given configuration.
    pub(crate) fn new(config: QueueTaskConfig) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            config,
            status: TaskStatus::Pending,
            started_at: None,
            ended_at: None,
            result: None,
            error: None,
            retry_count: 0,
        }
    }

    /// PENDING → RUNNING. Records the start time of the first attempt.
    pub(crate) fn start(&mut self) -> bool {
        if self.status != TaskStatus::Pending {
            return false;
        }
        self.status = TaskStatus::Running;
        self.started_at = Some(Utc::now());
        true
    }

    /// RUNNING → SUCCESS.
    pub(crate) fn succeed(&mut self, result: Value) -> bool {
        if self.status != TaskStatus::Running {
            return false;
        }
        self.status = TaskStatus::Success;
        self.result = Some(result);
        self.ended_at = Some(Utc::now());
        true
    }

    /// PENDING/RUNNING → FAILED.
    pub(crate) fn fail(&mut self, error: TaskError) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = TaskStatus::Failed;
        self.error = Some(error);
        self.ended_at = Some(Utc::now());
        true
    }
}

/// Point-in-time counters of a queue executor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Accepted submissions.
    pub submitted: u64,
    /// Items that reached SUCCESS.
    pub succeeded: u64,
    /// Items that reached FAILED.
    pub failed: u64,
    /// Individual retry attempts performed.
    pub retried: u64,
}

/// Live counters backing [`QueueStats`].
#[derive(Default)]
pub(crate) struct StatCounters {
    pub(crate) submitted: AtomicU64,
    pub(crate) succeeded: AtomicU64,
    pub(crate) failed: AtomicU64,
    pub(crate) retried: AtomicU64,
}

impl StatCounters {
    pub(crate) fn snapshot(&self) -> QueueStats {
        QueueStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
        }
    }
}
