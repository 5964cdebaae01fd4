//! # Task execution record and status.
//!
//! [`TaskRecord`] is the entity describing one execution of a scheduled
//! task: identity, configuration snapshot, status, timestamps, result, and
//! captured error. The owning executor is the only writer until the record
//! reaches a terminal state; observers work with clones.
//!
//! ## State machine
//! ```text
//! PENDING ──► RUNNING ──► SUCCESS
//!    │           ├──────► FAILED
//!    │           └──────► CANCELLED
//!    └──► FAILED (uniqueness conflict, body never invoked)
//!    └──► CANCELLED (cancelled before start)
//! ```
//! No transition ever leaves a terminal state; the transition methods return
//! whether they applied.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::TaskError;
use crate::tasks::config::TaskConfig;

/// Execution status of a task or queue-task record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskStatus {
    /// Submitted, not yet started.
    Pending,
    /// The body is executing (or, for queue tasks, retrying).
    Running,
    /// Terminal: the body returned a result.
    Success,
    /// Terminal: the body failed, retries were exhausted, or the task was
    /// rejected by a uniqueness conflict.
    Failed,
    /// Terminal: the task stopped cooperatively after a cancellation request.
    Cancelled,
}

impl TaskStatus {
    /// Returns `true` for SUCCESS, FAILED, and CANCELLED.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Success | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Returns a short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Success => "success",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

/// Record of one scheduled-task execution.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    /// Unique id of this execution.
    pub execution_id: Uuid,
    /// Snapshot of the task configuration at submission.
    pub config: TaskConfig,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// When the body started, if it did.
    pub started_at: Option<DateTime<Utc>>,
    /// When the record reached a terminal state.
    pub ended_at: Option<DateTime<Utc>>,
    /// Opaque result of a successful body.
    pub result: Option<Value>,
    /// Error captured from a failed or cancelled execution.
    pub error: Option<TaskError>,
}

impl TaskRecord {
    /// Creates a PENDING record for the given configuration.
    pub(crate) fn new(config: TaskConfig) -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            config,
            status: TaskStatus::Pending,
            started_at: None,
            ended_at: None,
            result: None,
            error: None,
        }
    }

    /// PENDING → RUNNING. Records the start time.
    pub(crate) fn start(&mut self) -> bool {
        if self.status != TaskStatus::Pending {
            return false;
        }
        self.status = TaskStatus::Running;
        self.started_at = Some(Utc::now());
        true
    }

    /// RUNNING → SUCCESS. Records the result and end time.
    pub(crate) fn succeed(&mut self, result: Value) -> bool {
        if self.status != TaskStatus::Running {
            return false;
        }
        self.status = TaskStatus::Success;
        self.result = Some(result);
        self.ended_at = Some(Utc::now());
        true
    }

    /// PENDING/RUNNING → FAILED. Records the error and end time.
    pub(crate) fn fail(&mut self, error: TaskError) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = TaskStatus::Failed;
        self.error = Some(error);
        self.ended_at = Some(Utc::now());
        true
    }

    /// PENDING/RUNNING → CANCELLED. No-op once SUCCESS or FAILED.
    pub(crate) fn cancel(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = TaskStatus::Cancelled;
        self.error = Some(TaskError::Canceled);
        self.ended_at = Some(Utc::now());
        true
    }
}
