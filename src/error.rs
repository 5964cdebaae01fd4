//! Error types used by the tasklane runtime and tasks.
//!
//! This module defines two main error enums:
//!
//! - [`SchedulerError`] — errors raised synchronously to the caller of a
//!   submit operation (bad configuration, full queue, expired wait).
//! - [`TaskError`] — errors captured into a task record during execution.
//!   These are never propagated to the submitting caller; they surface only
//!   when the caller inspects the terminal record.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for
//! logging/metrics.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

/// # Errors raised to submitters.
///
/// These represent failures of the submission path itself. They are returned
/// from `submit`/`execute` calls before or instead of an execution attempt;
/// they never describe the outcome of a task body.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The task configuration failed validation (blank name or type).
    #[error("invalid task configuration: {reason}")]
    InvalidConfig {
        /// What was wrong with the configuration.
        reason: String,
    },

    /// A bounded wait elapsed before the task reached a terminal state.
    ///
    /// The execution itself is **not** cancelled; it keeps running in the
    /// background and its terminal state can be observed later via `id`.
    #[error("timed out after {wait:?} waiting for task {id}; execution continues")]
    WaitTimeout {
        /// The wait bound that elapsed.
        wait: Duration,
        /// Id of the task that is still in flight.
        id: Uuid,
    },

    /// A bounded queue rejected the submission because it was full.
    #[error("queue is full (capacity {capacity})")]
    QueueFull {
        /// The configured queue capacity.
        capacity: usize,
    },

    /// The executor was stopped before the task reached a terminal state.
    #[error("executor stopped before the task reached a terminal state")]
    Stopped,
}

impl SchedulerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tasklane::SchedulerError;
    ///
    /// let err = SchedulerError::QueueFull { capacity: 16 };
    /// assert_eq!(err.as_label(), "queue_full");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SchedulerError::InvalidConfig { .. } => "invalid_config",
            SchedulerError::WaitTimeout { .. } => "wait_timeout",
            SchedulerError::QueueFull { .. } => "queue_full",
            SchedulerError::Stopped => "executor_stopped",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SchedulerError::InvalidConfig { reason } => format!("invalid config: {reason}"),
            SchedulerError::WaitTimeout { wait, id } => {
                format!("wait timeout after {wait:?}; task {id} still in flight")
            }
            SchedulerError::QueueFull { capacity } => format!("queue full at capacity {capacity}"),
            SchedulerError::Stopped => "executor stopped".to_string(),
        }
    }
}

/// # Errors captured into task records.
///
/// These represent failures of individual executions. The executor stores
/// them on the [`TaskRecord`](crate::TaskRecord) /
/// [`QueueTaskRecord`](crate::QueueTaskRecord) they belong to; worker tasks
/// never die because of them.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum TaskError {
    /// The task body (or one of its hooks) returned an error or panicked.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// A task of the same type with global uniqueness was already running.
    ///
    /// The rejected task's body is never invoked; the record goes straight
    /// to FAILED.
    #[error("another task of type {task_type:?} is already running")]
    UniquenessConflict {
        /// The uniqueness key that was contended.
        task_type: String,
    },

    /// The task observed its cancellation token and stopped cooperatively.
    #[error("cancelled before completion")]
    Canceled,

    /// A queue task exhausted its retry budget.
    ///
    /// `last` retains the failure of the final attempt.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Total attempts made (initial attempt plus retries).
        attempts: u32,
        /// The error of the last attempt.
        last: Box<TaskError>,
    },
}

impl TaskError {
    /// Wraps an arbitrary message into a [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tasklane::TaskError;
    ///
    /// let err = TaskError::fail("boom");
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::UniquenessConflict { .. } => "uniqueness_conflict",
            TaskError::Canceled => "task_canceled",
            TaskError::RetriesExhausted { .. } => "retries_exhausted",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::UniquenessConflict { task_type } => {
                format!("type {task_type:?} already running")
            }
            TaskError::Canceled => "cancelled".to_string(),
            TaskError::RetriesExhausted { attempts, last } => {
                format!(
                    "exhausted after {attempts} attempts; last: {}",
                    last.as_message()
                )
            }
        }
    }
}

/// Extracts a printable message from a caught panic payload.
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
