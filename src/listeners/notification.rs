//! # Immutable notification snapshots.
//!
//! [`TaskNotification`] is a flattened, immutable projection of a task or
//! queue-task record plus a human message. It is built only at dispatch time
//! and never shared back into the record it was taken from.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::queue::QueueTaskRecord;
use crate::tasks::{TaskRecord, TaskStatus};

/// Snapshot of a task execution, sent to listeners.
///
/// Every field is copied out of the record at dispatch time; mutating the
/// record afterwards never changes a notification already in flight.
#[derive(Debug, Clone, Serialize)]
pub struct TaskNotification {
    /// Execution id (scheduler tasks) or task id (queue tasks).
    pub task_id: Uuid,
    /// Human-readable task name.
    pub task_name: String,
    /// Task type — the key listeners filter on via `supports`.
    pub task_type: String,
    /// Status at dispatch time.
    pub status: TaskStatus,
    /// When the body started, if it did.
    pub started_at: Option<DateTime<Utc>>,
    /// When the record reached a terminal state.
    pub ended_at: Option<DateTime<Utc>>,
    /// Result of a successful execution.
    pub result: Option<Value>,
    /// Failure message, if any.
    pub error: Option<String>,
    /// Retries performed so far (always 0 for scheduler tasks).
    pub retry_count: u32,
    /// Human message describing the lifecycle event.
    pub message: String,
}

impl TaskNotification {
    /// Builds a snapshot of a scheduler-task record.
    pub fn of_task(record: &TaskRecord, message: impl Into<String>) -> Self {
        Self {
            task_id: record.execution_id,
            task_name: record.config.task_name.clone(),
            task_type: record.config.task_type.clone(),
            status: record.status,
            started_at: record.started_at,
            ended_at: record.ended_at,
            result: record.result.clone(),
            error: record.error.as_ref().map(|e| e.to_string()),
            retry_count: 0,
            message: message.into(),
        }
    }

    /// Builds a snapshot of a queue-task record.
    pub fn of_queue(record: &QueueTaskRecord, message: impl Into<String>) -> Self {
        Self {
            task_id: record.task_id,
            task_name: record.config.task_name.clone(),
            task_type: record.config.task_type.clone(),
            status: record.status,
            started_at: record.started_at,
            ended_at: record.ended_at,
            result: record.result.clone(),
            error: record.error.as_ref().map(|e| e.to_string()),
            retry_count: record.retry_count,
            message: message.into(),
        }
    }
}
