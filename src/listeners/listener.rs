//! # Core listener trait
//!
//! [`TaskListener`] is the extension point for observing task lifecycles.
//! Listeners are registered on an executor and receive one call per
//! lifecycle phase per execution they support: `on_task_start`, then exactly
//! one of `on_task_success` / `on_task_failed` / `on_task_cancelled`.
//! Retried queue executions do not re-fire `on_task_start`.
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching) but run inline with the
//!   executor's dispatch, so keep heavy work off the hot path.
//! - A panicking listener is isolated and reported; other listeners and the
//!   execution itself are unaffected.

use async_trait::async_trait;

use crate::listeners::notification::TaskNotification;

/// Contract for lifecycle observers.
#[async_trait]
pub trait TaskListener: Send + Sync + 'static {
    /// The task transitioned to RUNNING.
    async fn on_task_start(&self, notification: &TaskNotification);

    /// The task reached SUCCESS.
    async fn on_task_success(&self, notification: &TaskNotification);

    /// The task reached FAILED (body failure, retry exhaustion, or
    /// uniqueness conflict).
    async fn on_task_failed(&self, notification: &TaskNotification);

    /// The task reached CANCELLED. Default: no-op.
    async fn on_task_cancelled(&self, _notification: &TaskNotification) {}

    /// Filter evaluated per dispatch; return `false` to skip this listener
    /// for the given task type. Default: all types.
    fn supports(&self, _task_type: &str) -> bool {
        true
    }

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
