//! # Queue-task contract and function-backed implementation.
//!
//! [`QueueTask`] is the contract for queue-managed work items. It mirrors
//! the scheduled-task contract, minus the cancellation token (dequeued items
//! always run to completion or exhaust their retries) and plus
//! [`QueueTask::should_retry`], consulted after every failed attempt.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TaskError;
use crate::queue::config::QueueTaskConfig;

/// Shared handle to a queue task.
pub type QueueTaskRef = Arc<dyn QueueTask>;

/// # Unit of queue-managed work.
///
/// Executed by the single queue worker, one item at a time; implementations
/// never need their own locking against other queue tasks.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use serde_json::{json, Value};
/// use tasklane::{QueueTask, QueueTaskConfig, TaskError};
///
/// struct Import {
///     config: QueueTaskConfig,
/// }
///
/// #[async_trait]
/// impl QueueTask for Import {
///     fn config(&self) -> &QueueTaskConfig {
///         &self.config
///     }
///
///     async fn execute(&self) -> Result<Value, TaskError> {
///         // serialized write...
///         Ok(json!({"imported": 10}))
///     }
///
///     fn should_retry(&self, err: &TaskError) -> bool {
///         !err.to_string().contains("corrupt input")
///     }
/// }
/// ```
#[async_trait]
pub trait QueueTask: Send + Sync + 'static {
    /// Returns the static configuration of this task.
    fn config(&self) -> &QueueTaskConfig;

    /// Executes one attempt of the task body.
    async fn execute(&self) -> Result<Value, TaskError>;

    /// Hook invoked before every attempt. Default: no-op.
    async fn before_execute(&self) -> Result<(), TaskError> {
        Ok(())
    }

    /// Hook invoked once, after the terminal outcome. Default: no-op.
    async fn after_execute(&self, _success: bool) -> Result<(), TaskError> {
        Ok(())
    }

    /// Whether a failed attempt should be retried (budget permitting).
    /// Default: always.
    fn should_retry(&self, _err: &TaskError) -> bool {
        true
    }
}

/// Function-backed queue task.
///
/// Wraps a closure that *creates* a new future per attempt, so retries never
/// share hidden mutable state.
pub struct QueueTaskFn<F> {
    config: QueueTaskConfig,
    f: F,
}

impl<F> QueueTaskFn<F> {
    /// Creates a new function-backed queue task.
    ///
    /// Prefer [`QueueTaskFn::arc`] when you immediately need a
    /// [`QueueTaskRef`].
    pub fn new(config: QueueTaskConfig, f: F) -> Self {
        Self { config, f }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(config: QueueTaskConfig, f: F) -> Arc<Self> {
        Arc::new(Self::new(config, f))
    }
}

#[async_trait]
impl<F, Fut> QueueTask for QueueTaskFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, TaskError>> + Send + 'static,
{
    fn config(&self) -> &QueueTaskConfig {
        &self.config
    }

    async fn execute(&self) -> Result<Value, TaskError> {
        (self.f)().await
    }
}
