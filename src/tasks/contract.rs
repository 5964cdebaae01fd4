//! # Scheduled-task contract and function-backed implementation.
//!
//! This module defines the [`ScheduledTask`] trait (async, cancelable) and a
//! convenient function-backed implementation [`TaskFn`]. The common handle
//! type is [`TaskRef`], an `Arc<dyn ScheduledTask>` suitable for sharing
//! across the runtime.
//!
//! A task body receives a [`CancellationToken`] and should periodically check
//! it to stop cooperatively; a body that ignores the token simply runs to
//! completion.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::config::TaskConfig;

/// Shared handle to a scheduled task.
pub type TaskRef = Arc<dyn ScheduledTask>;

/// # Asynchronous, cancelable unit of scheduled work.
///
/// Implementors provide a [`TaskConfig`] and an async body. The optional
/// hooks run around every execution; failures in them are logged by the
/// executor and never abort the surrounding lifecycle bookkeeping.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use serde_json::{json, Value};
/// use tasklane::{ScheduledTask, TaskConfig, TaskError};
/// use tokio_util::sync::CancellationToken;
///
/// struct Demo {
///     config: TaskConfig,
/// }
///
/// #[async_trait]
/// impl ScheduledTask for Demo {
///     fn config(&self) -> &TaskConfig {
///         &self.config
///     }
///
///     async fn execute(&self, ctx: CancellationToken) -> Result<Value, TaskError> {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         // do work...
///         Ok(json!({"rows": 42}))
///     }
/// }
/// ```
#[async_trait]
pub trait ScheduledTask: Send + Sync + 'static {
    /// Returns the static configuration of this task.
    fn config(&self) -> &TaskConfig;

    /// Executes the task body.
    ///
    /// Implementations should check `ctx.is_cancelled()` at convenient
    /// points and return [`TaskError::Canceled`] to land in the CANCELLED
    /// state; returning any other error lands in FAILED.
    async fn execute(&self, ctx: CancellationToken) -> Result<Value, TaskError>;

    /// Hook invoked before the body. Default: no-op.
    async fn before_execute(&self) -> Result<(), TaskError> {
        Ok(())
    }

    /// Hook invoked after the body with the overall outcome. Default: no-op.
    async fn after_execute(&self, _success: bool) -> Result<(), TaskError> {
        Ok(())
    }
}

/// Function-backed scheduled task.
///
/// Wraps a closure that *creates* a new future per execution, so restarts
/// never share hidden mutable state; share state explicitly via `Arc` inside
/// the closure if needed.
pub struct TaskFn<F> {
    config: TaskConfig,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`].
    pub fn new(config: TaskConfig, f: F) -> Self {
        Self { config, f }
    }

    /// Creates the task and returns it as a shared handle.
    ///
    /// ## Example
    /// ```
    /// use serde_json::Value;
    /// use tasklane::{TaskConfig, TaskError, TaskFn, TaskRef};
    /// use tokio_util::sync::CancellationToken;
    ///
    /// let t: TaskRef = TaskFn::arc(
    ///     TaskConfig::new("hello", "GREETING"),
    ///     |_ctx: CancellationToken| async { Ok::<_, TaskError>(Value::Null) },
    /// );
    /// assert_eq!(t.config().task_type, "GREETING");
    /// ```
    pub fn arc(config: TaskConfig, f: F) -> Arc<Self> {
        Arc::new(Self::new(config, f))
    }
}

#[async_trait]
impl<F, Fut> ScheduledTask for TaskFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, TaskError>> + Send + 'static,
{
    fn config(&self) -> &TaskConfig {
        &self.config
    }

    async fn execute(&self, ctx: CancellationToken) -> Result<Value, TaskError> {
        (self.f)(ctx).await
    }
}
