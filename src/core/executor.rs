//! # TaskExecutor: lifecycle driver for scheduled tasks.
//!
//! Runs submitted [`ScheduledTask`](crate::ScheduledTask)s through their
//! lifecycle, enforcing per-type global uniqueness and driving listener
//! notifications.
//!
//! ## Lifecycle per execution
//! ```text
//! submit ──► validate config ──► PENDING record
//!
//! worker:
//!   ├─► global_unique? try to take the type slot
//!   │     └─ taken → FAILED (uniqueness conflict), body never invoked
//!   ├─► before_execute()        (failures logged, never abort)
//!   ├─► PENDING → RUNNING, on_task_start
//!   ├─► execute(ctx)            (panics caught, worker never dies)
//!   ├─► RUNNING → SUCCESS / FAILED / CANCELLED
//!   ├─► after_execute(success)  (failures logged, never abort)
//!   └─► slot released (RAII, every path), terminal notification
//! ```
//!
//! ## Rules
//! - Any exception from the body is captured into the record, never
//!   propagated to the submitter.
//! - Uniqueness release happens on **every** exit path (permit guard).
//! - Bounded waits never cancel the underlying execution.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::handle::{SharedRecord, TaskHandle};
use crate::core::unique::{UniquePermit, UniqueTaskManager};
use crate::error::{panic_message, SchedulerError, TaskError};
use crate::listeners::{ListenerSet, NotifyPhase, TaskListener, TaskNotification};
use crate::tasks::{TaskRecord, TaskRef, TaskStatus};

/// Executes scheduled tasks with uniqueness enforcement and notifications.
///
/// Parallel execution across task types is permitted; each submission runs
/// on its own tokio worker. Uniqueness only constrains tasks whose config
/// sets `global_unique`.
///
/// The executor is a cheap-clone handle: clones share the uniqueness
/// registry, the listeners, and the record registry.
#[derive(Clone)]
pub struct TaskExecutor {
    unique: Arc<UniqueTaskManager>,
    listeners: Arc<ListenerSet>,
    records: Arc<RwLock<HashMap<Uuid, SharedRecord>>>,
}

impl TaskExecutor {
    /// Creates an executor with the given initial listeners.
    pub fn new(listeners: Vec<Arc<dyn TaskListener>>) -> Self {
        Self {
            unique: Arc::new(UniqueTaskManager::new()),
            listeners: Arc::new(ListenerSet::new(listeners)),
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registers an additional lifecycle listener.
    pub async fn add_listener(&self, listener: Arc<dyn TaskListener>) {
        self.listeners.register(listener).await;
    }

    /// Returns the uniqueness manager (shared with all executions).
    pub fn unique_manager(&self) -> &Arc<UniqueTaskManager> {
        &self.unique
    }

    /// Runs `task` to completion and returns the terminal record.
    ///
    /// The body executes on a worker; the caller is suspended for the full
    /// duration. Configuration errors are raised before any execution
    /// attempt; body failures are captured into the returned record.
    pub async fn execute(&self, task: TaskRef) -> Result<TaskRecord, SchedulerError> {
        let mut handle = self.execute_detached(task).await?;
        Ok(handle.wait().await)
    }

    /// Submits `task` for detached execution.
    ///
    /// The handle is returned as soon as the record is registered; the body
    /// runs on a spawned worker.
    pub async fn execute_detached(&self, task: TaskRef) -> Result<TaskHandle, SchedulerError> {
        task.config().validate()?;

        let record = TaskRecord::new(task.config().clone());
        let id = record.execution_id;
        let shared: SharedRecord = Arc::new(RwLock::new(record));
        let (done_tx, done_rx) = watch::channel(TaskStatus::Pending);
        let cancel = CancellationToken::new();

        self.records.write().await.insert(id, Arc::clone(&shared));

        let me = self.clone();
        let lifecycle_record = Arc::clone(&shared);
        let lifecycle_cancel = cancel.clone();
        tokio::spawn(async move {
            me.run_lifecycle(task, lifecycle_record, done_tx, lifecycle_cancel)
                .await;
        });

        Ok(TaskHandle::new(id, shared, cancel, done_rx))
    }

    /// Submits `task` detached and waits up to `wait` for the terminal
    /// record.
    ///
    /// On expiry returns [`SchedulerError::WaitTimeout`] carrying the
    /// execution id. The execution continues independently; its terminal
    /// state can be observed later via [`TaskExecutor::task`].
    pub async fn execute_with_timeout(
        &self,
        task: TaskRef,
        wait: Duration,
    ) -> Result<TaskRecord, SchedulerError> {
        let mut handle = self.execute_detached(task).await?;
        handle.wait_timeout(wait).await
    }

    /// Returns a snapshot of the record for `execution_id`, if known.
    pub async fn task(&self, execution_id: Uuid) -> Option<TaskRecord> {
        let shared = {
            let records = self.records.read().await;
            records.get(&execution_id).cloned()
        };
        match shared {
            Some(record) => Some(record.read().await.clone()),
            None => None,
        }
    }

    /// Drops terminal records from the registry, returning how many were
    /// removed. Pending and running records are kept.
    pub async fn purge_terminal(&self) -> usize {
        let mut records = self.records.write().await;
        let mut terminal = Vec::new();
        for (id, shared) in records.iter() {
            if let Ok(record) = shared.try_read() {
                if record.status.is_terminal() {
                    terminal.push(*id);
                }
            }
        }
        for id in &terminal {
            records.remove(id);
        }
        terminal.len()
    }

    /// Drives one task through its full lifecycle.
    async fn run_lifecycle(
        &self,
        task: TaskRef,
        record: SharedRecord,
        done: watch::Sender<TaskStatus>,
        cancel: CancellationToken,
    ) {
        let config = task.config().clone();

        // Uniqueness gate: the permit is held for the whole lifecycle and
        // released by Drop on every path out of this function.
        let _permit = if config.global_unique {
            match UniquePermit::acquire(&self.unique, &config.task_type) {
                Some(permit) => Some(permit),
                None => {
                    debug!(
                        task = %config.task_name,
                        task_type = %config.task_type,
                        "rejected: type already running"
                    );
                    let snapshot = {
                        let mut rec = record.write().await;
                        rec.fail(TaskError::UniquenessConflict {
                            task_type: config.task_type.clone(),
                        });
                        rec.clone()
                    };
                    let n = TaskNotification::of_task(
                        &snapshot,
                        format!("rejected: a {:?} task is already running", config.task_type),
                    );
                    self.listeners.dispatch(NotifyPhase::Failed, &n).await;
                    let _ = done.send(snapshot.status);
                    return;
                }
            }
        } else {
            None
        };

        if cancel.is_cancelled() {
            let snapshot = {
                let mut rec = record.write().await;
                rec.cancel();
                rec.clone()
            };
            let n = TaskNotification::of_task(&snapshot, "task cancelled before start");
            self.listeners.dispatch(NotifyPhase::Cancelled, &n).await;
            let _ = done.send(snapshot.status);
            return;
        }

        self.run_hook(task.before_execute(), &config.task_name, "before_execute")
            .await;

        let snapshot = {
            let mut rec = record.write().await;
            rec.start();
            rec.clone()
        };
        let _ = done.send(TaskStatus::Running);
        debug!(task = %config.task_name, id = %snapshot.execution_id, "task started");
        let n = TaskNotification::of_task(&snapshot, "task started");
        self.listeners.dispatch(NotifyPhase::Start, &n).await;

        let outcome = match AssertUnwindSafe(task.execute(cancel.clone()))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(payload) => Err(TaskError::fail(format!(
                "panic: {}",
                panic_message(payload)
            ))),
        };

        let snapshot = {
            let mut rec = record.write().await;
            match outcome {
                Ok(value) => {
                    rec.succeed(value);
                }
                Err(TaskError::Canceled) => {
                    rec.cancel();
                }
                Err(err) => {
                    rec.fail(err);
                }
            }
            rec.clone()
        };
        let success = snapshot.status == TaskStatus::Success;

        self.run_hook(task.after_execute(success), &config.task_name, "after_execute")
            .await;

        let (phase, message) = match snapshot.status {
            TaskStatus::Success => (NotifyPhase::Success, "task completed".to_string()),
            TaskStatus::Cancelled => (NotifyPhase::Cancelled, "task cancelled".to_string()),
            _ => (
                NotifyPhase::Failed,
                format!(
                    "task failed: {}",
                    snapshot
                        .error
                        .as_ref()
                        .map(|e| e.to_string())
                        .unwrap_or_default()
                ),
            ),
        };
        debug!(
            task = %config.task_name,
            id = %snapshot.execution_id,
            status = snapshot.status.as_label(),
            "task finished"
        );
        let n = TaskNotification::of_task(&snapshot, message);
        self.listeners.dispatch(phase, &n).await;
        // Waiters wake only after listeners saw the terminal notification.
        let _ = done.send(snapshot.status);
    }

    /// Runs a hook future, capturing errors and panics into the log.
    async fn run_hook(
        &self,
        hook: impl std::future::Future<Output = Result<(), TaskError>>,
        task_name: &str,
        hook_name: &'static str,
    ) {
        match AssertUnwindSafe(hook).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(task = %task_name, hook = hook_name, error = %err, "hook failed");
            }
            Err(payload) => {
                warn!(
                    task = %task_name,
                    hook = hook_name,
                    panic = %panic_message(payload),
                    "hook panicked"
                );
            }
        }
    }
}
