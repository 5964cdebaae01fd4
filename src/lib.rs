//! # tasklane
//!
//! **Tasklane** is a task-execution runtime for background work in Rust.
//!
//! It provides two coordinated executors: a scheduler that enforces
//! at-most-one-running-instance per logical task type, and a single-worker
//! queue that serializes a class of tasks with automatic retry and backoff.
//! The crate is designed as a building block for applications that need
//! ordering and failure-recovery guarantees without distributed
//! coordination.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌───────────────┐  ┌───────────────┐      ┌───────────────┐
//!  │ ScheduledTask │  │ ScheduledTask │      │   QueueTask   │
//!  │ (user task 1) │  │ (user task 2) │      │ (user task N) │
//!  └───────┬───────┘  └───────┬───────┘      └───────┬───────┘
//!          ▼                  ▼                      ▼
//!  ┌─────────────────────────────────┐  ┌──────────────────────────────┐
//!  │  TaskExecutor                   │  │  QueueExecutor               │
//!  │  - UniqueTaskManager            │  │  - FIFO queue (opt. bounded) │
//!  │    (per-type RUNNING slots)     │  │  - exactly one worker        │
//!  │  - parallel across types        │  │  - retry with backoff        │
//!  │  - ListenerSet (notifications)  │  │  - ListenerSet               │
//!  └───────┬─────────────────────────┘  └──────────┬───────────────────┘
//!          ▼                                       ▼
//!  ┌───────────────┐                      ┌───────────────┐
//!  │ TaskScheduler │                      │ QueueService  │
//!  │   (facade)    │                      │   (facade)    │
//!  └───────────────┘                      └───────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! TaskRef ──► TaskExecutor ──► PENDING record
//!
//!   ├─► global_unique? take type slot (conflict → FAILED, body skipped)
//!   ├─► before_execute()                 (failures logged, never abort)
//!   ├─► PENDING → RUNNING, on_task_start
//!   ├─► execute(ctx)                     (panics captured, workers survive)
//!   ├─► RUNNING → SUCCESS / FAILED / CANCELLED
//!   ├─► after_execute(success)
//!   └─► slot released (every path), terminal notification
//!
//! QueueTaskRef ──► QueueExecutor ──► FIFO ──► single worker
//!
//!   same shape, plus: failed attempt → should_retry? budget left?
//!     yes → sleep(backoff_delay(n)) → retry (start not re-fired)
//!     no  → FAILED with the last error retained
//! ```
//!
//! ## Features
//! | Area             | Description                                             | Key types / traits                      |
//! |------------------|---------------------------------------------------------|-----------------------------------------|
//! | **Scheduling**   | Unique-per-type execution, detached handles, waits.     | [`TaskExecutor`], [`TaskScheduler`]     |
//! | **Queueing**     | Serialized execution, retry/backoff, fail-fast bounds.  | [`QueueExecutor`], [`QueueService`]     |
//! | **Contracts**    | Tasks as traits or closures, optional hooks.            | [`ScheduledTask`], [`QueueTask`]        |
//! | **Observation**  | Lifecycle notifications with per-type filtering.        | [`TaskListener`], [`TaskNotification`]  |
//! | **Errors**       | Caller-facing vs. record-captured failures.             | [`SchedulerError`], [`TaskError`]       |
//!
//! ## Semantics worth knowing
//! - Timeouts bound the **caller's wait only**; they never cancel the
//!   underlying execution, which stays observable by id.
//! - Cancellation is cooperative: bodies receive a `CancellationToken` and
//!   decide when to honor it.
//! - A submitted task is never silently dropped: callers always get a
//!   record or an error.
//!
//! ## Example
//! ```rust
//! use serde_json::{json, Value};
//! use std::time::Duration;
//! use tasklane::{
//!     QueueExecutor, QueueSettings, QueueTaskConfig, QueueTaskFn, TaskConfig, TaskError,
//!     TaskExecutor, TaskFn, TaskScheduler,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Scheduler side: a globally-unique backup task.
//!     let executor = TaskExecutor::new(vec![]);
//!     let scheduler = TaskScheduler::new(executor.clone());
//!
//!     let backup = TaskFn::arc(
//!         TaskConfig::new("nightly-backup", "BACKUP").with_global_unique(true),
//!         |_ctx: CancellationToken| async move { Ok::<_, TaskError>(json!({"ok": true})) },
//!     );
//!     let record = scheduler.submit(backup).await?;
//!     println!("backup finished as {:?}", record.status);
//!
//!     // Queue side: serialized writes with retry.
//!     let queue = QueueExecutor::new(QueueSettings::default(), vec![]);
//!     queue.start();
//!
//!     let import = QueueTaskFn::arc(
//!         QueueTaskConfig::new("import-batch", "IMPORT")
//!             .with_max_retries(3)
//!             .with_exponential_backoff(true),
//!         || async { Ok::<Value, TaskError>(json!({"imported": 10})) },
//!     );
//!     let record = queue.submit_and_wait(import, Duration::from_secs(5)).await?;
//!     println!("import finished as {:?}", record.status);
//!
//!     queue.stop().await;
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod listeners;
mod queue;
mod tasks;

// ---- Public re-exports ----

pub use core::{TaskExecutor, TaskHandle, TaskScheduler, UniqueTaskManager, DEFAULT_SUBMIT_WAIT};
pub use error::{SchedulerError, TaskError};
pub use listeners::{LogListener, TaskListener, TaskNotification};
pub use queue::{
    QueueExecutor, QueueService, QueueSettings, QueueStats, QueueTask, QueueTaskConfig,
    QueueTaskFn, QueueTaskRecord, QueueTaskRef, DEFAULT_QUEUE_WAIT,
};
pub use tasks::{ScheduledTask, TaskConfig, TaskFn, TaskRecord, TaskRef, TaskStatus};
