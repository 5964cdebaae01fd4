//! # QueueExecutor: single-worker FIFO task queue.
//!
//! Exactly one dedicated worker drains the queue one item at a time, so
//! queue-task bodies never run concurrently and never need locking against
//! each other. Failed attempts are retried with the item's backoff policy;
//! new submissions keep flowing into the queue while an item retries.
//!
//! ## Architecture
//! ```text
//! submit / submit_and_wait (many callers)
//!        │  try_send (bounded: fail-fast QueueFull)
//!        ▼
//!   [ FIFO queue ] ──► worker (exactly one)
//!                         │
//!                         ├─► PENDING → RUNNING, on_task_start (once)
//!                         ├─► before_execute() + execute()   per attempt
//!                         ├─► Ok  → SUCCESS, after_execute(true), signal
//!                         └─► Err → should_retry? budget left?
//!                               ├─ yes → retry_count += 1,
//!                               │        sleep(backoff_delay(retry_count)),
//!                               │        next attempt (no start re-fire)
//!                               └─ no  → FAILED (last error retained),
//!                                        after_execute(false), signal
//! ```
//!
//! ## Rules
//! - FIFO order is preserved; `priority` is informational only.
//! - `retry_count` never exceeds `max_retries`.
//! - Waiter timeouts never remove the item from the queue.
//! - `start` is idempotent; `stop` finishes the in-flight item and abandons
//!   the rest (their waiters observe [`SchedulerError::Stopped`]).

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{panic_message, SchedulerError, TaskError};
use crate::listeners::{ListenerSet, NotifyPhase, TaskListener, TaskNotification};
use crate::queue::config::{QueueSettings, QueueTaskConfig};
use crate::queue::contract::QueueTaskRef;
use crate::queue::record::{QueueStats, QueueTaskRecord, StatCounters};
use crate::tasks::TaskStatus;

/// Shared, worker-owned record of one queue task.
type SharedQueueRecord = Arc<RwLock<QueueTaskRecord>>;

/// One queued work item.
struct QueueItem {
    task: QueueTaskRef,
    record: SharedQueueRecord,
    done: watch::Sender<TaskStatus>,
}

/// Sending half of the queue (bounded or unbounded per settings).
#[derive(Clone)]
enum QueueTx {
    Bounded(mpsc::Sender<QueueItem>),
    Unbounded(mpsc::UnboundedSender<QueueItem>),
}

impl QueueTx {
    /// Enqueues without blocking; a full bounded queue rejects fail-fast.
    fn try_enqueue(&self, item: QueueItem, capacity: usize) -> Result<(), SchedulerError> {
        match self {
            QueueTx::Bounded(tx) => match tx.try_send(item) {
                Ok(()) => Ok(()),
                Err(mpsc::error::TrySendError::Full(_)) => {
                    Err(SchedulerError::QueueFull { capacity })
                }
                Err(mpsc::error::TrySendError::Closed(_)) => Err(SchedulerError::Stopped),
            },
            QueueTx::Unbounded(tx) => tx.send(item).map_err(|_| SchedulerError::Stopped),
        }
    }
}

/// Receiving half of the queue, owned by the worker.
enum QueueRx {
    Bounded(mpsc::Receiver<QueueItem>),
    Unbounded(mpsc::UnboundedReceiver<QueueItem>),
}

impl QueueRx {
    async fn recv(&mut self) -> Option<QueueItem> {
        match self {
            QueueRx::Bounded(rx) => rx.recv().await,
            QueueRx::Unbounded(rx) => rx.recv().await,
        }
    }
}

/// Single-worker executor serializing queue tasks with retry and backoff.
///
/// The executor is a cheap-clone handle: clones share the queue, the record
/// registry, the statistics, and the worker.
#[derive(Clone)]
pub struct QueueExecutor {
    settings: QueueSettings,
    tx: QueueTx,
    rx: Arc<Mutex<Option<QueueRx>>>,
    records: Arc<RwLock<HashMap<Uuid, SharedQueueRecord>>>,
    current: Arc<RwLock<Option<SharedQueueRecord>>>,
    depth: Arc<AtomicUsize>,
    stats: Arc<StatCounters>,
    listeners: Arc<ListenerSet>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
    shutdown: CancellationToken,
}

impl QueueExecutor {
    /// Creates an executor with the given settings and initial listeners.
    ///
    /// The worker is not running yet; call [`QueueExecutor::start`].
    pub fn new(settings: QueueSettings, listeners: Vec<Arc<dyn TaskListener>>) -> Self {
        let (tx, rx) = match settings.bound() {
            Some(capacity) => {
                let (tx, rx) = mpsc::channel(capacity);
                (QueueTx::Bounded(tx), QueueRx::Bounded(rx))
            }
            None => {
                let (tx, rx) = mpsc::unbounded_channel();
                (QueueTx::Unbounded(tx), QueueRx::Unbounded(rx))
            }
        };
        Self {
            settings,
            tx,
            rx: Arc::new(Mutex::new(Some(rx))),
            records: Arc::new(RwLock::new(HashMap::new())),
            current: Arc::new(RwLock::new(None)),
            depth: Arc::new(AtomicUsize::new(0)),
            stats: Arc::new(StatCounters::default()),
            listeners: Arc::new(ListenerSet::new(listeners)),
            worker: Arc::new(Mutex::new(None)),
            shutdown: CancellationToken::new(),
        }
    }

    /// Registers an additional lifecycle listener.
    pub async fn add_listener(&self, listener: Arc<dyn TaskListener>) {
        self.listeners.register(listener).await;
    }

    /// Spins up the dedicated worker. Idempotent.
    pub fn start(&self) {
        let mut slot = self.worker.lock();
        if slot.as_ref().map(|h| !h.is_finished()).unwrap_or(false) {
            return;
        }
        let Some(mut rx) = self.rx.lock().take() else {
            return;
        };
        let me = self.clone();
        let token = self.shutdown.clone();
        *slot = Some(tokio::spawn(async move {
            loop {
                let item = tokio::select! {
                    _ = token.cancelled() => break,
                    item = rx.recv() => match item {
                        Some(item) => item,
                        None => break,
                    },
                };
                me.process(item).await;
            }
            debug!("queue worker stopped");
        }));
    }

    /// Signals the worker to stop and joins it.
    ///
    /// The in-flight item finishes (an in-flight backoff sleep is cut short
    /// and the item fails with its pending error); queued items are
    /// abandoned as PENDING and their waiters observe
    /// [`SchedulerError::Stopped`].
    pub async fn stop(&self) {
        self.shutdown.cancel();
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if handle.await.is_err() {
                warn!("queue worker panicked during shutdown");
            }
        }
    }

    /// Returns whether the worker is currently running.
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Validates and enqueues `task`, returning the PENDING record.
    ///
    /// Never blocks on execution; the caller may later query status via
    /// [`QueueExecutor::task`].
    pub async fn submit(&self, task: QueueTaskRef) -> Result<QueueTaskRecord, SchedulerError> {
        let (record, _done) = self.enqueue(task).await?;
        let snapshot = record.read().await.clone();
        Ok(snapshot)
    }

    /// Enqueues `task` and waits up to `wait` for its terminal record.
    ///
    /// On expiry returns [`SchedulerError::WaitTimeout`] carrying the task
    /// id; the item stays queued/running and reaches a terminal state
    /// independently.
    pub async fn submit_and_wait(
        &self,
        task: QueueTaskRef,
        wait: Duration,
    ) -> Result<QueueTaskRecord, SchedulerError> {
        let (record, mut done) = self.enqueue(task).await?;
        let id = record.read().await.task_id;

        let terminal = done.wait_for(|status| status.is_terminal());
        let result = match time::timeout(wait, terminal).await {
            Err(_elapsed) => Err(SchedulerError::WaitTimeout { wait, id }),
            Ok(Err(_closed)) => Err(SchedulerError::Stopped),
            Ok(Ok(_)) => Ok(record.read().await.clone()),
        };
        result
    }

    /// Number of items queued behind the current one.
    pub fn queue_size(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    /// Snapshot of the item the worker is executing right now, if any.
    pub async fn current_task(&self) -> Option<QueueTaskRecord> {
        let current = { self.current.read().await.clone() };
        match current {
            Some(record) => Some(record.read().await.clone()),
            None => None,
        }
    }

    /// Point-in-time counter snapshot.
    pub fn statistics(&self) -> QueueStats {
        self.stats.snapshot()
    }

    /// Returns a snapshot of the record for `task_id`, if known.
    pub async fn task(&self, task_id: Uuid) -> Option<QueueTaskRecord> {
        let shared = {
            let records = self.records.read().await;
            records.get(&task_id).cloned()
        };
        match shared {
            Some(record) => Some(record.read().await.clone()),
            None => None,
        }
    }

    /// Drops terminal records from the registry, returning how many were
    /// removed.
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

    /// Validates, registers, and enqueues one task.
    async fn enqueue(
        &self,
        task: QueueTaskRef,
    ) -> Result<(SharedQueueRecord, watch::Receiver<TaskStatus>), SchedulerError> {
        task.config().validate()?;

        let record = QueueTaskRecord::new(task.config().clone());
        let id = record.task_id;
        let shared: SharedQueueRecord = Arc::new(RwLock::new(record));
        let (done_tx, done_rx) = watch::channel(TaskStatus::Pending);

        self.records.write().await.insert(id, Arc::clone(&shared));

        let item = QueueItem {
            task,
            record: Arc::clone(&shared),
            done: done_tx,
        };
        if let Err(err) = self.tx.try_enqueue(item, self.settings.capacity) {
            self.records.write().await.remove(&id);
            return Err(err);
        }

        self.depth.fetch_add(1, Ordering::Relaxed);
        self.stats.submitted.fetch_add(1, Ordering::Relaxed);
        debug!(task_id = %id, depth = self.queue_size(), "queue task submitted");
        Ok((shared, done_rx))
    }

    /// Executes one dequeued item to its terminal state (the only writer of
    /// queue-task records).
    async fn process(&self, item: QueueItem) {
        self.depth.fetch_sub(1, Ordering::Relaxed);
        *self.current.write().await = Some(Arc::clone(&item.record));

        let config = item.task.config().clone();

        let snapshot = {
            let mut rec = item.record.write().await;
            rec.start();
            rec.clone()
        };
        let _ = item.done.send(TaskStatus::Running);
        debug!(task = %config.task_name, id = %snapshot.task_id, "queue task started");
        let n = TaskNotification::of_queue(&snapshot, "task started");
        self.listeners.dispatch(NotifyPhase::Start, &n).await;

        loop {
            self.run_hook(
                item.task.before_execute(),
                &config.task_name,
                "before_execute",
            )
            .await;

            let outcome = match AssertUnwindSafe(item.task.execute()).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(TaskError::fail(format!(
                    "panic: {}",
                    panic_message(payload)
                ))),
            };

            match outcome {
                Ok(value) => {
                    let snapshot = {
                        let mut rec = item.record.write().await;
                        rec.succeed(value);
                        rec.clone()
                    };
                    self.run_hook(
                        item.task.after_execute(true),
                        &config.task_name,
                        "after_execute",
                    )
                    .await;
                    self.stats.succeeded.fetch_add(1, Ordering::Relaxed);
                    let n = TaskNotification::of_queue(&snapshot, "task completed");
                    self.listeners.dispatch(NotifyPhase::Success, &n).await;
                    // Waiters wake only after listeners and statistics
                    // reflect the terminal state.
                    let _ = item.done.send(TaskStatus::Success);
                    break;
                }
                Err(err) => {
                    let retries_used = { item.record.read().await.retry_count };
                    let wants_retry = item.task.should_retry(&err);

                    if wants_retry && retries_used < config.max_retries {
                        let attempt = {
                            let mut rec = item.record.write().await;
                            rec.retry_count += 1;
                            rec.retry_count
                        };
                        self.stats.retried.fetch_add(1, Ordering::Relaxed);
                        let delay = config.backoff_delay(attempt);
                        debug!(
                            task = %config.task_name,
                            attempt,
                            ?delay,
                            error = %err,
                            "retry scheduled"
                        );

                        let interrupted = tokio::select! {
                            _ = time::sleep(delay) => false,
                            _ = self.shutdown.cancelled() => true,
                        };
                        if !interrupted {
                            continue;
                        }
                        // Shutdown cut the backoff short: fail with the
                        // pending error instead of leaving the item open.
                        self.finish_failed(&item, &config, err).await;
                        break;
                    }

                    let final_err = if wants_retry && config.max_retries > 0 {
                        TaskError::RetriesExhausted {
                            attempts: retries_used + 1,
                            last: Box::new(err),
                        }
                    } else {
                        err
                    };
                    self.finish_failed(&item, &config, final_err).await;
                    break;
                }
            }
        }

        *self.current.write().await = None;
    }

    /// Marks the item FAILED and runs the terminal bookkeeping.
    async fn finish_failed(&self, item: &QueueItem, config: &QueueTaskConfig, error: TaskError) {
        let message = format!("task failed: {error}");
        let snapshot = {
            let mut rec = item.record.write().await;
            rec.fail(error);
            rec.clone()
        };
        self.run_hook(
            item.task.after_execute(false),
            &config.task_name,
            "after_execute",
        )
        .await;
        self.stats.failed.fetch_add(1, Ordering::Relaxed);
        let n = TaskNotification::of_queue(&snapshot, message);
        self.listeners.dispatch(NotifyPhase::Failed, &n).await;
        let _ = item.done.send(TaskStatus::Failed);
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
