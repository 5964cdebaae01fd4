//! End-to-end tests of the scheduler executor: uniqueness, waits,
//! cancellation, and listener delivery.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use tasklane::{
    LogListener, SchedulerError, ScheduledTask, TaskConfig, TaskError, TaskExecutor, TaskFn,
    TaskListener, TaskNotification, TaskRecord, TaskScheduler, TaskStatus,
};

/// Polls the handle until the record leaves PENDING.
async fn wait_until_running(handle: &tasklane::TaskHandle) -> TaskRecord {
    for _ in 0..500 {
        let snapshot = handle.snapshot().await;
        if snapshot.status != TaskStatus::Pending {
            return snapshot;
        }
        sleep(Duration::from_millis(2)).await;
    }
    panic!("task never left PENDING");
}

#[derive(Default)]
struct CountingListener {
    starts: AtomicU32,
    successes: AtomicU32,
    faileds: AtomicU32,
    cancelleds: AtomicU32,
    only_type: Option<&'static str>,
}

#[async_trait]
impl TaskListener for CountingListener {
    async fn on_task_start(&self, _n: &TaskNotification) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }
    async fn on_task_success(&self, _n: &TaskNotification) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }
    async fn on_task_failed(&self, _n: &TaskNotification) {
        self.faileds.fetch_add(1, Ordering::SeqCst);
    }
    async fn on_task_cancelled(&self, _n: &TaskNotification) {
        self.cancelleds.fetch_add(1, Ordering::SeqCst);
    }
    fn supports(&self, task_type: &str) -> bool {
        self.only_type.map(|t| t == task_type).unwrap_or(true)
    }
}

#[tokio::test]
async fn test_two_non_unique_tasks_run_concurrently() {
    let executor = TaskExecutor::new(vec![]);

    let make_task = || {
        TaskFn::arc(
            TaskConfig::new("report", "REPORT"),
            |_ctx: CancellationToken| async move {
                sleep(Duration::from_millis(30)).await;
                Ok::<_, TaskError>(json!("report done"))
            },
        )
    };

    let mut first = executor.execute_detached(make_task()).await.unwrap();
    let mut second = executor.execute_detached(make_task()).await.unwrap();

    let first = first.wait().await;
    let second = second.wait().await;

    assert_eq!(first.status, TaskStatus::Success);
    assert_eq!(second.status, TaskStatus::Success);
}

#[tokio::test]
async fn test_global_unique_rejects_concurrent_duplicate() {
    let executor = TaskExecutor::new(vec![]);
    let duplicate_ran = Arc::new(AtomicBool::new(false));

    let slow = TaskFn::arc(
        TaskConfig::new("backup", "BACKUP").with_global_unique(true),
        |_ctx: CancellationToken| async move {
            sleep(Duration::from_millis(150)).await;
            Ok::<_, TaskError>(Value::Null)
        },
    );
    let ran = duplicate_ran.clone();
    let duplicate = TaskFn::arc(
        TaskConfig::new("backup", "BACKUP").with_global_unique(true),
        move |_ctx: CancellationToken| {
            let ran = ran.clone();
            async move {
                ran.store(true, Ordering::SeqCst);
                Ok::<_, TaskError>(Value::Null)
            }
        },
    );

    let mut first = executor.execute_detached(slow).await.unwrap();
    wait_until_running(&first).await;

    let rejected = executor.execute(duplicate).await.unwrap();
    assert_eq!(rejected.status, TaskStatus::Failed);
    assert!(matches!(
        rejected.error,
        Some(TaskError::UniquenessConflict { ref task_type }) if task_type == "BACKUP"
    ));
    assert!(!duplicate_ran.load(Ordering::SeqCst));
    assert!(rejected.started_at.is_none());

    let first = first.wait().await;
    assert_eq!(first.status, TaskStatus::Success);

    // Slot released: the same type is admitted again.
    let again = TaskFn::arc(
        TaskConfig::new("backup", "BACKUP").with_global_unique(true),
        |_ctx: CancellationToken| async move { Ok::<_, TaskError>(Value::Null) },
    );
    let record = executor.execute(again).await.unwrap();
    assert_eq!(record.status, TaskStatus::Success);
}

#[tokio::test]
async fn test_wait_timeout_leaves_execution_running() {
    let executor = TaskExecutor::new(vec![]);

    let slow = TaskFn::arc(
        TaskConfig::new("slow", "SLOW"),
        |_ctx: CancellationToken| async move {
            sleep(Duration::from_millis(200)).await;
            Ok::<_, TaskError>(json!("late result"))
        },
    );

    let err = executor
        .execute_with_timeout(slow, Duration::from_millis(30))
        .await
        .unwrap_err();
    let id = match err {
        SchedulerError::WaitTimeout { id, .. } => id,
        other => panic!("expected WaitTimeout, got {other:?}"),
    };

    // The execution keeps going and reaches SUCCESS on its own.
    let mut record = None;
    for _ in 0..500 {
        if let Some(snapshot) = executor.task(id).await {
            if snapshot.status.is_terminal() {
                record = Some(snapshot);
                break;
            }
        }
        sleep(Duration::from_millis(5)).await;
    }
    let record = record.expect("task never reached a terminal state");
    assert_eq!(record.status, TaskStatus::Success);
    assert_eq!(record.result, Some(json!("late result")));
}

#[tokio::test]
async fn test_cooperative_cancellation() {
    let listener = Arc::new(CountingListener::default());
    let executor = TaskExecutor::new(vec![listener.clone()]);

    let patient = TaskFn::arc(
        TaskConfig::new("patient", "PATIENT"),
        |ctx: CancellationToken| async move {
            for _ in 0..200 {
                if ctx.is_cancelled() {
                    return Err(TaskError::Canceled);
                }
                sleep(Duration::from_millis(5)).await;
            }
            Ok(Value::Null)
        },
    );

    let mut handle = executor.execute_detached(patient).await.unwrap();
    wait_until_running(&handle).await;
    handle.cancel();

    let record = handle.wait().await;
    assert_eq!(record.status, TaskStatus::Cancelled);
    assert!(matches!(record.error, Some(TaskError::Canceled)));
    assert_eq!(listener.cancelleds.load(Ordering::SeqCst), 1);
    assert_eq!(listener.starts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_body_failure_is_captured_not_propagated() {
    let executor = TaskExecutor::new(vec![]);

    let failing = TaskFn::arc(
        TaskConfig::new("flaky", "FLAKY"),
        |_ctx: CancellationToken| async move {
            Err::<Value, _>(TaskError::fail("disk full"))
        },
    );

    let record = executor.execute(failing).await.unwrap();
    assert_eq!(record.status, TaskStatus::Failed);
    assert!(record.error.unwrap().to_string().contains("disk full"));
}

#[tokio::test]
async fn test_panicking_body_becomes_failed_record() {
    let executor = TaskExecutor::new(vec![]);

    let panicking = TaskFn::arc(
        TaskConfig::new("panicky", "PANICKY"),
        |ctx: CancellationToken| async move {
            if !ctx.is_cancelled() {
                panic!("boom");
            }
            Ok::<_, TaskError>(Value::Null)
        },
    );

    let record = executor.execute(panicking).await.unwrap();
    assert_eq!(record.status, TaskStatus::Failed);
    assert!(record.error.unwrap().to_string().contains("boom"));
}

#[tokio::test]
async fn test_listeners_receive_each_phase_exactly_once() {
    let all = Arc::new(CountingListener::default());
    let only_other = Arc::new(CountingListener {
        only_type: Some("OTHER"),
        ..Default::default()
    });
    let executor = TaskExecutor::new(vec![all.clone(), only_other.clone()]);

    let ok = TaskFn::arc(
        TaskConfig::new("ok", "REPORT"),
        |_ctx: CancellationToken| async move { Ok::<_, TaskError>(Value::Null) },
    );
    let bad = TaskFn::arc(
        TaskConfig::new("bad", "REPORT"),
        |_ctx: CancellationToken| async move { Err::<Value, _>(TaskError::fail("nope")) },
    );

    executor.execute(ok).await.unwrap();
    executor.execute(bad).await.unwrap();

    assert_eq!(all.starts.load(Ordering::SeqCst), 2);
    assert_eq!(all.successes.load(Ordering::SeqCst), 1);
    assert_eq!(all.faileds.load(Ordering::SeqCst), 1);
    assert_eq!(all.cancelleds.load(Ordering::SeqCst), 0);

    assert_eq!(only_other.starts.load(Ordering::SeqCst), 0);
    assert_eq!(only_other.faileds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_hook_failures_never_abort_the_lifecycle() {
    struct NoisyHooks {
        config: TaskConfig,
    }

    #[async_trait]
    impl ScheduledTask for NoisyHooks {
        fn config(&self) -> &TaskConfig {
            &self.config
        }
        async fn execute(&self, _ctx: CancellationToken) -> Result<Value, TaskError> {
            Ok(json!("fine"))
        }
        async fn before_execute(&self) -> Result<(), TaskError> {
            Err(TaskError::fail("before hook broke"))
        }
        async fn after_execute(&self, _success: bool) -> Result<(), TaskError> {
            panic!("after hook panicked");
        }
    }

    let executor = TaskExecutor::new(vec![]);
    let record = executor
        .execute(Arc::new(NoisyHooks {
            config: TaskConfig::new("noisy", "NOISY"),
        }))
        .await
        .unwrap();

    assert_eq!(record.status, TaskStatus::Success);
    assert_eq!(record.result, Some(json!("fine")));
}

#[tokio::test]
async fn test_invalid_config_rejected_before_execution() {
    let executor = TaskExecutor::new(vec![]);
    let ran = Arc::new(AtomicBool::new(false));
    let ran_clone = ran.clone();

    let blank = TaskFn::arc(
        TaskConfig::new("", "REPORT"),
        move |_ctx: CancellationToken| {
            let ran = ran_clone.clone();
            async move {
                ran.store(true, Ordering::SeqCst);
                Ok::<_, TaskError>(Value::Null)
            }
        },
    );

    let err = executor.execute(blank).await.unwrap_err();
    assert_eq!(err.as_label(), "invalid_config");
    assert!(!ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_log_listener_and_registry_purge() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("tasklane=debug")
        .try_init();

    let executor = TaskExecutor::new(vec![Arc::new(LogListener::new())]);
    let record = executor
        .execute(TaskFn::arc(
            TaskConfig::new("logged", "LOGGED"),
            |_ctx: CancellationToken| async move { Ok::<_, TaskError>(Value::Null) },
        ))
        .await
        .unwrap();
    assert_eq!(record.status, TaskStatus::Success);

    // The terminal record is still queryable, then purged.
    assert!(executor.task(record.execution_id).await.is_some());
    assert_eq!(executor.purge_terminal().await, 1);
    assert!(executor.task(record.execution_id).await.is_none());
}

#[tokio::test]
async fn test_scheduler_facade_delegates() {
    let executor = TaskExecutor::new(vec![]);
    let scheduler = TaskScheduler::new(executor.clone());

    let quick = TaskFn::arc(
        TaskConfig::new("quick", "QUICK").with_timeout(Duration::from_secs(5)),
        |_ctx: CancellationToken| async move { Ok::<_, TaskError>(json!(1)) },
    );
    let record = scheduler.submit_with_timeout(quick).await.unwrap();
    assert_eq!(record.status, TaskStatus::Success);

    let detached = TaskFn::arc(
        TaskConfig::new("detached", "QUICK"),
        |_ctx: CancellationToken| async move { Ok::<_, TaskError>(json!(2)) },
    );
    let mut handle = scheduler.submit_detached(detached).await.unwrap();
    assert_eq!(handle.wait().await.status, TaskStatus::Success);
}
