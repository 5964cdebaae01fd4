//! # Listener registry and dispatch.
//!
//! [`ListenerSet`] owns the registered listeners and fans lifecycle
//! notifications out to them.
//!
//! ## Rules
//! - **Sequential dispatch**: listeners run one after another, so every
//!   listener whose `supports` returns `true` sees exactly one call per
//!   lifecycle phase — nothing is ever dropped.
//! - **Per-dispatch filtering**: `supports(task_type)` is evaluated on every
//!   dispatch, not at registration time.
//! - **Panic isolation**: a panicking listener is caught via `catch_unwind`,
//!   reported with `tracing::warn!`, and does not affect other listeners or
//!   the execution that triggered the dispatch.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::panic_message;
use crate::listeners::listener::TaskListener;
use crate::listeners::notification::TaskNotification;

/// Lifecycle phase of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NotifyPhase {
    Start,
    Success,
    Failed,
    Cancelled,
}

/// Registry of lifecycle listeners shared by an executor.
#[derive(Default)]
pub(crate) struct ListenerSet {
    listeners: RwLock<Vec<Arc<dyn TaskListener>>>,
}

impl ListenerSet {
    /// Creates a set pre-populated with the given listeners.
    pub(crate) fn new(listeners: Vec<Arc<dyn TaskListener>>) -> Self {
        Self {
            listeners: RwLock::new(listeners),
        }
    }

    /// Registers an additional listener.
    pub(crate) async fn register(&self, listener: Arc<dyn TaskListener>) {
        self.listeners.write().await.push(listener);
    }

    /// Dispatches one lifecycle notification to every supporting listener.
    pub(crate) async fn dispatch(&self, phase: NotifyPhase, notification: &TaskNotification) {
        let listeners: Vec<Arc<dyn TaskListener>> = self.listeners.read().await.clone();

        for listener in listeners {
            if !listener.supports(&notification.task_type) {
                continue;
            }
            let fut = async {
                match phase {
                    NotifyPhase::Start => listener.on_task_start(notification).await,
                    NotifyPhase::Success => listener.on_task_success(notification).await,
                    NotifyPhase::Failed => listener.on_task_failed(notification).await,
                    NotifyPhase::Cancelled => listener.on_task_cancelled(notification).await,
                }
            };
            if let Err(payload) = AssertUnwindSafe(fut).catch_unwind().await {
                warn!(
                    listener = listener.name(),
                    task = %notification.task_name,
                    panic = %panic_message(payload),
                    "listener panicked during dispatch"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{TaskConfig, TaskRecord};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct Counting {
        starts: AtomicU32,
        successes: AtomicU32,
        only_type: Option<&'static str>,
    }

    #[async_trait]
    impl TaskListener for Counting {
        async fn on_task_start(&self, _n: &TaskNotification) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        async fn on_task_success(&self, _n: &TaskNotification) {
            self.successes.fetch_add(1, Ordering::SeqCst);
        }
        async fn on_task_failed(&self, _n: &TaskNotification) {}
        fn supports(&self, task_type: &str) -> bool {
            self.only_type.map(|t| t == task_type).unwrap_or(true)
        }
    }

    struct Panicking;

    #[async_trait]
    impl TaskListener for Panicking {
        async fn on_task_start(&self, _n: &TaskNotification) {
            panic!("listener bug");
        }
        async fn on_task_success(&self, _n: &TaskNotification) {}
        async fn on_task_failed(&self, _n: &TaskNotification) {}
    }

    fn notification(task_type: &str) -> TaskNotification {
        let mut rec = TaskRecord::new(TaskConfig::new("demo", task_type));
        rec.start();
        TaskNotification::of_task(&rec, "task started")
    }

    #[tokio::test]
    async fn test_supports_filters_per_dispatch() {
        let all = Arc::new(Counting::default());
        let only_backup = Arc::new(Counting {
            only_type: Some("BACKUP"),
            ..Default::default()
        });
        let set = ListenerSet::new(vec![all.clone(), only_backup.clone()]);

        set.dispatch(NotifyPhase::Start, &notification("REPORT")).await;
        set.dispatch(NotifyPhase::Start, &notification("BACKUP")).await;

        assert_eq!(all.starts.load(Ordering::SeqCst), 2);
        assert_eq!(only_backup.starts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_listener_does_not_block_others() {
        let counting = Arc::new(Counting::default());
        let set = ListenerSet::new(vec![Arc::new(Panicking), counting.clone()]);

        set.dispatch(NotifyPhase::Start, &notification("REPORT")).await;

        assert_eq!(counting.starts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_register_at_runtime() {
        let set = ListenerSet::default();
        let counting = Arc::new(Counting::default());
        set.register(counting.clone()).await;
        set.dispatch(NotifyPhase::Success, &notification("REPORT")).await;
        assert_eq!(counting.successes.load(Ordering::SeqCst), 1);
    }
}
