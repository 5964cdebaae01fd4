//! # LogListener — lifecycle event logger
//!
//! A minimal listener that writes incoming notifications to the `tracing`
//! log. Use it for tests or as a reference implementation.
//!
//! ## Example output
//! ```text
//! task lifecycle task="nightly-backup" type="BACKUP" status="running" msg="task started"
//! task lifecycle task="nightly-backup" type="BACKUP" status="failed" msg="task failed: execution failed: disk full"
//! ```

use async_trait::async_trait;
use tracing::info;

use crate::listeners::listener::TaskListener;
use crate::listeners::notification::TaskNotification;

/// Notification logger listener.
#[derive(Default)]
pub struct LogListener;

impl LogListener {
    /// Construct a new [`LogListener`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn log(&self, n: &TaskNotification) {
        info!(
            task = %n.task_name,
            task_type = %n.task_type,
            status = n.status.as_label(),
            retries = n.retry_count,
            msg = %n.message,
            "task lifecycle"
        );
    }
}

#[async_trait]
impl TaskListener for LogListener {
    async fn on_task_start(&self, notification: &TaskNotification) {
        self.log(notification);
    }

    async fn on_task_success(&self, notification: &TaskNotification) {
        self.log(notification);
    }

    async fn on_task_failed(&self, notification: &TaskNotification) {
        self.log(notification);
    }

    async fn on_task_cancelled(&self, notification: &TaskNotification) {
        self.log(notification);
    }

    fn name(&self) -> &'static str {
        "LogListener"
    }
}
