//! # Queue-task configuration and queue settings.
//!
//! [`QueueTaskConfig`] describes one queue-managed work item, including its
//! retry policy. The delay before retry attempt `n` (1-indexed) is
//! `retry_delay × 2^(n−1)` when exponential backoff is enabled, else
//! `retry_delay`; the arithmetic saturates instead of overflowing.
//!
//! [`QueueSettings`] configures the executor itself.
//!
//! ## Sentinel values
//! - `QueueSettings::capacity = 0` → unbounded queue (no fail-fast
//!   rejection); use [`QueueSettings::bound`] instead of comparing to zero.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use tasklane::QueueTaskConfig;
//!
//! let cfg = QueueTaskConfig::new("import-batch", "IMPORT")
//!     .with_max_retries(3)
//!     .with_retry_delay(Duration::from_millis(100))
//!     .with_exponential_backoff(true);
//!
//! // Retry attempt 1 — uses retry_delay
//! assert_eq!(cfg.backoff_delay(1), Duration::from_millis(100));
//! // Retry attempt 3 — 100ms × 2^2 = 400ms
//! assert_eq!(cfg.backoff_delay(3), Duration::from_millis(400));
//! ```

use std::time::Duration;

use crate::error::SchedulerError;

/// Immutable configuration of a queue-managed task.
#[derive(Clone, Debug)]
pub struct QueueTaskConfig {
    /// Human-readable task name (for logs and notifications).
    pub task_name: String,
    /// Task type (informational grouping; the queue serializes regardless).
    pub task_type: String,
    /// Maximum retries after the initial attempt (`0` = no retry).
    pub max_retries: u32,
    /// Base delay before a retry.
    pub retry_delay: Duration,
    /// When `true`, the delay doubles with each retry attempt.
    pub exponential_backoff: bool,
    /// Informational priority; the queue drains strictly FIFO.
    pub priority: i32,
    /// Free-form description.
    pub description: String,
}

impl QueueTaskConfig {
    /// Creates a configuration with the given name and type.
    ///
    /// Defaults: no retries, 100 ms retry delay, constant backoff,
    /// priority 0, empty description.
    pub fn new(task_name: impl Into<String>, task_type: impl Into<String>) -> Self {
        Self {
            task_name: task_name.into(),
            task_type: task_type.into(),
            max_retries: 0,
            retry_delay: Duration::from_millis(100),
            exponential_backoff: false,
            priority: 0,
            description: String::new(),
        }
    }

    /// Returns a new config with the given retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Returns a new config with the given base retry delay.
    #[must_use]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Returns a new config with exponential backoff toggled.
    #[must_use]
    pub fn with_exponential_backoff(mut self, exponential: bool) -> Self {
        self.exponential_backoff = exponential;
        self
    }

    /// Returns a new config with the given informational priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Returns a new config with the given description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Computes the delay before retry attempt `attempt` (1-indexed).
    ///
    /// With exponential backoff the base doubles per attempt
    /// (`retry_delay × 2^(attempt−1)`); without it the delay is constant.
    /// Overflow saturates rather than wrapping.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        if !self.exponential_backoff {
            return self.retry_delay;
        }
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_delay.saturating_mul(factor)
    }

    /// Validates the configuration.
    ///
    /// Fails when `task_name` or `task_type` is blank (empty or whitespace).
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.task_name.trim().is_empty() {
            return Err(SchedulerError::InvalidConfig {
                reason: "task_name must not be blank".to_string(),
            });
        }
        if self.task_type.trim().is_empty() {
            return Err(SchedulerError::InvalidConfig {
                reason: "task_type must not be blank".to_string(),
            });
        }
        Ok(())
    }
}

/// Settings of a [`QueueExecutor`](crate::QueueExecutor).
#[derive(Clone, Debug)]
pub struct QueueSettings {
    /// Queue capacity (`0` = unbounded).
    ///
    /// A positive capacity makes `submit` fail fast with
    /// [`SchedulerError::QueueFull`] when the queue is full.
    pub capacity: usize,
}

impl Default for QueueSettings {
    /// Unbounded queue.
    fn default() -> Self {
        Self { capacity: 0 }
    }
}

impl QueueSettings {
    /// Returns the capacity as an `Option`.
    ///
    /// - `None` → unbounded
    /// - `Some(n)` → at most `n` queued items
    #[inline]
    pub fn bound(&self) -> Option<usize> {
        if self.capacity == 0 {
            None
        } else {
            Some(self.capacity)
        }
    }
}
