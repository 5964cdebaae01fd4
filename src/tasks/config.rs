//! # Static configuration of a scheduled task.
//!
//! [`TaskConfig`] bundles the identity and execution policy of one task:
//! its display name, its type (the uniqueness key), whether the type may
//! run more than once concurrently, and the default wait bound used by the
//! scheduler facade.
//!
//! ## Sentinel values
//! - `timeout = 0s` → no wait bound of its own (the facade substitutes its
//!   default); use [`TaskConfig::timeout_opt`] instead of comparing to zero.

use std::time::Duration;

use crate::error::SchedulerError;

/// Immutable configuration of a scheduled task.
///
/// Built with [`TaskConfig::new`] plus the `with_*` builders, then validated
/// once at submission. The executor clones it into every
/// [`TaskRecord`](crate::TaskRecord) it creates.
///
/// ## Example
/// ```
/// use std::time::Duration;
/// use tasklane::TaskConfig;
///
/// let cfg = TaskConfig::new("nightly-backup", "BACKUP")
///     .with_global_unique(true)
///     .with_timeout(Duration::from_secs(600))
///     .with_description("full database backup");
///
/// assert!(cfg.validate().is_ok());
/// assert_eq!(cfg.timeout_opt(), Some(Duration::from_secs(600)));
/// ```
#[derive(Clone, Debug)]
pub struct TaskConfig {
    /// Human-readable task name (for logs and notifications).
    pub task_name: String,
    /// Task type — the key used for global-uniqueness checks.
    pub task_type: String,
    /// When `true`, at most one task of this type may be RUNNING at a time.
    pub global_unique: bool,
    /// Default wait bound for `submit_with_timeout` (`0s` = none).
    pub timeout: Duration,
    /// Free-form description.
    pub description: String,
}

impl TaskConfig {
    /// Creates a configuration with the given name and type.
    ///
    /// Defaults: not globally unique, no timeout, empty description.
    pub fn new(task_name: impl Into<String>, task_type: impl Into<String>) -> Self {
        Self {
            task_name: task_name.into(),
            task_type: task_type.into(),
            global_unique: false,
            timeout: Duration::ZERO,
            description: String::new(),
        }
    }

    /// Returns a new config with the uniqueness flag set.
    #[must_use]
    pub fn with_global_unique(mut self, global_unique: bool) -> Self {
        self.global_unique = global_unique;
        self
    }

    /// Returns a new config with the given default wait bound.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns a new config with the given description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns the configured wait bound as an `Option`.
    ///
    /// - `None` → no bound of its own
    /// - `Some(d)` → wait up to `d`
    #[inline]
    pub fn timeout_opt(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
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
