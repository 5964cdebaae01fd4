//! # Global-uniqueness tracking for task types.
//!
//! [`UniqueTaskManager`] tracks which task *types* currently have a running
//! instance. [`UniqueTaskManager::try_acquire`] atomically registers a type
//! if absent; concurrent callers for the same type never both succeed.
//!
//! ## Rules
//! - No ordering guarantee among competing callers beyond "first to win the
//!   insert".
//! - `release` is idempotent and safe to call for a type that was never
//!   acquired.
//! - The executor holds acquisitions as RAII [`UniquePermit`] guards so the
//!   slot is released on every exit path.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

/// Registry of task types that currently have a running instance.
#[derive(Default)]
pub struct UniqueTaskManager {
    running: Mutex<HashSet<String>>,
}

impl UniqueTaskManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically registers `task_type` as running.
    ///
    /// Returns `false` if an instance of the type is already registered.
    pub fn try_acquire(&self, task_type: &str) -> bool {
        self.running.lock().insert(task_type.to_string())
    }

    /// Removes the registration for `task_type`.
    ///
    /// Idempotent: releasing a type that is not registered is a no-op.
    pub fn release(&self, task_type: &str) {
        self.running.lock().remove(task_type);
    }

    /// Returns whether an instance of `task_type` is currently registered.
    pub fn is_running(&self, task_type: &str) -> bool {
        self.running.lock().contains(task_type)
    }

    /// Returns a sorted snapshot of the registered types.
    pub fn running_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.running.lock().iter().cloned().collect();
        types.sort_unstable();
        types
    }

}

/// Holds a uniqueness slot; releases it on drop.
pub(crate) struct UniquePermit {
    manager: Arc<UniqueTaskManager>,
    task_type: String,
}

impl UniquePermit {
    /// Acquires the slot for `task_type` as an RAII guard.
    ///
    /// Returns `None` when the type is already running. Dropping the guard
    /// releases the slot.
    pub(crate) fn acquire(manager: &Arc<UniqueTaskManager>, task_type: &str) -> Option<Self> {
        if manager.try_acquire(task_type) {
            Some(Self {
                manager: Arc::clone(manager),
                task_type: task_type.to_string(),
            })
        } else {
            None
        }
    }
}

impl Drop for UniquePermit {
    fn drop(&mut self) {
        self.manager.release(&self.task_type);
    }
}
