//! Per-task exclusive access.

use crate::workflow::domain::TaskId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = HashMap<TaskId, Arc<AsyncMutex<()>>>;

/// Hands out one asynchronous lock per task.
///
/// Entries are dropped once nobody holds or waits for them.
#[derive(Debug, Clone, Default)]
pub struct TaskLockRegistry {
    locks: Arc<Mutex<LockMap>>,
}

impl TaskLockRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `task_id`.
    pub async fn acquire(&self, task_id: TaskId) -> TaskLockGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(task_id).or_default())
        };
        let guard = lock.lock_owned().await;
        TaskLockGuard {
            locks: Arc::clone(&self.locks),
            task_id,
            guard: Some(guard),
        }
    }

    /// Returns the number of tasks with a live lock entry.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Exclusive access to one task, released on drop.
#[derive(Debug)]
pub struct TaskLockGuard {
    locks: Arc<Mutex<LockMap>>,
    task_id: TaskId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl TaskLockGuard {
    /// Returns the locked task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }
}

impl Drop for TaskLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.task_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.task_id);
        }
    }
}
