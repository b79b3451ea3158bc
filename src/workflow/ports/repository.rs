//! Repository port for task persistence with optimistic versioning.

use crate::workflow::domain::{Task, TaskId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn insert_task(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Persists `task` if the stored version still equals
    /// `expected_version`, returning the stored copy with its new version.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::ConcurrentModification`] when another
    /// writer got there first and [`TaskRepositoryError::NotFound`] when the
    /// task does not exist.
    async fn save_task(&self, task: &Task, expected_version: u64) -> TaskRepositoryResult<Task>;

    /// Returns the subtasks created under `parent_id`.
    async fn find_by_parent(&self, parent_id: TaskId) -> TaskRepositoryResult<Vec<Task>>;

    /// Deletes a task and unlinks it from its parent.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not
    /// exist.
    async fn delete_task(&self, id: TaskId) -> TaskRepositoryResult<()>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The stored version moved on since the task was read.
    #[error("task {task_id} was modified concurrently (expected version {expected}, found {actual})")]
    ConcurrentModification {
        /// Contended task.
        task_id: TaskId,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
