//! Port for creating follow-up subtasks from review issues.

use crate::workflow::domain::TaskId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Subtask creation contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubtaskCreator: Send + Sync {
    /// Creates a subtask under `parent_task_id` and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SubtaskCreationError`] when the subtask cannot be stored.
    async fn create(
        &self,
        parent_task_id: TaskId,
        title: &str,
        description: &str,
    ) -> Result<TaskId, SubtaskCreationError>;

    /// Removes a subtask created by [`Self::create`] whose verdict could not
    /// be applied. Discarding a subtask that no longer exists succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`SubtaskCreationError::Backend`] when the backend fails.
    async fn discard(&self, subtask_id: TaskId) -> Result<(), SubtaskCreationError>;
}

/// Errors raised while creating subtasks.
#[derive(Debug, Clone, Error)]
pub enum SubtaskCreationError {
    /// The parent task does not exist.
    #[error("parent task not found: {0}")]
    ParentNotFound(TaskId),

    /// Backend failure.
    #[error("subtask creation failed: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl SubtaskCreationError {
    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}
