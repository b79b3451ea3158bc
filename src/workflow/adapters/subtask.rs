//! Subtask creator that stores subtasks through a task repository.

use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;

use crate::workflow::{
    domain::{Task, TaskId},
    ports::{SubtaskCreationError, SubtaskCreator, TaskRepository, TaskRepositoryError},
};

/// Creates review follow-up subtasks as ordinary tasks in the same store.
#[derive(Clone)]
pub struct RepositorySubtaskCreator<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> RepositorySubtaskCreator<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a subtask creator writing to `repository`.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }
}

#[async_trait]
impl<R, C> SubtaskCreator for RepositorySubtaskCreator<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    async fn create(
        &self,
        parent_task_id: TaskId,
        title: &str,
        description: &str,
    ) -> Result<TaskId, SubtaskCreationError> {
        let parent = self
            .repository
            .find_by_id(parent_task_id)
            .await
            .map_err(SubtaskCreationError::backend)?
            .ok_or(SubtaskCreationError::ParentNotFound(parent_task_id))?;

        let subtask = Task::new_subtask(&parent, title, description, &*self.clock);
        self.repository
            .insert_task(&subtask)
            .await
            .map_err(SubtaskCreationError::backend)?;
        Ok(subtask.id())
    }

    async fn discard(&self, subtask_id: TaskId) -> Result<(), SubtaskCreationError> {
        match self.repository.delete_task(subtask_id).await {
            Ok(()) | Err(TaskRepositoryError::NotFound(_)) => Ok(()),
            Err(err) => Err(SubtaskCreationError::backend(err)),
        }
    }
}
