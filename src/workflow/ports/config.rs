//! Repository port for per-project workflow configuration.

use crate::workflow::domain::{ProjectId, WorkflowConfig};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for configuration repository operations.
pub type WorkflowConfigRepositoryResult<T> = Result<T, WorkflowConfigRepositoryError>;

/// Workflow configuration persistence contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkflowConfigRepository: Send + Sync {
    /// Loads the stored configuration for a project.
    ///
    /// Returns `None` when the project has never been configured.
    async fn load_config(
        &self,
        project_id: ProjectId,
    ) -> WorkflowConfigRepositoryResult<Option<WorkflowConfig>>;

    /// Replaces the stored configuration for a project.
    async fn save_config(
        &self,
        project_id: ProjectId,
        config: &WorkflowConfig,
    ) -> WorkflowConfigRepositoryResult<()>;
}

/// Errors returned by configuration repository implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkflowConfigRepositoryError {
    /// Persistence-layer failure.
    #[error("configuration persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkflowConfigRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
