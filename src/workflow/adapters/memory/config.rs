//! In-memory workflow configuration repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::workflow::{
    domain::{ProjectId, WorkflowConfig},
    ports::{
        WorkflowConfigRepository, WorkflowConfigRepositoryError, WorkflowConfigRepositoryResult,
    },
};

/// Thread-safe in-memory configuration store.
///
/// Counts loads so callers can observe cache behaviour.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowConfigRepository {
    configs: Arc<RwLock<HashMap<ProjectId, WorkflowConfig>>>,
    loads: Arc<AtomicUsize>,
}

impl InMemoryWorkflowConfigRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many times [`WorkflowConfigRepository::load_config`] ran.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

fn poisoned<E: std::fmt::Display>(err: E) -> WorkflowConfigRepositoryError {
    WorkflowConfigRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl WorkflowConfigRepository for InMemoryWorkflowConfigRepository {
    async fn load_config(
        &self,
        project_id: ProjectId,
    ) -> WorkflowConfigRepositoryResult<Option<WorkflowConfig>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let configs = self.configs.read().map_err(poisoned)?;
        Ok(configs.get(&project_id).cloned())
    }

    async fn save_config(
        &self,
        project_id: ProjectId,
        config: &WorkflowConfig,
    ) -> WorkflowConfigRepositoryResult<()> {
        let mut configs = self.configs.write().map_err(poisoned)?;
        configs.insert(project_id, config.clone());
        Ok(())
    }
}
