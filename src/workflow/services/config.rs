//! Effective configuration resolution with an explicit per-project cache.

use crate::workflow::{
    domain::{ProjectId, WorkflowConfig, WorkflowConfigError, WorkflowConfigPatch},
    ports::{WorkflowConfigRepository, WorkflowConfigRepositoryError},
};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Errors returned while resolving or updating configuration.
#[derive(Debug, Error)]
pub enum ConfigResolverError {
    /// The requested configuration is invalid; nothing was persisted.
    #[error(transparent)]
    Validation(#[from] WorkflowConfigError),
    /// The configuration store failed.
    #[error(transparent)]
    Storage(#[from] WorkflowConfigRepositoryError),
}

/// Read-mostly cache of effective configuration keyed by project.
///
/// Every invalidation bumps a generation counter. A resolve that read
/// storage under an older generation does not repopulate the cache, so a
/// value loaded before a write can never outlive that write.
#[derive(Debug, Default)]
pub struct WorkflowConfigCache {
    state: RwLock<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<ProjectId, WorkflowConfig>,
    generation: u64,
}

impl WorkflowConfigCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached configuration for a project.
    #[must_use]
    pub fn get(&self, project_id: ProjectId) -> Option<WorkflowConfig> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.entries.get(&project_id).cloned()
    }

    /// Drops the cached configuration for a project.
    pub fn invalidate(&self, project_id: ProjectId) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.entries.remove(&project_id);
        state.generation = state.generation.wrapping_add(1);
    }

    /// Drops every cached configuration.
    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.entries.clear();
        state.generation = state.generation.wrapping_add(1);
    }

    fn generation(&self) -> u64 {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    fn insert_if_current(&self, project_id: ProjectId, config: WorkflowConfig, generation: u64) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.generation == generation {
            state.entries.insert(project_id, config);
        }
    }
}

/// Resolves effective per-project configuration, applying defaults.
pub struct WorkflowConfigResolver<R>
where
    R: WorkflowConfigRepository,
{
    repository: Arc<R>,
    cache: Arc<WorkflowConfigCache>,
    write_lock: Arc<Mutex<()>>,
}

impl<R> Clone for WorkflowConfigResolver<R>
where
    R: WorkflowConfigRepository,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            cache: Arc::clone(&self.cache),
            write_lock: Arc::clone(&self.write_lock),
        }
    }
}

impl<R> WorkflowConfigResolver<R>
where
    R: WorkflowConfigRepository,
{
    /// Creates a resolver with an empty cache.
    #[must_use]
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_cache(repository, Arc::new(WorkflowConfigCache::new()))
    }

    /// Creates a resolver sharing an existing cache.
    #[must_use]
    pub fn with_cache(repository: Arc<R>, cache: Arc<WorkflowConfigCache>) -> Self {
        Self {
            repository,
            cache,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the cache used by this resolver.
    #[must_use]
    pub const fn cache(&self) -> &Arc<WorkflowConfigCache> {
        &self.cache
    }

    /// Returns the effective configuration for a project.
    ///
    /// A project without stored configuration resolves to
    /// [`WorkflowConfig::default`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigResolverError::Storage`] when the store fails.
    pub async fn resolve(&self, project_id: ProjectId) -> Result<WorkflowConfig, ConfigResolverError> {
        if let Some(config) = self.cache.get(project_id) {
            return Ok(config);
        }

        let generation = self.cache.generation();
        let stored = self.repository.load_config(project_id).await?;
        let uses_defaults = stored.is_none();
        let config = stored.unwrap_or_default();
        self.cache
            .insert_if_current(project_id, config.clone(), generation);
        debug!(%project_id, uses_defaults, "resolved workflow configuration");
        Ok(config)
    }

    /// Merges `patch` over the stored configuration, validates and persists
    /// it, then invalidates the cache entry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigResolverError::Validation`] before touching storage
    /// when the merged configuration is invalid, or
    /// [`ConfigResolverError::Storage`] when the store fails.
    pub async fn validate_and_store(
        &self,
        project_id: ProjectId,
        patch: &WorkflowConfigPatch,
    ) -> Result<WorkflowConfig, ConfigResolverError> {
        let _write = self.write_lock.lock().await;
        let current = self
            .repository
            .load_config(project_id)
            .await?
            .unwrap_or_default();
        let updated = patch.apply_to(&current)?;
        self.repository.save_config(project_id, &updated).await?;
        self.cache.invalidate(project_id);
        info!(
            %project_id,
            enable_human_review = updated.enable_human_review,
            max_review_iterations = updated.max_review_iterations,
            testing_requires_manual_exit = updated.testing_requires_manual_exit,
            auto_start_review = updated.auto_start_review,
            custom_prompt = updated.review_prompt_template.is_some(),
            "workflow configuration updated"
        );
        Ok(updated)
    }

    /// Drops the cached configuration for a project.
    pub fn invalidate(&self, project_id: ProjectId) {
        self.cache.invalidate(project_id);
    }
}
