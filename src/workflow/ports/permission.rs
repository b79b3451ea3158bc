//! Port for project permission checks made by the surrounding API layer.

use crate::workflow::domain::{ProjectId, UserId};
use async_trait::async_trait;
use thiserror::Error;

/// Permission lookup contract.
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    /// Returns whether `user_id` administers `project_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionCheckError`] when the lookup itself fails.
    async fn is_project_admin(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<bool, PermissionCheckError>;
}

/// Errors raised while checking permissions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("permission lookup failed: {0}")]
pub struct PermissionCheckError(pub String);
