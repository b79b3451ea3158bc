//! Project administration guard for callers wrapping the workflow engine.

use crate::workflow::{
    domain::{ProjectId, UserId},
    ports::{PermissionCheckError, PermissionChecker},
};
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by [`ProjectAdminGate`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdminGateError {
    /// The user does not administer the project.
    #[error("user {user_id} is not an administrator of project {project_id}")]
    NotProjectAdmin {
        /// Requesting user.
        user_id: UserId,
        /// Target project.
        project_id: ProjectId,
    },
    /// The permission lookup failed.
    #[error(transparent)]
    Lookup(#[from] PermissionCheckError),
}

/// Checks project administration before configuration changes.
///
/// The engine itself never consults permissions; API layers call this
/// before [`super::WorkflowEngine::update_config`].
pub struct ProjectAdminGate<P>
where
    P: PermissionChecker,
{
    checker: Arc<P>,
}

impl<P> ProjectAdminGate<P>
where
    P: PermissionChecker,
{
    /// Creates a gate backed by `checker`.
    #[must_use]
    pub const fn new(checker: Arc<P>) -> Self {
        Self { checker }
    }

    /// Succeeds only when `user_id` administers `project_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminGateError::NotProjectAdmin`] when the user lacks the
    /// role and [`AdminGateError::Lookup`] when the check fails.
    pub async fn ensure_admin(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<(), AdminGateError> {
        if self.checker.is_project_admin(user_id, project_id).await? {
            Ok(())
        } else {
            Err(AdminGateError::NotProjectAdmin {
                user_id,
                project_id,
            })
        }
    }
}
