//! Permission checker backed by a fixed admin list.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::workflow::{
    domain::{ProjectId, UserId},
    ports::{PermissionCheckError, PermissionChecker},
};

/// Permission checker with a fixed set of project administrators.
#[derive(Debug, Clone, Default)]
pub struct StaticPermissionChecker {
    admins: HashSet<(UserId, ProjectId)>,
}

impl StaticPermissionChecker {
    /// Creates a checker with no administrators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants `user_id` administration of `project_id`.
    #[must_use]
    pub fn with_admin(mut self, user_id: UserId, project_id: ProjectId) -> Self {
        self.admins.insert((user_id, project_id));
        self
    }
}

#[async_trait]
impl PermissionChecker for StaticPermissionChecker {
    async fn is_project_admin(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<bool, PermissionCheckError> {
        Ok(self.admins.contains(&(user_id, project_id)))
    }
}
