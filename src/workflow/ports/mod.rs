//! Port contracts for the review workflow.
//!
//! Ports define infrastructure-agnostic interfaces used by workflow
//! services: storage, the automated reviewer, subtask creation, event
//! delivery and permission lookup.

pub mod config;
pub mod event_bus;
pub mod permission;
pub mod repository;
pub mod reviewer;
pub mod subtask;

pub use config::{
    WorkflowConfigRepository, WorkflowConfigRepositoryError, WorkflowConfigRepositoryResult,
};
pub use event_bus::{EventBus, EventBusError};
pub use permission::{PermissionCheckError, PermissionChecker};
pub use repository::{TaskRepository, TaskRepositoryError, TaskRepositoryResult};
pub use reviewer::{ReviewRequest, ReviewSubmitter, ReviewerError};
pub use subtask::{SubtaskCreationError, SubtaskCreator};

#[cfg(test)]
pub use config::MockWorkflowConfigRepository;
#[cfg(test)]
pub use event_bus::MockEventBus;
#[cfg(test)]
pub use repository::MockTaskRepository;
#[cfg(test)]
pub use reviewer::MockReviewSubmitter;
#[cfg(test)]
pub use subtask::MockSubtaskCreator;
