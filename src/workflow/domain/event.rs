//! Notifications published when workflow state changes.

use super::{
    InvalidTransition, ProjectId, ReviewCorrelationId, ReviewVerdict, TaskId, TaskStatus, UserId,
};
use serde::{Deserialize, Serialize};

/// Event describing a workflow state change or rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// A task moved between statuses.
    StatusChanged {
        /// Task that moved.
        task_id: TaskId,
        /// Owning project.
        project_id: ProjectId,
        /// Previous status.
        from: TaskStatus,
        /// New status.
        to: TaskStatus,
        /// User who asked for the move, when not system-initiated.
        actor: Option<UserId>,
    },
    /// A requested status change was refused.
    TransitionRejected {
        /// Task the change was requested for.
        task_id: TaskId,
        /// Owning project.
        project_id: ProjectId,
        /// Refused transition details.
        rejection: InvalidTransition,
        /// User who asked for the move.
        actor: Option<UserId>,
    },
    /// An automated review was submitted.
    ReviewRequested {
        /// Task under review.
        task_id: TaskId,
        /// Owning project.
        project_id: ProjectId,
        /// Reviewer-issued correlation identifier.
        correlation_id: ReviewCorrelationId,
    },
    /// A review verdict was applied to a task.
    ReviewVerdictApplied {
        /// Reviewed task.
        task_id: TaskId,
        /// Owning project.
        project_id: ProjectId,
        /// Verdict as delivered.
        verdict: ReviewVerdict,
        /// Status after the verdict was applied.
        status: TaskStatus,
        /// Failed review count after the verdict was applied.
        review_iterations: u32,
    },
    /// Automated review cannot proceed without a human.
    InterventionRequired {
        /// Task needing attention.
        task_id: TaskId,
        /// Owning project.
        project_id: ProjectId,
        /// Failed review count.
        review_iterations: u32,
        /// Whether the iteration cap forced the intervention.
        forced_by_iteration_cap: bool,
    },
    /// A task was approved in human review.
    HumanReviewApproved {
        /// Approved task.
        task_id: TaskId,
        /// Owning project.
        project_id: ProjectId,
        /// Approving user.
        actor: UserId,
    },
    /// A task was sent back from human review.
    HumanReviewRejected {
        /// Rejected task.
        task_id: TaskId,
        /// Owning project.
        project_id: ProjectId,
        /// Rejecting user.
        actor: UserId,
        /// Reason given.
        reason: String,
    },
}

impl WorkflowEvent {
    /// Returns the name subscribers filter on.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StatusChanged { .. } => "task.status_changed",
            Self::TransitionRejected { .. } => "task.transition_rejected",
            Self::ReviewRequested { .. } => "task.review_requested",
            Self::ReviewVerdictApplied { .. } => "task.review_verdict_applied",
            Self::InterventionRequired { .. } => "task.intervention_required",
            Self::HumanReviewApproved { .. } => "task.human_review_approved",
            Self::HumanReviewRejected { .. } => "task.human_review_rejected",
        }
    }

    /// Returns the task the event concerns.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        match self {
            Self::StatusChanged { task_id, .. }
            | Self::TransitionRejected { task_id, .. }
            | Self::ReviewRequested { task_id, .. }
            | Self::ReviewVerdictApplied { task_id, .. }
            | Self::InterventionRequired { task_id, .. }
            | Self::HumanReviewApproved { task_id, .. }
            | Self::HumanReviewRejected { task_id, .. } => *task_id,
        }
    }
}
