//! Task aggregate root tracked by the review workflow.

use super::{
    HumanReviewDecision, InvalidTransition, IterationTracker, ProjectId, ReviewFeedback,
    TaskId, TaskStatus, WorkflowConfig, requires_status, validate_transition,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Task aggregate root.
///
/// Status, the Testing timestamp and the review iteration count change only
/// through the methods below, which the workflow engine drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    project_id: ProjectId,
    parent_id: Option<TaskId>,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    testing_entered_at: Option<DateTime<Utc>>,
    review_iterations: u32,
    review_feedback: Option<ReviewFeedback>,
    human_review: Option<HumanReviewDecision>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Parent task for review-generated subtasks.
    pub parent_id: Option<TaskId>,
    /// Task title.
    pub title: String,
    /// Task description, if any.
    pub description: Option<String>,
    /// Persisted workflow status.
    pub status: TaskStatus,
    /// Start of the current or most recent stay in Testing.
    pub testing_entered_at: Option<DateTime<Utc>>,
    /// Number of failed automated reviews.
    pub review_iterations: u32,
    /// Last applied review verdict.
    pub review_feedback: Option<ReviewFeedback>,
    /// Last human review decision.
    pub human_review: Option<HumanReviewDecision>,
    /// Storage version.
    pub version: u64,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new task in [`TaskStatus::Todo`].
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        title: impl Into<String>,
        description: Option<String>,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            project_id,
            parent_id: None,
            title: title.into(),
            description,
            status: TaskStatus::Todo,
            testing_entered_at: None,
            review_iterations: 0,
            review_feedback: None,
            human_review: None,
            version: 0,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Creates a follow-up task under `parent` in the parent's project.
    #[must_use]
    pub fn new_subtask(
        parent: &Self,
        title: impl Into<String>,
        description: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        let mut subtask = Self::new(
            parent.project_id,
            title,
            Some(description.into()),
            clock,
        );
        subtask.parent_id = Some(parent.id);
        subtask
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            parent_id: data.parent_id,
            title: data.title,
            description: data.description,
            status: data.status,
            testing_entered_at: data.testing_entered_at,
            review_iterations: data.review_iterations,
            review_feedback: data.review_feedback,
            human_review: data.human_review,
            version: data.version,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the parent task for review-generated subtasks.
    #[must_use]
    pub const fn parent_id(&self) -> Option<TaskId> {
        self.parent_id
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the task description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the workflow status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns when the task last entered Testing.
    #[must_use]
    pub const fn testing_entered_at(&self) -> Option<DateTime<Utc>> {
        self.testing_entered_at
    }

    /// Returns the number of failed automated reviews.
    #[must_use]
    pub const fn review_iterations(&self) -> u32 {
        self.review_iterations
    }

    /// Returns the last applied review verdict.
    #[must_use]
    pub const fn review_feedback(&self) -> Option<&ReviewFeedback> {
        self.review_feedback.as_ref()
    }

    /// Returns the last human review decision.
    #[must_use]
    pub const fn human_review(&self) -> Option<&HumanReviewDecision> {
        self.human_review.as_ref()
    }

    /// Returns the storage version.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the task with its storage version replaced.
    ///
    /// Storage adapters call this after a successful write.
    #[must_use]
    pub const fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Moves the task to `target` after validating the edge against `config`.
    ///
    /// Entering Testing stamps `testing_entered_at` with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] and leaves the task untouched when the
    /// edge is not permitted.
    pub fn transition_to(
        &mut self,
        target: TaskStatus,
        config: &WorkflowConfig,
        clock: &impl Clock,
    ) -> Result<(), InvalidTransition> {
        validate_transition(self.status, target, config)?;
        let now = clock.utc();
        if target == TaskStatus::Testing {
            self.testing_entered_at = Some(now);
        }
        self.status = target;
        self.updated_at = now;
        Ok(())
    }

    /// Checks that the task is in `required` before an operation that moves
    /// it to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] when the task is in any other status.
    pub fn ensure_status(
        &self,
        required: TaskStatus,
        target: TaskStatus,
        config: &WorkflowConfig,
    ) -> Result<(), InvalidTransition> {
        if self.status == required {
            return Ok(());
        }
        Err(requires_status(self.status, target, required, config))
    }

    /// Counts one more failed automated review and returns the new count.
    pub const fn register_failed_review(&mut self) -> u32 {
        self.review_iterations = IterationTracker::increment(self.review_iterations);
        self.review_iterations
    }

    /// Records the last applied review verdict.
    pub fn record_review_feedback(&mut self, feedback: ReviewFeedback) {
        self.updated_at = feedback.received_at;
        self.review_feedback = Some(feedback);
    }

    /// Records a human review decision.
    pub fn record_human_review(&mut self, decision: HumanReviewDecision, clock: &impl Clock) {
        self.human_review = Some(decision);
        self.updated_at = clock.utc();
    }
}
