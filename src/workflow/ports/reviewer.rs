//! Port for submitting work to the automated reviewer.
//!
//! Submission only enqueues the review. The verdict arrives later through
//! [`crate::workflow::services::WorkflowEngine::submit_review_verdict`].

use crate::workflow::domain::{ProjectId, ReviewCorrelationId, TaskId};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Review submission payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequest {
    /// Task to review.
    pub task_id: TaskId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Rendered review prompt.
    pub prompt: String,
}

/// Automated reviewer contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewSubmitter: Send + Sync {
    /// Enqueues a review and returns its correlation identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewerError`] when the reviewer cannot accept the request.
    async fn submit(&self, request: ReviewRequest) -> Result<ReviewCorrelationId, ReviewerError>;

    /// Upper bound the engine waits for [`ReviewSubmitter::submit`].
    fn submission_timeout(&self) -> Duration;
}

/// Errors raised while submitting a review.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReviewerError {
    /// The reviewer refused or failed the request.
    #[error("reviewer rejected submission: {0}")]
    Rejected(String),

    /// The reviewer did not answer in time.
    #[error("reviewer did not accept submission within {0:?}")]
    TimedOut(Duration),
}
