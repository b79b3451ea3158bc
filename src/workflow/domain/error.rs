//! Error types for workflow domain validation and parsing.

use super::{TaskStatus, TransitionFlags, TransitionRejection};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A status change that is not permitted under the resolved configuration.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("cannot move task from {from} to {to}: {reason}")]
pub struct InvalidTransition {
    /// Status the task was in.
    pub from: TaskStatus,
    /// Status that was requested.
    pub to: TaskStatus,
    /// Configuration flags consulted while validating.
    pub flags: TransitionFlags,
    /// Why the change was refused.
    pub reason: TransitionRejection,
}

/// Errors returned while validating a workflow configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowConfigError {
    /// The review iteration cap must allow at least one review.
    #[error("max_review_iterations must be at least 1")]
    ZeroReviewIterations,

    /// The review prompt template exceeds the character limit.
    #[error("review prompt template is {actual} characters, limit is {limit}")]
    PromptTemplateTooLong {
        /// Template length in characters.
        actual: usize,
        /// Maximum permitted length in characters.
        limit: usize,
    },

    /// The review prompt template does not parse.
    #[error("review prompt template is invalid: {0}")]
    InvalidPromptTemplate(String),
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
