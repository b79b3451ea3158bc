//! Transition validation for the review workflow.
//!
//! The table is a fixed set of edges plus edges gated on project
//! configuration. Every status pair is matched explicitly so adding a status
//! fails to compile until the table accounts for it.

use super::{InvalidTransition, TaskStatus, WorkflowConfig};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration flags consulted while validating a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionFlags {
    /// Value of [`WorkflowConfig::enable_human_review`].
    pub enable_human_review: bool,
    /// Value of [`WorkflowConfig::testing_requires_manual_exit`].
    pub testing_requires_manual_exit: bool,
}

impl From<&WorkflowConfig> for TransitionFlags {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            enable_human_review: config.enable_human_review,
            testing_requires_manual_exit: config.testing_requires_manual_exit,
        }
    }
}

/// Reason a transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionRejection {
    /// Source and target are the same status.
    SameStatus,
    /// The task is already finished.
    TerminalStatus,
    /// Human review is disabled for the project.
    HumanReviewDisabled,
    /// Human review is enabled, so automated review cannot finish the task.
    HumanReviewRequired,
    /// The project requires tasks to pass through Testing first.
    TestingRequiresManualExit,
    /// The operation may only be invoked from one specific status.
    RequiresStatus {
        /// Status the task must be in.
        required: TaskStatus,
    },
    /// The workflow has no such edge.
    NotPermitted,
}

impl fmt::Display for TransitionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameStatus => f.write_str("task is already in that status"),
            Self::TerminalStatus => f.write_str("finished tasks cannot change status"),
            Self::HumanReviewDisabled => {
                f.write_str("human review is not enabled for this project")
            }
            Self::HumanReviewRequired => {
                f.write_str("human review is enabled, so the task must be approved before done")
            }
            Self::TestingRequiresManualExit => f.write_str(
                "this project requires tasks to go through testing before automated review",
            ),
            Self::RequiresStatus { required } => {
                write!(f, "this action is only available while the task is {required}")
            }
            Self::NotPermitted => f.write_str("the workflow has no such transition"),
        }
    }
}

/// Decides whether moving from `current` to `target` is legal.
///
/// # Errors
///
/// Returns [`InvalidTransition`] naming the pair, the flags consulted and
/// the reason whenever the edge is absent or gated off.
pub fn validate_transition(
    current: TaskStatus,
    target: TaskStatus,
    config: &WorkflowConfig,
) -> Result<(), InvalidTransition> {
    match rejection_for(current, target, config) {
        None => Ok(()),
        Some(reason) => Err(InvalidTransition {
            from: current,
            to: target,
            flags: TransitionFlags::from(config),
            reason,
        }),
    }
}

/// Builds the error returned when an operation is invoked from the wrong
/// status.
#[must_use]
pub fn requires_status(
    current: TaskStatus,
    target: TaskStatus,
    required: TaskStatus,
    config: &WorkflowConfig,
) -> InvalidTransition {
    let reason = if current.is_terminal() {
        TransitionRejection::TerminalStatus
    } else {
        TransitionRejection::RequiresStatus { required }
    };
    InvalidTransition {
        from: current,
        to: target,
        flags: TransitionFlags::from(config),
        reason,
    }
}

fn rejection_for(
    current: TaskStatus,
    target: TaskStatus,
    config: &WorkflowConfig,
) -> Option<TransitionRejection> {
    use TaskStatus::{Cancelled, Done, HumanReview, InProgress, InReview, Testing, Todo};

    if current.is_terminal() {
        return Some(TransitionRejection::TerminalStatus);
    }
    if current == target {
        return Some(TransitionRejection::SameStatus);
    }

    let not_permitted = Some(TransitionRejection::NotPermitted);
    match current {
        Done | Cancelled => Some(TransitionRejection::TerminalStatus),
        Todo => match target {
            InProgress | Cancelled => None,
            Todo | Testing | InReview | HumanReview | Done => not_permitted,
        },
        InProgress => match target {
            Testing | Cancelled => None,
            InReview => config
                .testing_requires_manual_exit
                .then_some(TransitionRejection::TestingRequiresManualExit),
            Todo | InProgress | HumanReview | Done => not_permitted,
        },
        Testing => match target {
            InReview | Done | Cancelled => None,
            Todo | InProgress | Testing | HumanReview => not_permitted,
        },
        InReview => match target {
            HumanReview => (!config.enable_human_review)
                .then_some(TransitionRejection::HumanReviewDisabled),
            Done => config
                .enable_human_review
                .then_some(TransitionRejection::HumanReviewRequired),
            InProgress | Cancelled => None,
            Todo | Testing | InReview => not_permitted,
        },
        HumanReview => match target {
            Done | InProgress | Cancelled => None,
            Todo | Testing | InReview | HumanReview => not_permitted,
        },
    }
}
