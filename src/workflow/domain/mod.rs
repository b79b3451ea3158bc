//! Domain model for the review workflow.
//!
//! The domain covers task status, per-project configuration, the transition
//! table, review iteration counting and the events emitted on change. It has
//! no knowledge of storage, reviewers or transports.

mod config;
mod error;
mod event;
mod ids;
mod iteration;
mod status;
mod task;
mod transition;
mod verdict;

pub use config::{MAX_REVIEW_PROMPT_TEMPLATE_CHARS, WorkflowConfig, WorkflowConfigPatch};
pub use error::{InvalidTransition, ParseTaskStatusError, WorkflowConfigError};
pub use event::WorkflowEvent;
pub use ids::{ProjectId, ReviewCorrelationId, TaskId, UserId};
pub use iteration::IterationTracker;
pub use status::TaskStatus;
pub use task::{PersistedTaskData, Task};
pub use transition::{TransitionFlags, TransitionRejection, requires_status, validate_transition};
pub use verdict::{HumanReviewDecision, ReviewFeedback, ReviewVerdict};
