//! Automated review verdicts and human review decisions.

use super::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome reported by the automated reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReviewVerdict {
    /// The work is acceptable.
    Pass,
    /// The work needs revisions; each issue becomes a subtask.
    Fail {
        /// Issues found, in reviewer order.
        issues: Vec<String>,
    },
    /// The reviewer cannot decide and a human must step in.
    NeedsIntervention,
}

impl ReviewVerdict {
    /// Returns a short label for logs and events.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail { .. } => "fail",
            Self::NeedsIntervention => "needs_intervention",
        }
    }
}

/// Record of the last verdict applied to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewFeedback {
    /// Verdict as delivered by the reviewer.
    pub verdict: ReviewVerdict,
    /// Review iteration count after the verdict was applied.
    pub iteration: u32,
    /// Whether the iteration cap turned a failure into an intervention.
    pub forced_intervention: bool,
    /// When the verdict was applied.
    pub received_at: DateTime<Utc>,
}

impl ReviewFeedback {
    /// Returns `true` when the task is waiting for manual intervention.
    #[must_use]
    pub const fn requires_intervention(&self) -> bool {
        self.forced_intervention || matches!(self.verdict, ReviewVerdict::NeedsIntervention)
    }
}

/// Last decision taken in the human review phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum HumanReviewDecision {
    /// The reviewer approved the task.
    Approved {
        /// Approving user.
        by: UserId,
        /// Approval time.
        at: DateTime<Utc>,
    },
    /// The reviewer sent the task back for more work.
    Rejected {
        /// Rejecting user.
        by: UserId,
        /// Rejection time.
        at: DateTime<Utc>,
        /// Reason given to the implementer.
        reason: String,
    },
}
