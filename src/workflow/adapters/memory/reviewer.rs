//! Recording reviewer used by tests and local runs.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::workflow::{
    domain::ReviewCorrelationId,
    ports::{ReviewRequest, ReviewSubmitter, ReviewerError},
};

const DEFAULT_SUBMISSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Reviewer that records submissions instead of reviewing anything.
///
/// Submissions can be delayed or made to fail to exercise the engine's
/// timeout and rollback paths.
#[derive(Debug, Clone)]
pub struct RecordingReviewSubmitter {
    submissions: Arc<Mutex<Vec<(ReviewCorrelationId, ReviewRequest)>>>,
    timeout: Duration,
    delay: Option<Duration>,
    failure: Option<String>,
}

impl Default for RecordingReviewSubmitter {
    fn default() -> Self {
        Self {
            submissions: Arc::default(),
            timeout: DEFAULT_SUBMISSION_TIMEOUT,
            delay: None,
            failure: None,
        }
    }
}

impl RecordingReviewSubmitter {
    /// Creates a reviewer that accepts every submission.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the submission timeout the reviewer declares.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Delays every submission by `delay`.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Rejects every submission with `message`.
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Returns the recorded submissions in order.
    #[must_use]
    pub fn submissions(&self) -> Vec<(ReviewCorrelationId, ReviewRequest)> {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ReviewSubmitter for RecordingReviewSubmitter {
    async fn submit(&self, request: ReviewRequest) -> Result<ReviewCorrelationId, ReviewerError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(ReviewerError::Rejected(message.clone()));
        }

        let correlation_id = ReviewCorrelationId::new();
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((correlation_id, request));
        Ok(correlation_id)
    }

    fn submission_timeout(&self) -> Duration {
        self.timeout
    }
}
