//! Port for publishing workflow notifications.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Notification transport contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes an event payload under `event_name`.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError`] when delivery fails.
    async fn publish(&self, event_name: &str, payload: &Value) -> Result<(), EventBusError>;
}

/// Errors raised while publishing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EventBusError {
    /// Nobody is listening.
    #[error("no subscribers for {0}")]
    NoSubscribers(String),

    /// Transport failure.
    #[error("event delivery failed: {0}")]
    Delivery(String),
}
