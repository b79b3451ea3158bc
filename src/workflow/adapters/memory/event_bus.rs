//! Event bus that keeps published events in memory.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};

use crate::workflow::ports::{EventBus, EventBusError};

/// Event bus that records every published event.
#[derive(Debug, Clone, Default)]
pub struct RecordingEventBus {
    published: Arc<Mutex<Vec<(String, Value)>>>,
}

impl RecordingEventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every published `(name, payload)` pair in order.
    #[must_use]
    pub fn published(&self) -> Vec<(String, Value)> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the names of published events in order.
    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        self.published()
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }
}

#[async_trait]
impl EventBus for RecordingEventBus {
    async fn publish(&self, event_name: &str, payload: &Value) -> Result<(), EventBusError> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((event_name.to_owned(), payload.clone()));
        Ok(())
    }
}
