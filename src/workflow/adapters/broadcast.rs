//! Event bus fanning events out over a `tokio` broadcast channel.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::workflow::ports::{EventBus, EventBusError};

/// Published event as seen by broadcast subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEvent {
    /// Event name.
    pub name: String,
    /// JSON payload.
    pub payload: Value,
}

/// Event bus delivering to in-process subscribers.
///
/// Publishing with no live subscriber fails with
/// [`EventBusError::NoSubscribers`].
#[derive(Debug, Clone)]
pub struct BroadcastEventBus {
    sender: broadcast::Sender<PublishedEvent>,
}

impl BroadcastEventBus {
    /// Creates a bus buffering up to `capacity` events per slow subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl EventBus for BroadcastEventBus {
    async fn publish(&self, event_name: &str, payload: &Value) -> Result<(), EventBusError> {
        let event = PublishedEvent {
            name: event_name.to_owned(),
            payload: payload.clone(),
        };
        self.sender
            .send(event)
            .map(|_| ())
            .map_err(|_| EventBusError::NoSubscribers(event_name.to_owned()))
    }
}
