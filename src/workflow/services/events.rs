//! Best-effort delivery of workflow events.

use crate::workflow::{
    domain::{TaskId, WorkflowEvent},
    ports::EventBus,
};
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Upper bound on a single `EventBus::publish` call.
pub const DEFAULT_EVENT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

enum Delivery {
    Publish {
        name: &'static str,
        task_id: TaskId,
        payload: Value,
    },
    Flush(oneshot::Sender<()>),
}

/// Publishes workflow events, logging and swallowing delivery failures.
///
/// `emit` only enqueues. A background task started on first use publishes
/// in emission order, bounding each publish by a timeout, so a slow bus
/// never holds up the operation that produced the event.
pub struct WorkflowEventEmitter<B>
where
    B: EventBus + 'static,
{
    bus: Arc<B>,
    publish_timeout: Duration,
    queue: Arc<OnceLock<mpsc::UnboundedSender<Delivery>>>,
}

impl<B> Clone for WorkflowEventEmitter<B>
where
    B: EventBus + 'static,
{
    fn clone(&self) -> Self {
        Self {
            bus: Arc::clone(&self.bus),
            publish_timeout: self.publish_timeout,
            queue: Arc::clone(&self.queue),
        }
    }
}

impl<B> WorkflowEventEmitter<B>
where
    B: EventBus + 'static,
{
    /// Creates an emitter publishing to `bus`.
    #[must_use]
    pub fn new(bus: Arc<B>) -> Self {
        Self {
            bus,
            publish_timeout: DEFAULT_EVENT_PUBLISH_TIMEOUT,
            queue: Arc::default(),
        }
    }

    /// Returns an emitter with its own queue and the given publish timeout.
    #[must_use]
    pub fn with_publish_timeout(self, publish_timeout: Duration) -> Self {
        Self {
            bus: self.bus,
            publish_timeout,
            queue: Arc::default(),
        }
    }

    /// Queues `event` for publication. Never fails and never waits on the
    /// bus.
    pub fn emit(&self, event: &WorkflowEvent) {
        let name = event.name();
        let task_id = event.task_id();
        let payload = match serde_json::to_value(event) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(event = name, %task_id, error = %err, "failed to serialise workflow event");
                return;
            }
        };

        let delivery = Delivery::Publish {
            name,
            task_id,
            payload,
        };
        if self.sender().send(delivery).is_err() {
            warn!(event = name, %task_id, "workflow event queue closed");
        }
    }

    /// Waits until every event emitted so far has been handed to the bus or
    /// given up on.
    pub async fn flush(&self) {
        let Some(sender) = self.queue.get() else {
            return;
        };
        let (done, finished) = oneshot::channel();
        if sender.send(Delivery::Flush(done)).is_err() {
            return;
        }
        if finished.await.is_err() {
            debug!("workflow event queue stopped before flushing");
        }
    }

    fn sender(&self) -> &mpsc::UnboundedSender<Delivery> {
        self.queue.get_or_init(|| {
            let (sender, receiver) = mpsc::unbounded_channel();
            tokio::spawn(deliver(Arc::clone(&self.bus), receiver, self.publish_timeout));
            sender
        })
    }
}

async fn deliver<B>(
    bus: Arc<B>,
    mut receiver: mpsc::UnboundedReceiver<Delivery>,
    publish_timeout: Duration,
) where
    B: EventBus,
{
    while let Some(delivery) = receiver.recv().await {
        match delivery {
            Delivery::Publish {
                name,
                task_id,
                payload,
            } => match tokio::time::timeout(publish_timeout, bus.publish(name, &payload)).await {
                Ok(Ok(())) => debug!(event = name, %task_id, "workflow event published"),
                Ok(Err(err)) => {
                    warn!(event = name, %task_id, error = %err, "workflow event delivery failed");
                }
                Err(_) => warn!(
                    event = name,
                    %task_id,
                    timeout = ?publish_timeout,
                    "workflow event delivery timed out"
                ),
            },
            Delivery::Flush(done) => {
                if done.send(()).is_err() {
                    debug!("flush waiter went away");
                }
            }
        }
    }
}
