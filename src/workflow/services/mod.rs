//! Application services for the review workflow.

mod admin;
mod config;
mod engine;
mod events;
mod locks;

pub use admin::{AdminGateError, ProjectAdminGate};
pub use config::{ConfigResolverError, WorkflowConfigCache, WorkflowConfigResolver};
pub use engine::{
    DEFAULT_REVIEW_PROMPT, WorkflowEngine, WorkflowEngineSettings, WorkflowError, WorkflowResult,
};
pub use events::{DEFAULT_EVENT_PUBLISH_TIMEOUT, WorkflowEventEmitter};
pub use locks::{TaskLockGuard, TaskLockRegistry};
