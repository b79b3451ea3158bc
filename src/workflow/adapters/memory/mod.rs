//! In-memory adapters for tests and single-process deployments.

mod config;
mod event_bus;
mod permission;
mod reviewer;
mod task;

pub use config::InMemoryWorkflowConfigRepository;
pub use event_bus::RecordingEventBus;
pub use permission::StaticPermissionChecker;
pub use reviewer::RecordingReviewSubmitter;
pub use task::InMemoryTaskRepository;
