//! Adapter implementations for workflow ports.

pub mod broadcast;
pub mod memory;
pub mod subtask;

pub use broadcast::{BroadcastEventBus, PublishedEvent};
pub use subtask::RepositorySubtaskCreator;
