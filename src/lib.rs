//! Phaseboard: a multi-phase review workflow for project tasks.
//!
//! Tasks move through work, testing, automated review and optional human
//! review. Each project tunes the workflow through a small configuration:
//! whether human review is required, how many automated review rounds a
//! task may fail, whether testing can be skipped, and how reviews start.
//!
//! # Architecture
//!
//! Phaseboard follows hexagonal architecture principles:
//!
//! - **Domain**: Statuses, transition rules, configuration and events
//! - **Ports**: Trait interfaces for storage, reviewers, subtasks and events
//! - **Adapters**: In-memory and `tokio` broadcast implementations
//! - **Services**: The workflow engine and its configuration resolver
//!
//! # Modules
//!
//! - [`workflow`]: Review workflow state machine and orchestration

pub mod workflow;
