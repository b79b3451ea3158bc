//! Multi-phase review workflow for tasks.
//!
//! A task moves from Todo through InProgress and Testing into automated
//! review, optionally through human review, and ends Done or Cancelled. Which
//! edges are open depends on the owning project's configuration. The module
//! follows hexagonal architecture:
//!
//! - Domain types and the transition table in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - The workflow engine and its helpers in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
