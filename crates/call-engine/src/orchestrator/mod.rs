//! # Routing Orchestration
//!
//! The assignment algorithm: match incoming demand to available supply,
//! enforce at-most-one-call-per-operator, and re-dispatch the backlog when
//! operators free up.
//!
//! - [`core`]: engine construction, configuration and statistics
//! - [`calls`]: `initiate_call` / `end_call` / `list_calls` and the drain loop
//! - [`types`]: dispositions and statistics snapshots

pub mod calls;
pub mod core;
pub mod types;

pub use core::CallCenterEngine;
pub use types::{CallDisposition, OrchestratorStats, RoutingStats};
