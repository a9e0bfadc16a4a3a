//! # Callgrid Call Engine
//!
//! Call routing and operator assignment for a call center: decide, per
//! incoming call, whether an operator is immediately available, atomically
//! reserve that operator, or enqueue the call for later dispatch — and
//! reconcile availability when calls end.
//!
//! ## Architecture
//!
//! ```text
//!                    ┌──────────────────┐
//!   initiate / end   │ CallCenterEngine │   list
//!  ─────────────────▶│  (orchestrator)  │◀──────────
//!                    └────────┬─────────┘
//!          ┌─────────────────┼──────────────────┐
//!          │                 │                  │
//! ┌─────────────────┐ ┌─────────────┐ ┌─────────────────┐
//! │ OperatorRegistry│ │ QueueManager│ │   CallLedger    │
//! │ (availability + │ │ (FIFO       │ │ (call records,  │
//! │  atomic reserve)│ │  backlog)   │ │  lifecycle)     │
//! └─────────────────┘ └─────────────┘ └─────────────────┘
//! ```
//!
//! The registry's `reserve` is an atomic ONLINE→BUSY compare-and-set — the
//! single primitive that prevents two calls from landing on one operator, no
//! matter how many initiations and completions race. Calls that find no
//! operator wait in a strict-FIFO backlog and are drained, oldest first,
//! every time a completion frees an operator.
//!
//! ## Quick start
//!
//! ```
//! use callgrid_call_engine::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let engine = CallCenterEngine::new(CallCenterConfig::default())?;
//!
//! // Operators are registered by the administrative layer and sign in
//! // through presence updates.
//! let op = OperatorId::from("op-001");
//! engine.add_operator(&op).await?;
//! engine.set_operator_presence(&op, true).await?;
//!
//! // Route an incoming call.
//! let disposition = engine.initiate_call("+15550100").await?;
//! assert!(disposition.assigned);
//!
//! // A second call queues: the only operator is busy.
//! let waiting = engine.initiate_call("+15550101").await?;
//! assert!(!waiting.assigned);
//!
//! // Ending the first call releases op-001 and immediately dispatches the
//! // waiting call to it.
//! engine.end_call(&disposition.call_id, 30, "resolved").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Key modules
//!
//! - [`orchestrator`]: the routing engine and drain loop
//! - [`operator`]: operator identity, availability and the registry contract
//! - [`ledger`]: call records and lifecycle transitions
//! - [`queue`]: the FIFO backlog
//! - [`database`]: sqlx/SQLite-backed durable store
//! - [`config`]: configuration and validation
//! - [`error`]: error taxonomy and result alias
//!
//! Transport, authentication and user administration are collaborators of
//! this crate, not part of it: the engine exposes `initiate_call`,
//! `end_call` and `list_calls` and consumes stores through the
//! [`OperatorRegistry`](operator::OperatorRegistry) and
//! [`CallLedger`](ledger::CallLedger) traits.

pub mod clock;
pub mod config;
pub mod error;

pub mod ledger;
pub mod operator;
pub mod orchestrator;
pub mod queue;

pub mod database;

pub use config::CallCenterConfig;
pub use error::{CallCenterError, Result};
pub use orchestrator::CallCenterEngine;

/// Commonly used types for call routing applications
///
/// ```
/// use callgrid_call_engine::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{CallCenterConfig, CallCenterEngine, CallCenterError, Result};

    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::{
        DatabaseConfig, GeneralConfig, QueueConfig, RoutingConfig, SelectionStrategy,
    };
    pub use crate::database::DatabaseManager;
    pub use crate::ledger::{CallId, CallLedger, CallRecord, CallStatus, InMemoryCallLedger};
    pub use crate::operator::{
        Availability, InMemoryOperatorRegistry, OperatorId, OperatorRegistry, RegistryStats,
    };
    pub use crate::orchestrator::{CallDisposition, OrchestratorStats, RoutingStats};
    pub use crate::queue::QueueManager;

    pub use chrono::{DateTime, Utc};
    pub use uuid::Uuid;
}
