//! # Call Ledger
//!
//! Durable record of every call and its lifecycle state. The ledger is a
//! passive store: only the routing engine writes call status, and a call
//! moves strictly QUEUED → ACTIVE → COMPLETED with COMPLETED terminal.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::Result;
use crate::operator::OperatorId;

pub use memory::InMemoryCallLedger;

/// Call identifier, unique and assigned at creation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub String);

impl CallId {
    pub fn new() -> Self {
        CallId(Uuid::new_v4().to_string())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for CallId {
    fn from(s: String) -> Self {
        CallId(s)
    }
}

impl From<&str> for CallId {
    fn from(s: &str) -> Self {
        CallId(s.to_string())
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CallId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Call lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallStatus {
    /// Waiting in the backlog for an operator
    Queued,

    /// Connected to an operator
    Active,

    /// Finished; terminal state, no further mutation
    Completed,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Queued => "QUEUED",
            CallStatus::Active => "ACTIVE",
            CallStatus::Completed => "COMPLETED",
        }
    }
}

impl std::str::FromStr for CallStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "queued" | "Queued" | "QUEUED" => Ok(CallStatus::Queued),
            "active" | "Active" | "ACTIVE" => Ok(CallStatus::Active),
            "completed" | "Completed" | "COMPLETED" => Ok(CallStatus::Completed),
            _ => Err(format!("Unknown call status: {}", s)),
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single call from arrival to completion
///
/// `operator_id` is present exactly while the call is ACTIVE or COMPLETED; a
/// completed call keeps its final operator for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: CallId,
    /// Opaque caller identifier (phone number or similar)
    pub caller_number: String,
    pub operator_id: Option<OperatorId>,
    pub status: CallStatus,
    /// Arrival time; preserved across promotion so queue wait stays derivable
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<u64>,
    pub notes: Option<String>,
}

/// Contract between the routing engine and call storage
///
/// Implemented in-memory by [`InMemoryCallLedger`] and durably by
/// [`DatabaseManager`](crate::database::DatabaseManager).
#[async_trait]
pub trait CallLedger: Send + Sync {
    /// Insert a new call. Status is ACTIVE when an operator is given, QUEUED
    /// otherwise; `started_at` is taken from the ledger's clock.
    async fn create(&self, caller_number: &str, operator: Option<OperatorId>) -> Result<CallId>;

    /// Complete a call: set COMPLETED, `ended_at`, duration and notes, and
    /// return the operator to release (`None` for a call that was never
    /// assigned). Fails with `NotFound` for an unknown or already-completed
    /// call — completing twice is an error, not a silent repeat.
    async fn complete(
        &self,
        call_id: &CallId,
        duration_seconds: u64,
        notes: &str,
    ) -> Result<Option<OperatorId>>;

    /// Promote a QUEUED call to ACTIVE with the given operator, preserving
    /// the original arrival time. Fails with `NotFound` when the call is not
    /// currently QUEUED.
    async fn promote(&self, call_id: &CallId, operator: &OperatorId) -> Result<()>;

    /// Recent calls, newest `started_at` first. Read-only.
    async fn list_recent(&self, limit: usize) -> Result<Vec<CallRecord>>;

    /// Single-record lookup
    async fn get(&self, call_id: &CallId) -> Result<Option<CallRecord>>;
}
