//! Shared orchestrator data structures.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::ledger::CallId;
use crate::operator::{OperatorId, RegistryStats};

/// Outcome of `initiate_call`
///
/// `assigned` is `true` when an operator was reserved and the call went
/// ACTIVE immediately; otherwise the call is waiting in the backlog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallDisposition {
    pub call_id: CallId,
    pub operator_id: Option<OperatorId>,
    pub assigned: bool,
}

impl CallDisposition {
    pub(crate) fn assigned(call_id: CallId, operator_id: OperatorId) -> Self {
        Self {
            call_id,
            operator_id: Some(operator_id),
            assigned: true,
        }
    }

    pub(crate) fn queued(call_id: CallId) -> Self {
        Self {
            call_id,
            operator_id: None,
            assigned: false,
        }
    }
}

/// Monotonic routing counters, updated lock-free by the engine
#[derive(Debug, Default)]
pub(crate) struct RoutingCounters {
    pub calls_routed_directly: AtomicU64,
    pub calls_queued: AtomicU64,
    pub calls_dispatched_from_queue: AtomicU64,
    pub calls_completed: AtomicU64,
}

impl RoutingCounters {
    pub fn snapshot(&self) -> RoutingStats {
        RoutingStats {
            calls_routed_directly: self.calls_routed_directly.load(Ordering::Relaxed),
            calls_queued: self.calls_queued.load(Ordering::Relaxed),
            calls_dispatched_from_queue: self.calls_dispatched_from_queue.load(Ordering::Relaxed),
            calls_completed: self.calls_completed.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of routing performance since startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingStats {
    /// Calls assigned to an operator at initiation
    pub calls_routed_directly: u64,
    /// Calls that entered the backlog
    pub calls_queued: u64,
    /// Queued calls later promoted by a drain
    pub calls_dispatched_from_queue: u64,
    /// Calls that reached COMPLETED
    pub calls_completed: u64,
}

/// Point-in-time view of the whole engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorStats {
    /// Calls currently waiting in the backlog
    pub queued_calls: usize,
    pub routing: RoutingStats,
    pub operators: RegistryStats,
}
