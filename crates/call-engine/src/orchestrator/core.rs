//! # Call Center Engine
//!
//! Central coordinator tying the operator registry, call ledger and backlog
//! together. Construction wires the stores; the routing operations themselves
//! live in [`calls`](super::calls).

use std::sync::Arc;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::CallCenterConfig;
use crate::database::DatabaseManager;
use crate::error::Result;
use crate::ledger::{CallLedger, InMemoryCallLedger};
use crate::operator::{InMemoryOperatorRegistry, OperatorId, OperatorRegistry};
use crate::orchestrator::types::{OrchestratorStats, RoutingCounters};
use crate::queue::QueueManager;

/// The routing engine
///
/// All methods take `&self` and are safe to call from any number of
/// concurrent tasks; the registry's atomic `reserve` and the mutex-guarded
/// backlog carry the synchronization.
pub struct CallCenterEngine {
    pub(crate) config: CallCenterConfig,
    pub(crate) registry: Arc<dyn OperatorRegistry>,
    pub(crate) ledger: Arc<dyn CallLedger>,
    pub(crate) queue: QueueManager,
    pub(crate) counters: RoutingCounters,
}

impl CallCenterEngine {
    /// Create an engine with in-memory stores and the system clock.
    pub fn new(config: CallCenterConfig) -> Result<Arc<Self>> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an engine with in-memory stores and an injected clock.
    pub fn with_clock(config: CallCenterConfig, clock: Arc<dyn Clock>) -> Result<Arc<Self>> {
        config.validate()?;
        let registry = Arc::new(InMemoryOperatorRegistry::new(config.routing.selection));
        let ledger = Arc::new(InMemoryCallLedger::new(clock));
        Self::with_stores(config, registry, ledger)
    }

    /// Create an engine backed by the SQLite database named in
    /// `config.database.url`; the same store serves as registry and ledger.
    pub async fn with_database(config: CallCenterConfig) -> Result<Arc<Self>> {
        config.validate()?;
        let db = Arc::new(
            DatabaseManager::new(&config.database.url, Arc::new(SystemClock)).await?,
        );
        Self::with_stores(config, db.clone(), db)
    }

    /// Create an engine over caller-provided stores.
    pub fn with_stores(
        config: CallCenterConfig,
        registry: Arc<dyn OperatorRegistry>,
        ledger: Arc<dyn CallLedger>,
    ) -> Result<Arc<Self>> {
        config.validate()?;
        let queue = QueueManager::new(config.queues.max_queue_size);
        info!(
            "Call center engine created (selection: {:?}, backlog capacity: {})",
            config.routing.selection, config.queues.max_queue_size
        );
        Ok(Arc::new(Self {
            config,
            registry,
            ledger,
            queue,
            counters: RoutingCounters::default(),
        }))
    }

    /// Engine configuration
    pub fn config(&self) -> &CallCenterConfig {
        &self.config
    }

    /// Register an operator (administrative path); new operators start OFFLINE.
    pub async fn add_operator(&self, id: &OperatorId) -> Result<()> {
        self.registry.upsert_operator(id).await
    }

    /// Apply an external presence signal (sign-in/sign-out) to an operator.
    ///
    /// Advisory input: it never overrides a BUSY reservation back to ONLINE,
    /// and an operator signing off mid-call simply stops being selectable.
    pub async fn set_operator_presence(&self, id: &OperatorId, online: bool) -> Result<()> {
        self.registry.set_presence(id, online).await
    }

    /// Point-in-time view of backlog depth, routing counters and operator
    /// availability.
    pub async fn stats(&self) -> Result<OrchestratorStats> {
        Ok(OrchestratorStats {
            queued_calls: self.queue.len(),
            routing: self.counters.snapshot(),
            operators: self.registry.stats().await?,
        })
    }
}
