//! # Operator Registry
//!
//! Tracks the availability of every operator and exposes the atomic state
//! transitions the routing engine relies on. `reserve` is the single
//! synchronization primitive preventing double-assignment: the ONLINE→BUSY
//! transition is a compare-and-set, so of any number of concurrent callers at
//! most one succeeds per operator.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

use crate::config::SelectionStrategy;
use crate::error::{CallCenterError, Result};
use crate::operator::types::{Availability, OperatorId};

/// Availability counts for monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total: usize,
    pub online: usize,
    pub busy: usize,
    pub offline: usize,
}

/// Contract between the routing engine and operator state storage
///
/// Implemented in-memory by [`InMemoryOperatorRegistry`] and durably by
/// [`DatabaseManager`](crate::database::DatabaseManager).
#[async_trait]
pub trait OperatorRegistry: Send + Sync {
    /// Register an operator if it does not exist yet; new operators start
    /// OFFLINE. Existing operators are left untouched.
    async fn upsert_operator(&self, id: &OperatorId) -> Result<()>;

    /// External presence signal: toggles OFFLINE↔ONLINE. A BUSY operator
    /// going offline is recorded immediately; presence can never force a BUSY
    /// operator back to ONLINE — that transition belongs to `release`.
    async fn set_presence(&self, id: &OperatorId, online: bool) -> Result<()>;

    /// Return one ONLINE operator, or `None` when nobody is eligible.
    /// Selection among multiple candidates is deterministic per the
    /// configured [`SelectionStrategy`].
    async fn find_available(&self) -> Result<Option<OperatorId>>;

    /// Atomically transition ONLINE→BUSY. Fails with `Conflict` when the
    /// operator is not currently ONLINE (lost race, offline, or unknown).
    async fn reserve(&self, id: &OperatorId) -> Result<()>;

    /// Transition BUSY→ONLINE. Releasing an already-ONLINE operator is a
    /// no-op success; an operator that went OFFLINE while BUSY stays OFFLINE.
    /// Fails with `NotFound` for an unknown id.
    async fn release(&self, id: &OperatorId) -> Result<()>;

    /// Current availability of a single operator
    async fn availability_of(&self, id: &OperatorId) -> Result<Availability>;

    /// Availability counts across all operators
    async fn stats(&self) -> Result<RegistryStats>;
}

/// In-memory operator registry
///
/// Per-operator state lives in a `DashMap`; `get_mut` holds the shard write
/// guard across the check-and-set, which is what makes `reserve` atomic.
pub struct InMemoryOperatorRegistry {
    operators: DashMap<OperatorId, Availability>,
    selection: SelectionStrategy,
    /// Rotation cursor for `SelectionStrategy::RoundRobin`
    cursor: AtomicUsize,
}

impl InMemoryOperatorRegistry {
    pub fn new(selection: SelectionStrategy) -> Self {
        Self {
            operators: DashMap::new(),
            selection,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Sorted ids of all currently ONLINE operators
    fn online_ids(&self) -> Vec<OperatorId> {
        let mut ids: Vec<OperatorId> = self
            .operators
            .iter()
            .filter(|entry| *entry.value() == Availability::Online)
            .map(|entry| entry.key().clone())
            .collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl OperatorRegistry for InMemoryOperatorRegistry {
    async fn upsert_operator(&self, id: &OperatorId) -> Result<()> {
        self.operators
            .entry(id.clone())
            .or_insert(Availability::Offline);
        debug!("Operator {} registered", id);
        Ok(())
    }

    async fn set_presence(&self, id: &OperatorId, online: bool) -> Result<()> {
        let mut entry = self
            .operators
            .get_mut(id)
            .ok_or_else(|| CallCenterError::not_found(format!("Operator not found: {}", id)))?;

        let next = match (*entry, online) {
            (Availability::Offline, true) => Availability::Online,
            (Availability::Online, false) => Availability::Offline,
            // An operator may sign off mid-call; it must never be selected again.
            (Availability::Busy, false) => Availability::Offline,
            (current, _) => current,
        };

        if next != *entry {
            info!("Operator {} presence: {} -> {}", id, *entry, next);
            *entry = next;
        }
        Ok(())
    }

    async fn find_available(&self) -> Result<Option<OperatorId>> {
        let online = self.online_ids();
        if online.is_empty() {
            return Ok(None);
        }

        let picked = match self.selection {
            SelectionStrategy::LowestId => online[0].clone(),
            SelectionStrategy::RoundRobin => {
                let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % online.len();
                online[idx].clone()
            }
        };
        Ok(Some(picked))
    }

    async fn reserve(&self, id: &OperatorId) -> Result<()> {
        match self.operators.get_mut(id) {
            Some(mut entry) if *entry == Availability::Online => {
                *entry = Availability::Busy;
                debug!("Operator {} reserved", id);
                Ok(())
            }
            Some(entry) => Err(CallCenterError::conflict(format!(
                "Operator {} is {}, not online",
                id, *entry
            ))),
            None => Err(CallCenterError::conflict(format!(
                "Operator {} is not reservable",
                id
            ))),
        }
    }

    async fn release(&self, id: &OperatorId) -> Result<()> {
        let mut entry = self
            .operators
            .get_mut(id)
            .ok_or_else(|| CallCenterError::not_found(format!("Operator not found: {}", id)))?;

        if *entry == Availability::Busy {
            *entry = Availability::Online;
            debug!("Operator {} released", id);
        }
        Ok(())
    }

    async fn availability_of(&self, id: &OperatorId) -> Result<Availability> {
        self.operators
            .get(id)
            .map(|entry| *entry.value())
            .ok_or_else(|| CallCenterError::not_found(format!("Operator not found: {}", id)))
    }

    async fn stats(&self) -> Result<RegistryStats> {
        let mut stats = RegistryStats::default();
        for entry in self.operators.iter() {
            stats.total += 1;
            match entry.value() {
                Availability::Online => stats.online += 1,
                Availability::Busy => stats.busy += 1,
                Availability::Offline => stats.offline += 1,
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn registry_with_online(ids: &[&str]) -> InMemoryOperatorRegistry {
        let registry = InMemoryOperatorRegistry::new(SelectionStrategy::LowestId);
        for id in ids {
            let id = OperatorId::from(*id);
            registry.upsert_operator(&id).await.unwrap();
            registry.set_presence(&id, true).await.unwrap();
        }
        registry
    }

    #[tokio::test]
    async fn new_operators_start_offline() {
        let registry = InMemoryOperatorRegistry::new(SelectionStrategy::LowestId);
        let id = OperatorId::from("op-001");
        registry.upsert_operator(&id).await.unwrap();

        assert_eq!(registry.availability_of(&id).await.unwrap(), Availability::Offline);
        assert_eq!(registry.find_available().await.unwrap(), None);
    }

    #[tokio::test]
    async fn lowest_id_selection_is_deterministic() {
        let registry = registry_with_online(&["op-003", "op-001", "op-002"]).await;
        assert_eq!(
            registry.find_available().await.unwrap(),
            Some(OperatorId::from("op-001"))
        );
        // Repeated queries return the same operator until state changes.
        assert_eq!(
            registry.find_available().await.unwrap(),
            Some(OperatorId::from("op-001"))
        );
    }

    #[tokio::test]
    async fn round_robin_rotates_over_online_operators() {
        let registry = InMemoryOperatorRegistry::new(SelectionStrategy::RoundRobin);
        for id in ["op-001", "op-002"] {
            let id = OperatorId::from(id);
            registry.upsert_operator(&id).await.unwrap();
            registry.set_presence(&id, true).await.unwrap();
        }

        let first = registry.find_available().await.unwrap().unwrap();
        let second = registry.find_available().await.unwrap().unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn reserve_is_exclusive() {
        let registry = registry_with_online(&["op-001"]).await;
        let id = OperatorId::from("op-001");

        registry.reserve(&id).await.unwrap();
        assert!(matches!(
            registry.reserve(&id).await,
            Err(CallCenterError::Conflict(_))
        ));
        assert_eq!(registry.availability_of(&id).await.unwrap(), Availability::Busy);
    }

    #[tokio::test]
    async fn concurrent_reserves_admit_exactly_one_winner() {
        let registry = Arc::new(registry_with_online(&["op-001"]).await);
        let id = OperatorId::from("op-001");

        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            let id = id.clone();
            handles.push(tokio::spawn(async move { registry.reserve(&id).await.is_ok() }));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let registry = registry_with_online(&["op-001"]).await;
        let id = OperatorId::from("op-001");

        registry.reserve(&id).await.unwrap();
        registry.release(&id).await.unwrap();
        assert_eq!(registry.availability_of(&id).await.unwrap(), Availability::Online);

        // Second release is a no-op success.
        registry.release(&id).await.unwrap();
        assert_eq!(registry.availability_of(&id).await.unwrap(), Availability::Online);
    }

    #[tokio::test]
    async fn release_of_unknown_operator_fails() {
        let registry = InMemoryOperatorRegistry::new(SelectionStrategy::LowestId);
        assert!(matches!(
            registry.release(&OperatorId::from("ghost")).await,
            Err(CallCenterError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn busy_operator_signing_off_stays_offline_after_release() {
        let registry = registry_with_online(&["op-001"]).await;
        let id = OperatorId::from("op-001");

        registry.reserve(&id).await.unwrap();
        registry.set_presence(&id, false).await.unwrap();
        assert_eq!(registry.availability_of(&id).await.unwrap(), Availability::Offline);

        registry.release(&id).await.unwrap();
        assert_eq!(registry.availability_of(&id).await.unwrap(), Availability::Offline);
        assert_eq!(registry.find_available().await.unwrap(), None);
    }

    #[tokio::test]
    async fn stats_count_each_state() {
        let registry = registry_with_online(&["op-001", "op-002"]).await;
        let offline = OperatorId::from("op-003");
        registry.upsert_operator(&offline).await.unwrap();
        registry.reserve(&OperatorId::from("op-001")).await.unwrap();

        let stats = registry.stats().await.unwrap();
        assert_eq!(
            stats,
            RegistryStats { total: 3, online: 1, busy: 1, offline: 1 }
        );
    }
}
