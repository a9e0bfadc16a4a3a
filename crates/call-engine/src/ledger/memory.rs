//! In-memory call ledger, the default store for tests and single-process use.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::{CallCenterError, Result};
use crate::ledger::{CallId, CallLedger, CallRecord, CallStatus};
use crate::operator::OperatorId;

/// Call records guarded by a single RwLock
///
/// Status transitions take the write guard across the check-and-set, so a
/// call can only be completed once and only promoted while QUEUED, no matter
/// how many engine tasks race.
pub struct InMemoryCallLedger {
    state: RwLock<LedgerState>,
    clock: Arc<dyn Clock>,
}

#[derive(Default)]
struct LedgerState {
    by_id: HashMap<CallId, usize>,
    /// Records in creation order; used to break `started_at` ties in listings
    records: Vec<CallRecord>,
}

impl InMemoryCallLedger {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            clock,
        }
    }
}

#[async_trait]
impl CallLedger for InMemoryCallLedger {
    async fn create(&self, caller_number: &str, operator: Option<OperatorId>) -> Result<CallId> {
        let call_id = CallId::new();
        let status = if operator.is_some() {
            CallStatus::Active
        } else {
            CallStatus::Queued
        };

        let record = CallRecord {
            id: call_id.clone(),
            caller_number: caller_number.to_string(),
            operator_id: operator,
            status,
            started_at: self.clock.now(),
            ended_at: None,
            duration_seconds: None,
            notes: None,
        };

        let mut state = self.state.write();
        let idx = state.records.len();
        state.by_id.insert(call_id.clone(), idx);
        state.records.push(record);

        info!("Call {} created ({})", call_id, status);
        Ok(call_id)
    }

    async fn complete(
        &self,
        call_id: &CallId,
        duration_seconds: u64,
        notes: &str,
    ) -> Result<Option<OperatorId>> {
        let mut state = self.state.write();
        let idx = *state
            .by_id
            .get(call_id)
            .ok_or_else(|| CallCenterError::not_found(format!("Call not found: {}", call_id)))?;

        let record = &mut state.records[idx];
        if record.status == CallStatus::Completed {
            return Err(CallCenterError::not_found(format!(
                "Call already completed: {}",
                call_id
            )));
        }

        record.status = CallStatus::Completed;
        record.ended_at = Some(self.clock.now());
        record.duration_seconds = Some(duration_seconds);
        record.notes = Some(notes.to_string());

        info!("Call {} completed after {}s", call_id, duration_seconds);
        Ok(record.operator_id.clone())
    }

    async fn promote(&self, call_id: &CallId, operator: &OperatorId) -> Result<()> {
        let mut state = self.state.write();
        let idx = *state
            .by_id
            .get(call_id)
            .ok_or_else(|| CallCenterError::not_found(format!("Call not found: {}", call_id)))?;

        let record = &mut state.records[idx];
        if record.status != CallStatus::Queued {
            return Err(CallCenterError::not_found(format!(
                "Call {} is {}, not queued",
                call_id, record.status
            )));
        }

        record.status = CallStatus::Active;
        record.operator_id = Some(operator.clone());
        debug!("Call {} promoted to operator {}", call_id, operator);
        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<CallRecord>> {
        let state = self.state.read();
        let mut indexed: Vec<(usize, &CallRecord)> =
            state.records.iter().enumerate().collect();
        // Newest first; creation order breaks started_at ties.
        indexed.sort_by(|(ia, a), (ib, b)| {
            b.started_at.cmp(&a.started_at).then(ib.cmp(ia))
        });
        Ok(indexed
            .into_iter()
            .take(limit)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn get(&self, call_id: &CallId) -> Result<Option<CallRecord>> {
        let state = self.state.read();
        Ok(state
            .by_id
            .get(call_id)
            .map(|idx| state.records[*idx].clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};

    fn ledger_with_clock() -> (InMemoryCallLedger, Arc<ManualClock>) {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        (InMemoryCallLedger::new(clock.clone()), clock)
    }

    #[tokio::test]
    async fn create_without_operator_is_queued() {
        let (ledger, _) = ledger_with_clock();
        let call_id = ledger.create("+15551234", None).await.unwrap();

        let record = ledger.get(&call_id).await.unwrap().unwrap();
        assert_eq!(record.status, CallStatus::Queued);
        assert!(record.operator_id.is_none());
        assert!(record.ended_at.is_none());
    }

    #[tokio::test]
    async fn create_with_operator_is_active() {
        let (ledger, _) = ledger_with_clock();
        let op = OperatorId::from("op-001");
        let call_id = ledger.create("+15551234", Some(op.clone())).await.unwrap();

        let record = ledger.get(&call_id).await.unwrap().unwrap();
        assert_eq!(record.status, CallStatus::Active);
        assert_eq!(record.operator_id, Some(op));
    }

    #[tokio::test]
    async fn complete_returns_operator_and_is_not_repeatable() {
        let (ledger, clock) = ledger_with_clock();
        let op = OperatorId::from("op-001");
        let call_id = ledger.create("+15551234", Some(op.clone())).await.unwrap();

        clock.advance_secs(30);
        let freed = ledger.complete(&call_id, 30, "resolved").await.unwrap();
        assert_eq!(freed, Some(op));

        let record = ledger.get(&call_id).await.unwrap().unwrap();
        assert_eq!(record.status, CallStatus::Completed);
        assert_eq!(record.duration_seconds, Some(30));
        assert_eq!(record.notes.as_deref(), Some("resolved"));
        assert_eq!(
            record.ended_at.unwrap() - record.started_at,
            chrono::Duration::seconds(30)
        );

        // Second completion is a NotFound, not a silent repeat.
        assert!(matches!(
            ledger.complete(&call_id, 30, "again").await,
            Err(CallCenterError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn completing_a_queued_call_frees_no_operator() {
        let (ledger, _) = ledger_with_clock();
        let call_id = ledger.create("+15551234", None).await.unwrap();

        let freed = ledger.complete(&call_id, 0, "cancelled").await.unwrap();
        assert_eq!(freed, None);
    }

    #[tokio::test]
    async fn promote_preserves_arrival_time() {
        let (ledger, clock) = ledger_with_clock();
        let call_id = ledger.create("+15551234", None).await.unwrap();
        let arrival = ledger.get(&call_id).await.unwrap().unwrap().started_at;

        clock.advance_secs(120);
        let op = OperatorId::from("op-001");
        ledger.promote(&call_id, &op).await.unwrap();

        let record = ledger.get(&call_id).await.unwrap().unwrap();
        assert_eq!(record.status, CallStatus::Active);
        assert_eq!(record.operator_id, Some(op));
        assert_eq!(record.started_at, arrival);
    }

    #[tokio::test]
    async fn promote_rejects_non_queued_calls() {
        let (ledger, _) = ledger_with_clock();
        let op = OperatorId::from("op-001");
        let call_id = ledger.create("+15551234", Some(op.clone())).await.unwrap();

        assert!(matches!(
            ledger.promote(&call_id, &op).await,
            Err(CallCenterError::NotFound(_))
        ));
        assert!(matches!(
            ledger.promote(&CallId::from("ghost"), &op).await,
            Err(CallCenterError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_recent_orders_newest_first() {
        let (ledger, clock) = ledger_with_clock();
        let first = ledger.create("+15550001", None).await.unwrap();
        clock.advance_secs(10);
        let second = ledger.create("+15550002", None).await.unwrap();
        clock.advance_secs(10);
        let third = ledger.create("+15550003", None).await.unwrap();

        let listed = ledger.list_recent(2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, third);
        assert_eq!(listed[1].id, second);

        let all = ledger.list_recent(10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].id, first);
    }
}
