//! # Call routing operations
//!
//! The state machine over calls: QUEUED → ACTIVE → COMPLETED, no skipped
//! states, ACTIVE never returns to QUEUED. `initiate_call` reserves before it
//! creates, so the reservation — not a query-then-update pair — decides every
//! race. `end_call` releases the freed operator and drains the backlog.

use tracing::{debug, info, warn};

use crate::error::{CallCenterError, Result};
use crate::ledger::{CallId, CallRecord};
use crate::orchestrator::core::CallCenterEngine;
use crate::orchestrator::types::CallDisposition;
use std::sync::atomic::Ordering;

impl CallCenterEngine {
    /// Route an incoming call.
    ///
    /// Reserves an available operator and creates the call ACTIVE, or falls
    /// back to creating it QUEUED in the backlog. A reservation lost to a
    /// concurrent caller triggers a bounded re-query
    /// (`routing.reserve_retries`, default 1) before queueing; "no operator
    /// available" is the normal queueing path, never an error.
    pub async fn initiate_call(&self, caller_number: &str) -> Result<CallDisposition> {
        if caller_number.is_empty() {
            return Err(CallCenterError::invalid_input(
                "caller_number must not be empty",
            ));
        }

        let mut requeries = 0;
        loop {
            let Some(operator) = self.registry.find_available().await? else {
                break;
            };

            match self.registry.reserve(&operator).await {
                Ok(()) => {
                    let call_id = match self
                        .ledger
                        .create(caller_number, Some(operator.clone()))
                        .await
                    {
                        Ok(call_id) => call_id,
                        Err(e) => {
                            // Reserve + create must be all-or-nothing.
                            let _ = self.registry.release(&operator).await;
                            return Err(e);
                        }
                    };

                    self.counters
                        .calls_routed_directly
                        .fetch_add(1, Ordering::Relaxed);
                    info!(
                        "Call {} from {} assigned to operator {}",
                        call_id, caller_number, operator
                    );
                    return Ok(CallDisposition::assigned(call_id, operator));
                }
                Err(CallCenterError::Conflict(reason)) => {
                    debug!(
                        "Reservation of {} lost ({}), re-querying registry",
                        operator, reason
                    );
                    if requeries >= self.config.routing.reserve_retries {
                        break;
                    }
                    requeries += 1;
                }
                Err(e) => return Err(e),
            }
        }

        let call_id = self.ledger.create(caller_number, None).await?;
        if let Err(e) = self.queue.enqueue(call_id.clone()) {
            // Capacity is decided by the append itself, under the backlog
            // lock. A QUEUED record with no backlog entry would never be
            // dispatched, so void the record before surfacing the error.
            let _ = self
                .ledger
                .complete(&call_id, 0, "rejected: backlog full")
                .await;
            warn!(
                "Backlog full ({} calls), rejecting call {} from {}",
                self.queue.len(),
                call_id,
                caller_number
            );
            return Err(e);
        }
        self.counters.calls_queued.fetch_add(1, Ordering::Relaxed);
        info!(
            "No operator available, call {} from {} queued (backlog: {})",
            call_id,
            caller_number,
            self.queue.len()
        );
        Ok(CallDisposition::queued(call_id))
    }

    /// Complete a call and reconcile operator availability.
    ///
    /// `NotFound` (unknown or already-completed call) surfaces to the caller
    /// with nothing mutated. A completed call that never reached an operator
    /// frees nobody. After the release, queued calls are drained onto
    /// whatever operators are now available.
    pub async fn end_call(
        &self,
        call_id: &CallId,
        duration_seconds: u64,
        notes: &str,
    ) -> Result<()> {
        let freed = self.ledger.complete(call_id, duration_seconds, notes).await?;
        self.counters.calls_completed.fetch_add(1, Ordering::Relaxed);

        if let Some(operator) = freed {
            self.registry.release(&operator).await?;
            info!("Call {} ended, operator {} released", call_id, operator);
        } else {
            info!("Call {} ended without an assigned operator", call_id);
        }

        self.drain_queue().await
    }

    /// Recent calls, newest first. `None` uses `general.list_limit`.
    pub async fn list_calls(&self, limit: Option<usize>) -> Result<Vec<CallRecord>> {
        let limit = limit.unwrap_or(self.config.general.list_limit);
        self.ledger.list_recent(limit).await
    }

    /// Look up a single call record.
    pub async fn get_call(&self, call_id: &CallId) -> Result<Option<CallRecord>> {
        self.ledger.get(call_id).await
    }

    /// Dispatch queued calls onto available operators, oldest first.
    ///
    /// Each iteration either consumes an ONLINE operator via `reserve` or
    /// stops, so the loop terminates. A reservation lost to a concurrent
    /// `initiate_call` leaves the head in place — the completion that freed
    /// the next operator runs its own drain. A stale head (cancelled or
    /// already dispatched elsewhere) is dropped and the operator returned.
    async fn drain_queue(&self) -> Result<()> {
        loop {
            let Some(call_id) = self.queue.peek_oldest() else {
                break;
            };
            let Some(operator) = self.registry.find_available().await? else {
                break;
            };

            match self.registry.reserve(&operator).await {
                Ok(()) => match self.ledger.promote(&call_id, &operator).await {
                    Ok(()) => {
                        self.queue.dequeue(&call_id);
                        self.counters
                            .calls_dispatched_from_queue
                            .fetch_add(1, Ordering::Relaxed);
                        info!(
                            "Queued call {} dispatched to operator {} (backlog: {})",
                            call_id,
                            operator,
                            self.queue.len()
                        );
                    }
                    Err(CallCenterError::NotFound(reason)) => {
                        warn!("Dropping stale backlog entry {}: {}", call_id, reason);
                        self.queue.dequeue(&call_id);
                        let _ = self.registry.release(&operator).await;
                    }
                    Err(e) => {
                        let _ = self.registry.release(&operator).await;
                        return Err(e);
                    }
                },
                Err(CallCenterError::Conflict(_)) => {
                    debug!(
                        "Lost operator {} to a concurrent assignment, stopping drain",
                        operator
                    );
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
