//! # Queue Manager
//!
//! Strict-FIFO backlog of queued calls. The backlog holds call ids only; the
//! records themselves live in the ledger, so the queue is a dispatch-order
//! view over calls with status QUEUED.

use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::error::{CallCenterError, Result};
use crate::ledger::CallId;

/// FIFO call backlog
///
/// All operations take the mutex, so concurrent drains from multiple
/// simultaneous completions see a consistent order. Removing an entry from
/// the middle (stale or administratively cancelled calls) keeps the relative
/// order of everything else.
pub struct QueueManager {
    backlog: Mutex<VecDeque<CallId>>,
    max_size: usize,
}

impl QueueManager {
    pub fn new(max_size: usize) -> Self {
        Self {
            backlog: Mutex::new(VecDeque::new()),
            max_size,
        }
    }

    /// Append a call to the backlog and return its position (0-based).
    ///
    /// A call already present is not re-queued; its current position is
    /// returned instead. Fails with a Queue error at capacity.
    pub fn enqueue(&self, call_id: CallId) -> Result<usize> {
        let mut backlog = self.backlog.lock();

        if let Some(pos) = backlog.iter().position(|queued| *queued == call_id) {
            warn!("Call {} already queued at position {}, not re-queuing", call_id, pos);
            return Ok(pos);
        }

        if backlog.len() >= self.max_size {
            return Err(CallCenterError::queue(format!(
                "Backlog full ({} calls)",
                backlog.len()
            )));
        }

        backlog.push_back(call_id.clone());
        let pos = backlog.len() - 1;
        debug!("Call {} enqueued at position {}", call_id, pos);
        Ok(pos)
    }

    /// The oldest waiting call, without removing it
    pub fn peek_oldest(&self) -> Option<CallId> {
        self.backlog.lock().front().cloned()
    }

    /// Remove a specific call from the backlog.
    ///
    /// Returns `false` (a silent no-op) when the call is not present — it was
    /// already dispatched by a concurrent drain or cancelled.
    pub fn dequeue(&self, call_id: &CallId) -> bool {
        let mut backlog = self.backlog.lock();
        if let Some(pos) = backlog.iter().position(|queued| queued == call_id) {
            backlog.remove(pos);
            debug!("Call {} dequeued (remaining: {})", call_id, backlog.len());
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.backlog.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.backlog.lock().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.backlog.lock().len() >= self.max_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_preserves_arrival_order() {
        let queue = QueueManager::new(10);
        let a = CallId::from("call-a");
        let b = CallId::from("call-b");
        let c = CallId::from("call-c");

        assert_eq!(queue.enqueue(a.clone()).unwrap(), 0);
        assert_eq!(queue.enqueue(b.clone()).unwrap(), 1);
        assert_eq!(queue.enqueue(c.clone()).unwrap(), 2);

        assert_eq!(queue.peek_oldest(), Some(a.clone()));
        assert!(queue.dequeue(&a));
        assert_eq!(queue.peek_oldest(), Some(b));
    }

    #[test]
    fn peek_does_not_remove() {
        let queue = QueueManager::new(10);
        queue.enqueue(CallId::from("call-a")).unwrap();

        assert_eq!(queue.peek_oldest(), Some(CallId::from("call-a")));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn out_of_order_removal_keeps_remaining_order() {
        let queue = QueueManager::new(10);
        for id in ["call-a", "call-b", "call-c"] {
            queue.enqueue(CallId::from(id)).unwrap();
        }

        // Remove the middle entry, as an administrative cancellation would.
        assert!(queue.dequeue(&CallId::from("call-b")));
        assert_eq!(queue.peek_oldest(), Some(CallId::from("call-a")));
        assert!(queue.dequeue(&CallId::from("call-a")));
        assert_eq!(queue.peek_oldest(), Some(CallId::from("call-c")));
    }

    #[test]
    fn dequeue_of_absent_call_is_a_noop() {
        let queue = QueueManager::new(10);
        queue.enqueue(CallId::from("call-a")).unwrap();

        assert!(!queue.dequeue(&CallId::from("ghost")));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn duplicate_enqueue_returns_existing_position() {
        let queue = QueueManager::new(10);
        queue.enqueue(CallId::from("call-a")).unwrap();
        queue.enqueue(CallId::from("call-b")).unwrap();

        assert_eq!(queue.enqueue(CallId::from("call-b")).unwrap(), 1);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn capacity_is_enforced() {
        let queue = QueueManager::new(2);
        queue.enqueue(CallId::from("call-a")).unwrap();
        queue.enqueue(CallId::from("call-b")).unwrap();

        assert!(queue.is_full());
        assert!(matches!(
            queue.enqueue(CallId::from("call-c")),
            Err(CallCenterError::Queue(_))
        ));
    }
}
