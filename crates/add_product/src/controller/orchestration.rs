//! Request sequencing and background task bookkeeping for the controller.

use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, PoisonError,
    },
};

use tokio::{runtime::Handle, task::JoinHandle};

use crate::controller::events::OperationKind;

/// Which response wins when several calls of one kind are in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderingPolicy {
    /// Only the most recently issued call may publish its result.
    #[default]
    LatestIssued,
    /// Every completion is applied; the slowest call has the last word.
    LatestCompletion,
}

impl OrderingPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "latest_issued" => Some(OrderingPolicy::LatestIssued),
            "latest_completion" => Some(OrderingPolicy::LatestCompletion),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    kind: OperationKind,
    seq: u64,
    epoch: u64,
}

impl Ticket {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Monotonic sequence per operation kind, plus a reset epoch shared by all
/// kinds. A ticket from an older epoch is stale under either policy.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    policy: OrderingPolicy,
    latest: [AtomicU64; OperationKind::COUNT],
    epoch: AtomicU64,
}

impl RequestSequencer {
    pub fn new(policy: OrderingPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn issue(&self, kind: OperationKind) -> Ticket {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let seq = self.latest[kind.index()].fetch_add(1, Ordering::SeqCst) + 1;
        Ticket { kind, seq, epoch }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        if self.epoch.load(Ordering::SeqCst) != ticket.epoch {
            return false;
        }
        match self.policy {
            OrderingPolicy::LatestCompletion => true,
            OrderingPolicy::LatestIssued => {
                self.latest[ticket.kind.index()].load(Ordering::SeqCst) == ticket.seq
            }
        }
    }

    /// Makes every outstanding ticket stale, whatever the policy.
    pub fn invalidate_all(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }
}

/// Tasks spawned on behalf of one controller; aborted together.
#[derive(Default)]
pub struct TaskTracker {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskTracker {
    pub fn spawn<F>(&self, runtime: &Handle, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = runtime.spawn(task);
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    pub fn in_flight(&self) -> usize {
        let handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.iter().filter(|h| !h.is_finished()).count()
    }

    pub fn abort_all(&self) {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        for handle in handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for TaskTracker {
    fn drop(&mut self) {
        self.abort_all();
    }
}
