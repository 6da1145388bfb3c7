//! Pool counters.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;

#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    processed: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
    aborted: AtomicU64,
    in_flight: AtomicUsize,
    live_workers: AtomicUsize,
}

impl PoolCounters {
    pub(crate) fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_panicked(&self) {
        self.panicked.fetch_add(1, Ordering::AcqRel);
    }

    /// Tasks whose processing ended, whatever the result
    pub(crate) fn completed(&self) -> u64 {
        self.processed.load(Ordering::Acquire)
            + self.failed.load(Ordering::Acquire)
            + self.panicked.load(Ordering::Acquire)
            + self.aborted.load(Ordering::Acquire)
    }

    pub(crate) fn snapshot(&self) -> PoolStats {
        PoolStats {
            processed: self.processed.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            panicked: self.panicked.load(Ordering::Acquire),
            aborted: self.aborted.load(Ordering::Acquire),
            in_flight: self.in_flight.load(Ordering::Acquire),
            live_workers: self.live_workers.load(Ordering::Acquire),
        }
    }
}

/// Counts one live execution context for as long as it is held
///
/// Dropped when the context's loop returns, unwinds or is aborted.
pub(crate) struct LiveWorkerGuard {
    counters: Arc<PoolCounters>,
}

impl LiveWorkerGuard {
    pub(crate) fn register(counters: &Arc<PoolCounters>) -> Self {
        counters.live_workers.fetch_add(1, Ordering::AcqRel);
        Self {
            counters: Arc::clone(counters),
        }
    }
}

impl Drop for LiveWorkerGuard {
    fn drop(&mut self) {
        self.counters.live_workers.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Counts one task as in flight for as long as it is held
///
/// A guard dropped without [`InFlightGuard::settle`] belongs to a context that
/// was aborted mid-task; the task is counted as aborted.
pub(crate) struct InFlightGuard {
    counters: Arc<PoolCounters>,
    settled: bool,
}

impl InFlightGuard {
    pub(crate) fn begin(counters: &Arc<PoolCounters>) -> Self {
        counters.in_flight.fetch_add(1, Ordering::AcqRel);
        Self {
            counters: Arc::clone(counters),
            settled: false,
        }
    }

    /// Mark the task's result as recorded
    pub(crate) fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if !self.settled {
            self.counters.aborted.fetch_add(1, Ordering::AcqRel);
        }
        self.counters.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Point-in-time pool statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Tasks processed successfully
    pub processed: u64,
    /// Tasks whose worker returned an error
    pub failed: u64,
    /// Tasks whose worker panicked
    pub panicked: u64,
    /// Tasks abandoned when shutdown aborted their context
    pub aborted: u64,
    pub in_flight: usize,
    /// Execution contexts currently running their loop
    pub live_workers: usize,
}

impl PoolStats {
    pub fn completed(&self) -> u64 {
        self.processed + self.failed + self.panicked + self.aborted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settled_guard_only_clears_in_flight() {
        let counters = Arc::new(PoolCounters::default());
        let guard = InFlightGuard::begin(&counters);
        assert_eq!(counters.snapshot().in_flight, 1);

        counters.record_processed();
        guard.settle();

        let stats = counters.snapshot();
        assert_eq!(stats.in_flight, 0);
        assert_eq!(stats.aborted, 0);
        assert_eq!(stats.completed(), 1);
    }

    #[test]
    fn test_dropped_guard_counts_abort() {
        let counters = Arc::new(PoolCounters::default());
        drop(InFlightGuard::begin(&counters));

        let stats = counters.snapshot();
        assert_eq!(stats.in_flight, 0);
        assert_eq!(stats.aborted, 1);
        assert_eq!(counters.completed(), 1);
    }
}
