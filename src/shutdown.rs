//! # Shutdown Reporting
//!
//! Outcome of a bounded shutdown. Contexts that miss the deadline are reported
//! here as warnings instead of failing the shutdown call.

use std::time::Duration;

use serde::Serialize;

/// Result of stopping a bus or a pool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShutdownReport {
    /// Component that was shut down (`"worker_pool"`, `"broker_bus"`, ...)
    pub component: String,
    /// Execution contexts that exited within the deadline
    pub stopped: usize,
    /// Contexts that did not exit in time and were abandoned
    pub timed_out: Vec<String>,
    /// Contexts that terminated abnormally (panicked or were aborted)
    pub failed: Vec<String>,
    /// Unclaimed work discarded during shutdown
    pub discarded: usize,
    pub elapsed: Duration,
}

impl ShutdownReport {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            ..Self::default()
        }
    }

    /// True when every context stopped in time and none failed
    pub fn is_clean(&self) -> bool {
        self.timed_out.is_empty() && self.failed.is_empty()
    }

    pub fn total_contexts(&self) -> usize {
        self.stopped + self.timed_out.len() + self.failed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_cleanliness() {
        let mut report = ShutdownReport::new("worker_pool");
        report.stopped = 3;
        assert!(report.is_clean());
        assert_eq!(report.total_contexts(), 3);

        report.timed_out.push("Worker-2".to_string());
        assert!(!report.is_clean());
        assert_eq!(report.total_contexts(), 4);
    }
}
