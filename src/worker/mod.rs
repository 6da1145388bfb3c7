//! # Workers
//!
//! A [`Worker`] turns one task into an outcome. The pool awaits `process`
//! inline in the worker's execution context, so a worker instance is never
//! asked to handle two tasks at once, though distinct instances run
//! concurrently.

mod order_worker;

use std::fmt::Debug;

use async_trait::async_trait;
use thiserror::Error;

pub use order_worker::{OrderOutcome, OrderWorker};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    #[error("Task {task_id} rejected: {reason}")]
    Rejected { task_id: String, reason: String },

    #[error("Step '{step}' failed for task {task_id}: {message}")]
    Step {
        task_id: String,
        step: String,
        message: String,
    },
}

impl WorkerError {
    pub fn rejected(task_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            task_id: task_id.into(),
            reason: reason.into(),
        }
    }

    pub fn step(
        task_id: impl Into<String>,
        step: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Step {
            task_id: task_id.into(),
            step: step.into(),
            message: message.into(),
        }
    }
}

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Processes tasks taken from a queue
///
/// Implementations must not mutate the task and should record its identifier
/// in an append-only log.
#[async_trait]
pub trait Worker<T: Sync>: Send + Sync + 'static {
    type Outcome: Debug + Send;

    fn name(&self) -> &str;

    async fn process(&self, task: &T) -> WorkerResult<Self::Outcome>;
}
