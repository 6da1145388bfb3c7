//! # Task Queue
//!
//! FIFO hand-off between task producers and the worker pool. Each task is
//! delivered to exactly one caller of [`TaskQueue::take`]; once the queue is
//! shut down, every pending and future `take` fails with [`QueueError::Closed`].

mod in_memory;

use async_trait::async_trait;
use thiserror::Error;

pub use in_memory::InMemoryTaskQueue;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue is closed: {queue}")]
    Closed { queue: String },
}

impl QueueError {
    pub fn closed(queue: impl Into<String>) -> Self {
        Self::Closed {
            queue: queue.into(),
        }
    }
}

pub type QueueResult<T> = Result<T, QueueError>;

/// Thread-safe FIFO task queue
#[async_trait]
pub trait TaskQueue<T: Send + 'static>: Send + Sync + 'static {
    /// Enqueue a task; suspends only while a bounded queue is full
    async fn submit(&self, task: T) -> QueueResult<()>;

    /// Claim the oldest task, suspending until one is available
    async fn take(&self) -> QueueResult<T>;

    /// Close the queue, release every waiter and discard unclaimed tasks
    ///
    /// Returns the number of tasks discarded. Calling it again returns 0.
    async fn shutdown(&self) -> usize;

    /// Tasks submitted but not yet taken
    fn depth(&self) -> usize;

    /// Total tasks accepted since creation
    fn submitted_count(&self) -> u64;

    fn is_closed(&self) -> bool;

    fn name(&self) -> &str;
}
