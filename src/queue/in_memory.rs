//! In-memory task queue over tokio `mpsc` channels.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{QueueError, QueueResult, TaskQueue};
use crate::config::QueueConfig;

enum TaskSender<T> {
    Bounded(mpsc::Sender<T>),
    Unbounded(mpsc::UnboundedSender<T>),
}

enum TaskReceiver<T> {
    Bounded(mpsc::Receiver<T>),
    Unbounded(mpsc::UnboundedReceiver<T>),
}

impl<T> TaskReceiver<T> {
    async fn recv(&mut self) -> Option<T> {
        match self {
            TaskReceiver::Bounded(rx) => rx.recv().await,
            TaskReceiver::Unbounded(rx) => rx.recv().await,
        }
    }

    fn try_recv(&mut self) -> Option<T> {
        match self {
            TaskReceiver::Bounded(rx) => rx.try_recv().ok(),
            TaskReceiver::Unbounded(rx) => rx.try_recv().ok(),
        }
    }

    fn close(&mut self) {
        match self {
            TaskReceiver::Bounded(rx) => rx.close(),
            TaskReceiver::Unbounded(rx) => rx.close(),
        }
    }
}

/// Channel-backed [`TaskQueue`]
///
/// A single receiver sits behind an async mutex, so concurrent takers are
/// served one at a time and every task reaches exactly one of them. Closure is
/// a cancellation token that every pending `submit`/`take` observes first.
pub struct InMemoryTaskQueue<T> {
    name: String,
    capacity: Option<usize>,
    sender: TaskSender<T>,
    receiver: Mutex<TaskReceiver<T>>,
    closed: CancellationToken,
    shut_down: AtomicBool,
    submitted: AtomicU64,
    taken: AtomicU64,
}

impl<T> std::fmt::Debug for InMemoryTaskQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTaskQueue")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("submitted", &self.submitted.load(Ordering::Relaxed))
            .field("taken", &self.taken.load(Ordering::Relaxed))
            .field("closed", &self.closed.is_cancelled())
            .finish()
    }
}

impl<T: Send + 'static> InMemoryTaskQueue<T> {
    pub fn unbounded(name: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self::from_channel(
            name.into(),
            None,
            TaskSender::Unbounded(tx),
            TaskReceiver::Unbounded(rx),
        )
    }

    /// Queue holding at most `capacity` unclaimed tasks (minimum 1)
    pub fn bounded(name: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        Self::from_channel(
            name.into(),
            Some(capacity),
            TaskSender::Bounded(tx),
            TaskReceiver::Bounded(rx),
        )
    }

    pub fn from_config(config: &QueueConfig) -> Self {
        match config.capacity {
            Some(capacity) => Self::bounded(config.name.clone(), capacity),
            None => Self::unbounded(config.name.clone()),
        }
    }

    fn from_channel(
        name: String,
        capacity: Option<usize>,
        sender: TaskSender<T>,
        receiver: TaskReceiver<T>,
    ) -> Self {
        debug!(queue = %name, capacity = ?capacity, "📥 QUEUE: Created");
        Self {
            name,
            capacity,
            sender,
            receiver: Mutex::new(receiver),
            closed: CancellationToken::new(),
            shut_down: AtomicBool::new(false),
            submitted: AtomicU64::new(0),
            taken: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn closed_error(&self) -> QueueError {
        QueueError::closed(&self.name)
    }
}

#[async_trait]
impl<T: Send + 'static> TaskQueue<T> for InMemoryTaskQueue<T> {
    async fn submit(&self, task: T) -> QueueResult<()> {
        if self.closed.is_cancelled() {
            return Err(self.closed_error());
        }

        // Counted before the send so a fast taker never overtakes the count
        self.submitted.fetch_add(1, Ordering::AcqRel);
        let sent = match &self.sender {
            TaskSender::Unbounded(tx) => tx.send(task).is_ok(),
            TaskSender::Bounded(tx) => {
                tokio::select! {
                    biased;
                    _ = self.closed.cancelled() => false,
                    result = tx.send(task) => result.is_ok(),
                }
            }
        };

        if sent {
            Ok(())
        } else {
            self.submitted.fetch_sub(1, Ordering::AcqRel);
            Err(self.closed_error())
        }
    }

    async fn take(&self) -> QueueResult<T> {
        if self.closed.is_cancelled() {
            return Err(self.closed_error());
        }

        let mut receiver = tokio::select! {
            biased;
            _ = self.closed.cancelled() => return Err(self.closed_error()),
            guard = self.receiver.lock() => guard,
        };

        let task = tokio::select! {
            biased;
            _ = self.closed.cancelled() => None,
            task = receiver.recv() => task,
        };

        match task {
            Some(task) => {
                self.taken.fetch_add(1, Ordering::AcqRel);
                Ok(task)
            }
            None => Err(self.closed_error()),
        }
    }

    async fn shutdown(&self) -> usize {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return 0;
        }
        self.closed.cancel();

        let mut receiver = self.receiver.lock().await;
        receiver.close();
        let mut discarded = 0;
        while receiver.try_recv().is_some() {
            discarded += 1;
        }

        info!(
            queue = %self.name,
            discarded = discarded,
            submitted = self.submitted.load(Ordering::Acquire),
            "🛑 QUEUE: Shut down"
        );
        discarded
    }

    fn depth(&self) -> usize {
        if self.closed.is_cancelled() {
            return 0;
        }
        let submitted = self.submitted.load(Ordering::Acquire);
        let taken = self.taken.load(Ordering::Acquire);
        submitted.saturating_sub(taken) as usize
    }

    fn submitted_count(&self) -> u64 {
        self.submitted.load(Ordering::Acquire)
    }

    fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_take_returns_tasks_in_submission_order() {
        let queue = InMemoryTaskQueue::unbounded("fifo");
        for i in 0..5 {
            queue.submit(i).await.unwrap();
        }
        assert_eq!(queue.depth(), 5);

        for i in 0..5 {
            assert_eq!(queue.take().await.unwrap(), i);
        }
        assert_eq!(queue.depth(), 0);
        assert_eq!(queue.submitted_count(), 5);
    }

    #[tokio::test]
    async fn test_shutdown_discards_unclaimed_tasks() {
        let queue = InMemoryTaskQueue::unbounded("discard");
        queue.submit("a").await.unwrap();
        queue.submit("b").await.unwrap();

        assert_eq!(queue.shutdown().await, 2);
        assert_eq!(queue.shutdown().await, 0);
        assert!(queue.is_closed());
        assert_eq!(queue.take().await, Err(QueueError::closed("discard")));
        assert_eq!(queue.submit("c").await, Err(QueueError::closed("discard")));
    }

    #[tokio::test]
    async fn test_pending_take_is_released_by_shutdown() {
        let queue = Arc::new(InMemoryTaskQueue::<u32>::unbounded("pending"));

        let taker = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.take().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!taker.is_finished());

        queue.shutdown().await;
        let result = tokio::time::timeout(Duration::from_secs(1), taker)
            .await
            .expect("take should be released")
            .unwrap();
        assert!(matches!(result, Err(QueueError::Closed { .. })));
    }

    #[tokio::test]
    async fn test_bounded_submit_waits_for_capacity() {
        let queue = Arc::new(InMemoryTaskQueue::bounded("bounded", 1));
        queue.submit(1).await.unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.submit(2).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!producer.is_finished());

        assert_eq!(queue.take().await.unwrap(), 1);
        producer.await.unwrap().unwrap();
        assert_eq!(queue.take().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_blocked_submit_fails_on_shutdown() {
        let queue = Arc::new(InMemoryTaskQueue::bounded("blocked", 1));
        queue.submit(1).await.unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.submit(2).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(queue.shutdown().await, 1);
        assert!(producer.await.unwrap().is_err());
        assert_eq!(queue.submitted_count(), 1);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let queue = InMemoryTaskQueue::<u8>::bounded("tiny", 0);
        assert_eq!(queue.capacity(), Some(1));
    }
}
