use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use dispatch_core::queue::{InMemoryTaskQueue, QueueError, TaskQueue};
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_take_order_matches_submit_order(tasks in prop::collection::vec(any::<u32>(), 0..64)) {
        let taken = runtime().block_on(async {
            let queue = InMemoryTaskQueue::unbounded("fifo");
            for task in &tasks {
                queue.submit(*task).await.unwrap();
            }
            let mut taken = Vec::with_capacity(tasks.len());
            for _ in 0..tasks.len() {
                taken.push(queue.take().await.unwrap());
            }
            taken
        });

        prop_assert_eq!(taken, tasks);
    }

    #[test]
    fn prop_shutdown_discards_exactly_the_untaken(total in 0usize..40, taken in 0usize..40) {
        let taken = taken.min(total);
        let (discarded, depth_before) = runtime().block_on(async {
            let queue = InMemoryTaskQueue::bounded("discard", 64);
            for i in 0..total {
                queue.submit(i).await.unwrap();
            }
            for _ in 0..taken {
                queue.take().await.unwrap();
            }
            let depth = queue.depth();
            (queue.shutdown().await, depth)
        });

        prop_assert_eq!(depth_before, total - taken);
        prop_assert_eq!(discarded, total - taken);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_takers_each_task_delivered_once() {
    let queue = Arc::new(InMemoryTaskQueue::unbounded("shared"));
    for i in 0..200u32 {
        queue.submit(i).await.unwrap();
    }

    let takers: Vec<_> = (0..4)
        .map(|_| {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                let mut mine = Vec::new();
                while queue.depth() > 0 {
                    match tokio::time::timeout(Duration::from_millis(50), queue.take()).await {
                        Ok(Ok(task)) => mine.push(task),
                        _ => break,
                    }
                }
                mine
            })
        })
        .collect();

    let mut all = Vec::new();
    for taker in takers {
        all.extend(taker.await.unwrap());
    }

    let unique: HashSet<_> = all.iter().copied().collect();
    assert_eq!(all.len(), 200);
    assert_eq!(unique.len(), 200);
}

#[tokio::test]
async fn test_shutdown_wakes_every_waiting_taker() {
    let queue = Arc::new(InMemoryTaskQueue::<u32>::unbounded("waiters"));

    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.take().await })
        })
        .collect();
    tokio::task::yield_now().await;

    assert_eq!(queue.shutdown().await, 0);

    for waiter in waiters {
        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("taker released")
            .unwrap();
        assert_eq!(result, Err(QueueError::closed("waiters")));
    }
    assert!(matches!(queue.submit(1).await, Err(QueueError::Closed { .. })));
}

#[tokio::test]
async fn test_full_bounded_queue_releases_submitter_on_shutdown() {
    let queue = Arc::new(InMemoryTaskQueue::bounded("full", 1));
    queue.submit(1u32).await.unwrap();

    let blocked = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move { queue.submit(2).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!blocked.is_finished());

    assert_eq!(queue.shutdown().await, 1);
    let result = blocked.await.unwrap();
    assert!(result.is_err());
    assert_eq!(queue.submitted_count(), 1);
}
