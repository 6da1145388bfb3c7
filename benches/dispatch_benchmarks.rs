use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use dispatch_core::bus::{handler, InProcessEventBus};
use dispatch_core::config::WorkerPoolConfig;
use dispatch_core::events::{EventCodec, JsonEventCodec};
use dispatch_core::models::{OrderEvent, OrderEventKind, OrderTask};
use dispatch_core::pool::WorkerPool;
use dispatch_core::queue::{InMemoryTaskQueue, TaskQueue};
use dispatch_core::worker::OrderWorker;

fn sample_event() -> OrderEvent {
    OrderEvent::placed(
        "ORD-BENCH",
        "CUST-1",
        vec!["Widget".to_string(), "Gadget".to_string()],
        9_999,
    )
}

fn benchmark_in_process_dispatch(c: &mut Criterion) {
    let bus = InProcessEventBus::new();
    let seen = Arc::new(AtomicU64::new(0));
    for _ in 0..3 {
        let seen = Arc::clone(&seen);
        bus.register(
            OrderEventKind::Placed,
            handler(move |_: &OrderEvent| {
                seen.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }),
        )
        .unwrap();
    }
    let event = sample_event();

    c.bench_function("in_process_dispatch_3_subscribers", |b| {
        b.iter(|| bus.dispatch(black_box(&event)).unwrap())
    });
}

fn benchmark_json_codec(c: &mut Criterion) {
    let codec = JsonEventCodec::<OrderEvent>::new();
    let event = sample_event();
    let bytes = codec.serialize(&event).unwrap();

    c.bench_function("json_codec_serialize", |b| {
        b.iter(|| codec.serialize(black_box(&event)).unwrap())
    });
    c.bench_function("json_codec_deserialize", |b| {
        b.iter(|| {
            codec
                .deserialize(black_box(&bytes), OrderEventKind::Placed)
                .unwrap()
        })
    });
}

fn benchmark_pool_throughput(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("pool_100_orders_4_workers", |b| {
        b.iter_batched(
            || {
                (1..=100)
                    .map(|i| {
                        OrderTask::for_order(
                            format!("ORD-{i}"),
                            "CUST-1",
                            vec!["Widget".to_string()],
                            1_000,
                        )
                    })
                    .collect::<Vec<_>>()
            },
            |tasks| {
                runtime.block_on(async {
                    let queue = Arc::new(InMemoryTaskQueue::unbounded("bench"));
                    let workers: Vec<Arc<OrderWorker>> = (1..=4)
                        .map(|i| Arc::new(OrderWorker::new(format!("Worker-{i}"))))
                        .collect();
                    let pool = WorkerPool::new(
                        Arc::clone(&queue),
                        workers,
                        WorkerPoolConfig {
                            worker_count: 4,
                            drain_poll_interval_ms: 1,
                            ..WorkerPoolConfig::default()
                        },
                    );
                    pool.start().unwrap();
                    for task in tasks {
                        queue.submit(task).await.unwrap();
                    }
                    pool.drain(Duration::from_secs(10)).await.unwrap();
                    pool.shutdown().await
                })
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    benchmark_in_process_dispatch,
    benchmark_json_codec,
    benchmark_pool_throughput
);
criterion_main!(benches);
