//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use dispatch_core::bus::{handler, BrokerBusConfig, EventHandler};
use dispatch_core::config::WorkerPoolConfig;
use dispatch_core::models::{OrderEvent, OrderTask};
use dispatch_core::worker::OrderWorker;

/// Tasks `ORD-1` ..= `ORD-{count}`
pub fn order_tasks(count: usize) -> Vec<OrderTask> {
    (1..=count)
        .map(|i| {
            OrderTask::for_order(
                format!("ORD-{i}"),
                format!("CUST-{}", i % 4),
                vec![format!("Item-{i}")],
                1_000 * i as u64,
            )
        })
        .collect()
}

/// Workers named `Worker-1` ..= `Worker-{count}`
pub fn order_workers(count: usize, step_delay: Duration) -> Vec<Arc<OrderWorker>> {
    (1..=count)
        .map(|i| Arc::new(OrderWorker::new(format!("Worker-{i}")).with_step_delay(step_delay)))
        .collect()
}

pub fn pool_config() -> WorkerPoolConfig {
    WorkerPoolConfig {
        shutdown_timeout_ms: 2_000,
        drain_poll_interval_ms: 5,
        ..WorkerPoolConfig::default()
    }
}

pub fn fast_broker_config() -> BrokerBusConfig {
    BrokerBusConfig {
        poll_interval: Duration::from_millis(20),
        close_timeout: Duration::from_millis(1_000),
        ..BrokerBusConfig::default()
    }
}

/// Thread-safe log of `"{tag}:{event_type}:{order_id}"` entries
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn recording_handler(log: &EventLog, tag: &str) -> EventHandler<OrderEvent> {
    let log = Arc::clone(log);
    let tag = tag.to_string();
    handler(move |event: &OrderEvent| {
        let event_type = match event {
            OrderEvent::Placed(_) => "placed",
            OrderEvent::Cancelled(_) => "cancelled",
        };
        log.lock()
            .push(format!("{tag}:{event_type}:{}", event.order_id()));
        Ok(())
    })
}

/// Poll `condition` until it holds or `timeout` elapses
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
