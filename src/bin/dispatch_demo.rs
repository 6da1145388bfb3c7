//! Dispatch demo
//!
//! Runs the order workflow end to end: order events fanned out to subscribers
//! on the configured event bus, then order tasks drained by a worker pool.
//!
//! ```bash
//! DISPATCH_ENV=test cargo run --bin dispatch-demo
//! DISPATCH__EVENT_BUS__TRANSPORT=broker cargo run --bin dispatch-demo
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use dispatch_core::bus::{BrokerBusConfig, BrokerEventBus, EventBus, InProcessEventBus};
use dispatch_core::config::{BusTransport, ConfigManager, DispatchConfig};
use dispatch_core::logging::init_structured_logging;
use dispatch_core::messaging::InMemoryBroker;
use dispatch_core::models::{OrderEvent, OrderTask};
use dispatch_core::pool::WorkerPool;
use dispatch_core::queue::{InMemoryTaskQueue, TaskQueue};
use dispatch_core::subscribers::{
    AnalyticsSubscriber, InventorySubscriber, NotificationSubscriber, OrderPublisher,
};
use dispatch_core::worker::{OrderWorker, Worker};
use dispatch_core::JsonEventCodec;

#[tokio::main]
async fn main() -> Result<()> {
    let manager = ConfigManager::load().context("failed to load configuration")?;
    let config = manager.config();
    init_structured_logging(&config.logging);

    info!(environment = %manager.environment(), "🚀 DEMO: Starting dispatch demo");

    run_bus_demo(config).await?;
    run_pool_demo(config).await?;

    info!("🏁 DEMO: Finished");
    Ok(())
}

fn build_bus(config: &DispatchConfig) -> Arc<dyn EventBus<OrderEvent>> {
    match config.event_bus.transport {
        BusTransport::InProcess => Arc::new(InProcessEventBus::new()),
        BusTransport::Broker => {
            let broker = InMemoryBroker::with_max_poll_records(config.event_bus.max_poll_records);
            Arc::new(BrokerEventBus::new(
                Arc::new(broker),
                Arc::new(JsonEventCodec::new()),
                BrokerBusConfig::from(&config.event_bus),
            ))
        }
    }
}

async fn run_bus_demo(config: &DispatchConfig) -> Result<()> {
    let bus = build_bus(config);
    info!(transport = bus.transport_name(), "📣 DEMO: Publish/subscribe");

    let inventory = InventorySubscriber::register(bus.as_ref()).await?;
    let notifications = NotificationSubscriber::register(bus.as_ref()).await?;
    let analytics = AnalyticsSubscriber::register(bus.as_ref()).await?;

    let publisher = OrderPublisher::new(Arc::clone(&bus));
    publisher
        .place_order(
            "ORD-001",
            "CUST-42",
            vec!["Widget".to_string(), "Gadget".to_string()],
            9_999,
        )
        .await?;
    publisher.cancel_order("ORD-001", "customer request").await?;

    if config.event_bus.transport == BusTransport::Broker {
        // Broker delivery is asynchronous; give the consumption loops a few polls
        tokio::time::sleep(config.event_bus.poll_interval() * 5).await;
    }

    let report = bus.close().await?;
    info!(
        reserved = ?inventory.reserved(),
        released = ?inventory.released(),
        notifications = notifications.sent().len(),
        revenue_cents = analytics.revenue_cents(),
        stats = ?bus.stats(),
        clean_shutdown = report.is_clean(),
        "📊 DEMO: Event bus summary"
    );
    Ok(())
}

async fn run_pool_demo(config: &DispatchConfig) -> Result<()> {
    let queue = Arc::new(InMemoryTaskQueue::<OrderTask>::from_config(&config.queue));
    let workers: Vec<Arc<OrderWorker>> = (1..=config.worker_pool.worker_count)
        .map(|i| {
            Arc::new(OrderWorker::from_config(
                config.worker.worker_name(i),
                &config.worker,
            ))
        })
        .collect();

    let pool = WorkerPool::new(
        Arc::clone(&queue),
        workers.clone(),
        config.worker_pool.clone(),
    );
    pool.start()?;
    info!(workers = workers.len(), "🏊 DEMO: Worker pool");

    for i in 1..=10 {
        let task = OrderTask::for_order(
            format!("ORD-{i}"),
            format!("CUST-{}", i % 3),
            vec![format!("Item-{i}")],
            1_000 * i,
        );
        queue.submit(task).await?;
    }

    pool.drain(Duration::from_secs(30)).await?;
    let report = pool.shutdown().await;

    for worker in &workers {
        info!(
            worker = %worker.name(),
            orders = ?worker.processed_orders(),
            "DEMO: Worker audit log"
        );
    }
    info!(
        stats = ?pool.stats(),
        discarded = report.discarded,
        clean_shutdown = report.is_clean(),
        "📊 DEMO: Worker pool summary"
    );
    Ok(())
}
