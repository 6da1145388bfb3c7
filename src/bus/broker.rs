//! # Broker Event Bus
//!
//! Durable-broker transport for the [`EventBus`] contract.
//!
//! Each event kind maps to one topic (`{topic_prefix}{type_name}`). Every
//! subscription gets its own consumer group, so independent subscriptions each
//! receive every event, and a spawned consumption loop that polls the broker
//! and decodes records with the bus codec.
//!
//! Handlers are synchronous, so each invocation runs on the blocking pool and
//! the loop awaits it before taking the next record. A slow handler stalls only
//! its own subscription; records within one subscription stay in offset order.
//!
//! `publish` only waits for the broker acknowledgement. Handlers run later on
//! their loop, so publishing never blocks on subscriber work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::errors::{BusError, BusResult};
use super::handler::{invoke_isolated, AtomicBusStats, BusStats, EventHandler, HandlerOutcome};
use super::EventBus;
use crate::config::EventBusConfig;
use crate::constants::bus::{
    DEFAULT_CLOSE_TIMEOUT_MS, DEFAULT_CONSUMER_GROUP_PREFIX, DEFAULT_POLL_INTERVAL_MS,
};
use crate::events::{DomainEvent, EventCodec, EventKind};
use crate::messaging::{BrokerConsumer, BrokerTransport, MessagingError};
use crate::shutdown::ShutdownReport;

const TRANSPORT_NAME: &str = "broker";

/// Tuning for [`BrokerEventBus`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerBusConfig {
    /// Upper bound on each broker poll; also the back-off after a poll failure
    pub poll_interval: Duration,
    /// Bounded wait for consumption loops to exit on close
    pub close_timeout: Duration,
    /// Prepended to the event type name to form the topic
    pub topic_prefix: String,
    /// Consumer groups are named `{consumer_group_prefix}-{uuid}`
    pub consumer_group_prefix: String,
}

impl Default for BrokerBusConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            close_timeout: Duration::from_millis(DEFAULT_CLOSE_TIMEOUT_MS),
            topic_prefix: String::new(),
            consumer_group_prefix: DEFAULT_CONSUMER_GROUP_PREFIX.to_string(),
        }
    }
}

impl From<&EventBusConfig> for BrokerBusConfig {
    fn from(config: &EventBusConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            close_timeout: Duration::from_millis(config.close_timeout_ms),
            topic_prefix: config.topic_prefix.clone(),
            consumer_group_prefix: config.consumer_group_prefix.clone(),
        }
    }
}

struct ConsumerLoopHandle {
    topic: String,
    group_id: String,
    handle: JoinHandle<()>,
}

enum LoopExit {
    Stopped,
    Failed(String),
    TimedOut(String),
}

/// Event bus backed by a durable message broker
pub struct BrokerEventBus<E: DomainEvent> {
    transport: Arc<dyn BrokerTransport>,
    codec: Arc<dyn EventCodec<E>>,
    config: BrokerBusConfig,
    cancel: CancellationToken,
    loops: Mutex<Vec<ConsumerLoopHandle>>,
    closed: AtomicBool,
    stats: Arc<AtomicBusStats>,
}

impl<E: DomainEvent> std::fmt::Debug for BrokerEventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerEventBus")
            .field("provider", &self.transport.provider_name())
            .field("config", &self.config)
            .field("subscriptions", &self.loops.lock().len())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

impl<E: DomainEvent> BrokerEventBus<E> {
    pub fn new(
        transport: Arc<dyn BrokerTransport>,
        codec: Arc<dyn EventCodec<E>>,
        config: BrokerBusConfig,
    ) -> Self {
        info!(
            provider = transport.provider_name(),
            content_type = codec.content_type(),
            poll_interval_ms = config.poll_interval.as_millis() as u64,
            "🔌 BUS: Broker event bus created"
        );
        Self {
            transport,
            codec,
            config,
            cancel: CancellationToken::new(),
            loops: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            stats: Arc::new(AtomicBusStats::default()),
        }
    }

    /// Topic that carries events of `kind`
    pub fn topic_for(&self, kind: E::Kind) -> String {
        format!("{}{}", self.config.topic_prefix, kind.type_name())
    }

    /// Consumer group ids of the active subscriptions, in subscription order
    pub fn consumer_groups(&self) -> Vec<String> {
        self.loops
            .lock()
            .iter()
            .map(|l| l.group_id.clone())
            .collect()
    }

    pub fn subscription_count(&self) -> usize {
        self.loops.lock().len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &BrokerBusConfig {
        &self.config
    }

    fn ensure_open(&self) -> BusResult<()> {
        if self.is_closed() {
            return Err(BusError::closed(TRANSPORT_NAME));
        }
        Ok(())
    }
}

#[async_trait]
impl<E: DomainEvent> EventBus<E> for BrokerEventBus<E> {
    #[instrument(skip(self, handler), fields(event_kind = %kind))]
    async fn subscribe(&self, kind: E::Kind, handler: EventHandler<E>) -> BusResult<()> {
        self.ensure_open()?;

        let topic = self.topic_for(kind);
        let group_id = format!("{}-{}", self.config.consumer_group_prefix, Uuid::new_v4());
        let consumer = self.transport.create_consumer(&group_id, &topic).await?;

        // Registration and close are serialized on the loop list
        let registered = {
            let mut loops = self.loops.lock();
            if self.is_closed() {
                Err(consumer)
            } else {
                let handle = tokio::spawn(run_consumer_loop(
                    consumer,
                    kind,
                    handler,
                    Arc::clone(&self.codec),
                    Arc::clone(&self.stats),
                    self.cancel.child_token(),
                    self.config.poll_interval,
                ));
                loops.push(ConsumerLoopHandle {
                    topic: topic.clone(),
                    group_id: group_id.clone(),
                    handle,
                });
                Ok(loops.len())
            }
        };

        let subscriptions = match registered {
            Ok(count) => count,
            Err(mut consumer) => {
                consumer.close().await;
                return Err(BusError::closed(TRANSPORT_NAME));
            }
        };

        info!(
            topic = %topic,
            group_id = %group_id,
            subscriptions = subscriptions,
            "📚 BUS: Broker subscription started"
        );
        Ok(())
    }

    async fn publish(&self, event: &E) -> BusResult<()> {
        self.ensure_open()?;

        let topic = self.topic_for(event.kind());
        let payload = self.codec.serialize(event)?;
        let ack = self
            .transport
            .send(&topic, event.event_id(), payload)
            .await?;
        self.stats.record_published();

        debug!(
            topic = %ack.topic,
            event_id = %ack.key,
            offset = ack.offset,
            "📣 BUS: Event acknowledged by broker"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn close(&self) -> BusResult<ShutdownReport> {
        let started = std::time::Instant::now();
        let mut report = ShutdownReport::new("broker_bus");

        let handles = {
            let mut loops = self.loops.lock();
            if self.closed.swap(true, Ordering::AcqRel) {
                return Ok(report);
            }
            std::mem::take(&mut *loops)
        };

        info!(
            subscriptions = handles.len(),
            timeout_ms = self.config.close_timeout.as_millis() as u64,
            "🛑 BUS: Closing broker event bus"
        );
        self.cancel.cancel();

        let deadline = Instant::now() + self.config.close_timeout;
        let exits = join_all(handles.into_iter().map(|consumer_loop| async move {
            let ConsumerLoopHandle {
                topic,
                group_id,
                mut handle,
            } = consumer_loop;
            match timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => LoopExit::Stopped,
                Ok(Err(e)) => {
                    error!(topic = %topic, group_id = %group_id, error = %e, "❌ BUS: Consumption loop terminated abnormally");
                    LoopExit::Failed(group_id)
                }
                Err(_) => {
                    warn!(topic = %topic, group_id = %group_id, "⚠️ BUS: Consumption loop did not stop in time; aborting");
                    handle.abort();
                    LoopExit::TimedOut(group_id)
                }
            }
        }))
        .await;

        for exit in exits {
            match exit {
                LoopExit::Stopped => report.stopped += 1,
                LoopExit::Failed(group_id) => report.failed.push(group_id),
                LoopExit::TimedOut(group_id) => report.timed_out.push(group_id),
            }
        }

        if let Err(e) = self.transport.close().await {
            warn!(
                provider = self.transport.provider_name(),
                error = %e,
                "⚠️ BUS: Broker transport close failed"
            );
            report.failed.push(self.transport.provider_name().to_string());
        }

        report.elapsed = started.elapsed();
        info!(
            stopped = report.stopped,
            timed_out = report.timed_out.len(),
            failed = report.failed.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "✅ BUS: Broker event bus closed"
        );
        Ok(report)
    }

    fn stats(&self) -> BusStats {
        self.stats.snapshot()
    }

    fn transport_name(&self) -> &'static str {
        TRANSPORT_NAME
    }
}

async fn run_consumer_loop<E: DomainEvent>(
    mut consumer: Box<dyn BrokerConsumer>,
    kind: E::Kind,
    handler: EventHandler<E>,
    codec: Arc<dyn EventCodec<E>>,
    stats: Arc<AtomicBusStats>,
    cancel: CancellationToken,
    poll_interval: Duration,
) {
    let subscription: Arc<str> = Arc::from(consumer.group_id());
    debug!(group_id = %subscription, topic = %consumer.topic(), "🔄 BUS: Consumption loop started");

    loop {
        let polled = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            polled = consumer.poll(poll_interval) => polled,
        };

        match polled {
            Ok(records) => {
                for record in records {
                    match codec.deserialize(&record.payload, kind) {
                        Ok(event) => {
                            let outcome =
                                deliver(Arc::clone(&handler), event, Arc::clone(&subscription))
                                    .await;
                            stats.record_outcome(outcome);
                        }
                        Err(e) => {
                            stats.record_decode_failure();
                            warn!(
                                group_id = %subscription,
                                topic = %record.topic,
                                offset = record.offset,
                                error = %e,
                                "⚠️ BUS: Skipping undecodable record"
                            );
                        }
                    }
                }
            }
            Err(MessagingError::Closed { provider }) => {
                debug!(group_id = %subscription, provider = %provider, "BUS: Broker closed under consumption loop");
                break;
            }
            Err(e) => {
                stats.record_poll_failure();
                warn!(group_id = %subscription, error = %e, "⚠️ BUS: Poll failed; retrying");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(poll_interval) => {}
                }
            }
        }
    }

    consumer.close().await;
    debug!(group_id = %subscription, "BUS: Consumption loop stopped");
}

/// Run one handler invocation on the blocking pool and wait for it
async fn deliver<E: DomainEvent>(
    handler: EventHandler<E>,
    event: E,
    subscription: Arc<str>,
) -> HandlerOutcome {
    let task = tokio::task::spawn_blocking(move || {
        invoke_isolated(&handler, &event, subscription.as_ref())
    });
    match task.await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "❌ BUS: Handler task did not complete");
            HandlerOutcome::Panicked
        }
    }
}
