//! # In-Process Event Bus
//!
//! Same-process fan-out keyed by event kind. `publish` runs every matching
//! handler on the caller's thread, in subscription order, before returning.
//!
//! The registry maps each kind to an append-only handler list stored behind an
//! `Arc`. `subscribe` swaps in a new list (copy-on-write), so a publish always
//! iterates a stable snapshot and never holds a map guard while handlers run.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, info};

use super::errors::{BusError, BusResult};
use super::handler::{invoke_isolated, AtomicBusStats, BusStats, EventHandler, HandlerOutcome};
use super::EventBus;
use crate::events::{DomainEvent, EventKind};
use crate::shutdown::ShutdownReport;

const TRANSPORT_NAME: &str = "in_process";

/// Per-publish delivery summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Handlers that completed successfully
    pub delivered: usize,
    /// Handlers that returned an error or panicked
    pub failed: usize,
}

impl DeliveryReport {
    pub fn handler_count(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Position of a handler in a kind's subscription list, shown as `{type_name}#{index}`
#[derive(Debug, Clone, Copy)]
struct HandlerSlot<K> {
    kind: K,
    index: usize,
}

impl<K: EventKind> fmt::Display for HandlerSlot<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind.type_name(), self.index)
    }
}

/// Synchronous, same-process event bus
///
/// # Example
///
/// ```rust
/// use dispatch_core::bus::{handler, InProcessEventBus};
/// use dispatch_core::models::{OrderEvent, OrderEventKind};
///
/// let bus = InProcessEventBus::<OrderEvent>::new();
/// bus.register(OrderEventKind::Placed, handler(|event: &OrderEvent| {
///     println!("reserving stock for {}", event.order_id());
///     Ok(())
/// })).unwrap();
///
/// let report = bus
///     .dispatch(&OrderEvent::placed("ORD-1", "CUST-42", vec!["Widget".into()], 9_999))
///     .unwrap();
/// assert_eq!(report.delivered, 1);
/// ```
pub struct InProcessEventBus<E: DomainEvent> {
    subscribers: DashMap<E::Kind, Arc<Vec<EventHandler<E>>>>,
    closed: AtomicBool,
    stats: AtomicBusStats,
}

impl<E: DomainEvent> std::fmt::Debug for InProcessEventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InProcessEventBus")
            .field("kinds", &self.subscribers.len())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

impl<E: DomainEvent> Default for InProcessEventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: DomainEvent> InProcessEventBus<E> {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
            closed: AtomicBool::new(false),
            stats: AtomicBusStats::default(),
        }
    }

    /// Synchronous registration; appends `handler` to the list for `kind`
    pub fn register(&self, kind: E::Kind, handler: EventHandler<E>) -> BusResult<()> {
        self.ensure_open()?;

        let mut entry = self.subscribers.entry(kind).or_default();
        let list = entry.value_mut();
        let mut next: Vec<EventHandler<E>> = Vec::with_capacity(list.len() + 1);
        next.extend(list.iter().cloned());
        next.push(handler);
        let count = next.len();
        *list = Arc::new(next);
        drop(entry);

        debug!(
            event_kind = %kind,
            subscriber_count = count,
            "📚 BUS: Subscription registered"
        );
        Ok(())
    }

    /// Synchronous fan-out to every handler subscribed to the event's kind
    ///
    /// Publishing a kind with no subscribers is a no-op. A handler that fails
    /// does not prevent later handlers from running.
    pub fn dispatch(&self, event: &E) -> BusResult<DeliveryReport> {
        self.ensure_open()?;
        self.stats.record_published();

        let kind = event.kind();
        let snapshot = self
            .subscribers
            .get(&kind)
            .map(|entry| Arc::clone(entry.value()));

        let Some(handlers) = snapshot else {
            debug!(event_kind = %kind, event_id = %event.event_id(), "BUS: No subscribers");
            return Ok(DeliveryReport::default());
        };

        let mut report = DeliveryReport::default();
        for (index, handler) in handlers.iter().enumerate() {
            let outcome = invoke_isolated(handler, event, &HandlerSlot { kind, index });
            self.stats.record_outcome(outcome);
            match outcome {
                HandlerOutcome::Delivered => report.delivered += 1,
                HandlerOutcome::Failed | HandlerOutcome::Panicked => report.failed += 1,
            }
        }

        debug!(
            event_kind = %kind,
            event_id = %event.event_id(),
            delivered = report.delivered,
            failed = report.failed,
            "📣 BUS: Event dispatched"
        );
        Ok(report)
    }

    /// Number of handlers currently subscribed to `kind`
    pub fn subscriber_count(&self, kind: E::Kind) -> usize {
        self.subscribers
            .get(&kind)
            .map(|entry| entry.value().len())
            .unwrap_or(0)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> BusResult<()> {
        if self.is_closed() {
            return Err(BusError::closed(TRANSPORT_NAME));
        }
        Ok(())
    }
}

#[async_trait]
impl<E: DomainEvent> EventBus<E> for InProcessEventBus<E> {
    async fn subscribe(&self, kind: E::Kind, handler: EventHandler<E>) -> BusResult<()> {
        self.register(kind, handler)
    }

    async fn publish(&self, event: &E) -> BusResult<()> {
        self.dispatch(event).map(|_| ())
    }

    async fn close(&self) -> BusResult<ShutdownReport> {
        let started = Instant::now();
        let mut report = ShutdownReport::new(TRANSPORT_NAME);
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(report);
        }

        for kind in E::Kind::all() {
            let count = self.subscriber_count(*kind);
            if count > 0 {
                debug!(event_kind = %kind, subscriptions = count, "BUS: Releasing subscriptions");
            }
            report.stopped += count;
        }
        self.subscribers.clear();
        report.elapsed = started.elapsed();

        info!(
            subscriptions = report.stopped,
            "🛑 BUS: In-process event bus closed"
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
