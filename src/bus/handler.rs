//! # Subscription Handlers
//!
//! Handler type shared by both transports, plus the isolation wrapper that keeps
//! a failing handler from affecting any other subscription.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, warn};

use super::errors::HandlerResult;
use crate::events::DomainEvent;

/// Callback invoked for every event of a subscribed kind
pub type EventHandler<E> = Arc<dyn Fn(&E) -> HandlerResult + Send + Sync>;

/// Build an [`EventHandler`] from a closure
///
/// ```rust
/// use dispatch_core::bus::{handler, EventHandler};
/// use dispatch_core::models::OrderEvent;
///
/// let log_order: EventHandler<OrderEvent> = handler(|event: &OrderEvent| {
///     println!("received {}", event.order_id());
///     Ok(())
/// });
/// ```
pub fn handler<E, F>(f: F) -> EventHandler<E>
where
    E: DomainEvent,
    F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Outcome of one isolated handler invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    Delivered,
    Failed,
    Panicked,
}

/// Invoke a handler, containing both returned errors and panics
///
/// `subscription` is only formatted when a failure is logged.
pub(crate) fn invoke_isolated<E, S>(
    handler: &EventHandler<E>,
    event: &E,
    subscription: &S,
) -> HandlerOutcome
where
    E: DomainEvent,
    S: fmt::Display + ?Sized,
{
    match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
        Ok(Ok(())) => HandlerOutcome::Delivered,
        Ok(Err(e)) => {
            warn!(
                subscription = %subscription,
                event_id = %event.event_id(),
                event_kind = %event.kind(),
                error = %e,
                "⚠️ BUS: Handler returned an error"
            );
            HandlerOutcome::Failed
        }
        Err(payload) => {
            error!(
                subscription = %subscription,
                event_id = %event.event_id(),
                event_kind = %event.kind(),
                panic = %panic_message(payload.as_ref()),
                "❌ BUS: Handler panicked"
            );
            HandlerOutcome::Panicked
        }
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Lock-free delivery counters shared by a bus and its consumption loops
#[derive(Debug, Default)]
pub(crate) struct AtomicBusStats {
    published: AtomicU64,
    delivered: AtomicU64,
    handler_failures: AtomicU64,
    decode_failures: AtomicU64,
    poll_failures: AtomicU64,
}

impl AtomicBusStats {
    #[inline]
    pub(crate) fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_outcome(&self, outcome: HandlerOutcome) {
        match outcome {
            HandlerOutcome::Delivered => self.delivered.fetch_add(1, Ordering::Relaxed),
            HandlerOutcome::Failed | HandlerOutcome::Panicked => {
                self.handler_failures.fetch_add(1, Ordering::Relaxed)
            }
        };
    }

    #[inline]
    pub(crate) fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_poll_failure(&self) {
        self.poll_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> BusStats {
        BusStats {
            published: self.published.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            poll_failures: self.poll_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time bus statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BusStats {
    pub published: u64,
    pub delivered: u64,
    pub handler_failures: u64,
    pub decode_failures: u64,
    pub poll_failures: u64,
}
