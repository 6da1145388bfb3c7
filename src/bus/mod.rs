//! # Event Bus
//!
//! Type-routed publish/subscribe with two transports sharing one contract:
//!
//! ```text
//! EventBus<E> (trait)
//!   ├── InProcessEventBus<E>   <- synchronous fan-out on the publisher's thread
//!   └── BrokerEventBus<E>      <- one topic per kind, one consumer group per subscription
//! ```
//!
//! Routing uses the event's [`EventKind`](crate::events::EventKind) tag. A
//! subscription only sees events published after it was registered.
//!
//! Handler failures are isolated on both transports: an error or panic in one
//! handler is logged and counted, and every other handler still receives the
//! event.

mod broker;
mod errors;
mod handler;
mod in_process;

use async_trait::async_trait;

use crate::events::DomainEvent;
use crate::shutdown::ShutdownReport;

pub use broker::{BrokerBusConfig, BrokerEventBus};
pub use errors::{BusError, BusResult, HandlerError, HandlerResult};
pub use handler::{handler, BusStats, EventHandler, HandlerOutcome};
pub(crate) use handler::panic_message;
pub use in_process::{DeliveryReport, InProcessEventBus};

/// Transport-agnostic event bus contract
#[async_trait]
pub trait EventBus<E: DomainEvent>: Send + Sync {
    /// Register `handler` for every future event of `kind`
    async fn subscribe(&self, kind: E::Kind, handler: EventHandler<E>) -> BusResult<()>;

    /// Deliver `event` to every handler subscribed to its kind
    ///
    /// In-process: returns after all handlers ran. Broker: returns once the
    /// broker acknowledged the record.
    async fn publish(&self, event: &E) -> BusResult<()>;

    /// Stop delivery and release resources; later calls to `publish` fail
    async fn close(&self) -> BusResult<ShutdownReport>;

    fn stats(&self) -> BusStats;

    /// Transport name for logging
    fn transport_name(&self) -> &'static str;
}
