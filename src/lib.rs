#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Dispatch Core
//!
//! Asynchronous dispatch substrate for event-driven services: a type-routed
//! event bus and a queue-backed worker pool.
//!
//! ## Overview
//!
//! Two delivery styles share one set of domain types:
//!
//! - **Publish/subscribe**: an [`EventBus`](bus::EventBus) routes each event to
//!   every handler subscribed to its kind. The in-process transport delivers
//!   synchronously on the publisher's thread; the broker transport writes one
//!   topic per kind and gives each subscription its own consumer group and
//!   consumption loop.
//! - **Point-to-point**: a [`WorkerPool`](pool::WorkerPool) runs one execution
//!   context per worker, each taking tasks from a shared
//!   [`TaskQueue`](queue::TaskQueue). Every task that is taken is processed by
//!   exactly one worker.
//!
//! ## Module Organization
//!
//! - [`models`] - Envelope, order task and order events
//! - [`events`] - Event kind/routing traits and the payload codec
//! - [`messaging`] - Broker transport contract and in-memory broker
//! - [`bus`] - In-process and broker event buses
//! - [`queue`] - FIFO task queue
//! - [`worker`] - Worker contract and the order worker
//! - [`pool`] - Worker pool lifecycle
//! - [`mediator`] - Order processing pipeline and components
//! - [`subscribers`] - Order event subscribers and publisher
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging setup
//! - [`error`] - Crate-level error handling
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use dispatch_core::bus::{EventBus, InProcessEventBus};
//! use dispatch_core::models::OrderEvent;
//! use dispatch_core::subscribers::{InventorySubscriber, OrderPublisher};
//!
//! # #[tokio::main]
//! # async fn main() -> dispatch_core::Result<()> {
//! let bus: Arc<dyn EventBus<OrderEvent>> = Arc::new(InProcessEventBus::new());
//! let inventory = InventorySubscriber::register(bus.as_ref()).await?;
//!
//! let publisher = OrderPublisher::new(Arc::clone(&bus));
//! publisher
//!     .place_order("ORD-001", "CUST-42", vec!["Widget".into()], 9_999)
//!     .await?;
//!
//! assert_eq!(inventory.reserved(), vec!["ORD-001"]);
//! bus.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod bus;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod mediator;
pub mod messaging;
pub mod models;
pub mod pool;
pub mod queue;
pub mod shutdown;
pub mod subscribers;
pub mod worker;

pub use bus::{BrokerEventBus, EventBus, InProcessEventBus};
pub use config::{ConfigManager, DispatchConfig};
pub use error::{DispatchError, Result};
pub use events::{DomainEvent, EventKind, JsonEventCodec};
pub use messaging::InMemoryBroker;
pub use models::{Envelope, OrderEvent, OrderEventKind, OrderTask};
pub use pool::{ExecutionModel, PoolStats, WorkerPool};
pub use queue::{InMemoryTaskQueue, TaskQueue};
pub use shutdown::ShutdownReport;
pub use worker::{OrderWorker, Worker};
