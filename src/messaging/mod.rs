//! # Messaging Module
//!
//! Broker transport contract for the durable-broker event bus, with an in-memory
//! provider.

pub mod errors;
pub mod in_memory;
pub mod transport;

pub use errors::{MessagingError, MessagingResult};
pub use in_memory::{BrokerStats, InMemoryBroker, InMemoryConsumer};
pub use transport::{BrokerConsumer, BrokerRecord, BrokerTransport, DeliveryAck};
