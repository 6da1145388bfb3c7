//! # Broker Transport Traits
//!
//! Provider-agnostic contract consumed by the durable-broker event bus. A
//! transport publishes keyed byte payloads to named topics and hands out
//! consumers bound to a consumer group.
//!
//! Consumers in different groups each receive every record of a topic;
//! consumers that share a group split the records between them.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::errors::MessagingResult;

/// A record read from a topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerRecord {
    pub topic: String,
    pub key: String,
    pub payload: Vec<u8>,
    /// Position of the record in its topic log
    pub offset: u64,
    /// When the broker accepted the record
    pub timestamp: DateTime<Utc>,
}

/// Broker acknowledgement of a sent record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryAck {
    pub topic: String,
    pub key: String,
    pub offset: u64,
}

/// Producer side of a broker plus a factory for consumers
#[async_trait]
pub trait BrokerTransport: Send + Sync + 'static {
    /// Send a record and wait for the broker to acknowledge receipt
    async fn send(&self, topic: &str, key: &str, payload: Vec<u8>)
        -> MessagingResult<DeliveryAck>;

    /// Create a consumer subscribed to `topic` as a member of `group_id`
    async fn create_consumer(
        &self,
        group_id: &str,
        topic: &str,
    ) -> MessagingResult<Box<dyn BrokerConsumer>>;

    /// Release producer resources; later sends must fail
    async fn close(&self) -> MessagingResult<()>;

    /// Provider name for logging/metrics
    fn provider_name(&self) -> &'static str;
}

/// Consumer side of a broker subscription
#[async_trait]
pub trait BrokerConsumer: Send + 'static {
    /// Wait up to `timeout` for records; an empty batch means nothing arrived
    async fn poll(&mut self, timeout: Duration) -> MessagingResult<Vec<BrokerRecord>>;

    /// Leave the consumer group
    async fn close(&mut self);

    fn group_id(&self) -> &str;

    fn topic(&self) -> &str;
}
