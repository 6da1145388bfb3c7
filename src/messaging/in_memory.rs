//! # In-Memory Broker
//!
//! Thread-safe in-memory broker implementing [`BrokerTransport`] for testing,
//! development and single-process deployments.
//!
//! ## Features
//!
//! - **Append-only topic logs**: one partition per topic, so per-topic order is preserved
//! - **Consumer groups**: committed offsets are tracked per `(group, topic)`; members of
//!   one group share them, distinct groups each see every record
//! - **Latest offset reset**: a new group starts at the end of the log (no replay)
//! - **Long polling**: `poll` parks on a [`Notify`] until records arrive or the timeout expires

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;
use tracing::{debug, info};

use super::errors::{MessagingError, MessagingResult};
use super::transport::{BrokerConsumer, BrokerRecord, BrokerTransport, DeliveryAck};
use crate::constants::bus::DEFAULT_MAX_POLL_RECORDS;

const PROVIDER_NAME: &str = "in_memory";

/// Topic log with its wake-up signal
#[derive(Debug, Default)]
struct TopicLog {
    records: Vec<BrokerRecord>,
    notify: Arc<Notify>,
}

/// Internal broker statistics tracking
#[derive(Debug, Default)]
struct BrokerStatistics {
    total_sent: AtomicU64,
    total_delivered: AtomicU64,
    consumers_created: AtomicU64,
}

/// Point-in-time broker statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrokerStats {
    pub total_sent: u64,
    pub total_delivered: u64,
    pub consumers_created: u64,
}

#[derive(Debug)]
struct BrokerState {
    /// Topic storage (topic_name -> log)
    topics: RwLock<HashMap<String, TopicLog>>,
    /// Next offset to deliver per (group_id, topic)
    offsets: Mutex<HashMap<(String, String), u64>>,
    closed: AtomicBool,
    max_poll_records: usize,
    stats: BrokerStatistics,
}

impl BrokerState {
    /// Ensure the topic exists and return its current length
    fn ensure_topic(&self, topic: &str) -> u64 {
        let mut topics = self.topics.write();
        topics.entry(topic.to_string()).or_default().records.len() as u64
    }

    fn topic_notify(&self, topic: &str) -> Option<Arc<Notify>> {
        self.topics
            .read()
            .get(topic)
            .map(|log| Arc::clone(&log.notify))
    }

    /// Take the next batch for a group and advance its committed offset
    fn fetch(&self, group_id: &str, topic: &str) -> Vec<BrokerRecord> {
        let topics = self.topics.read();
        let Some(log) = topics.get(topic) else {
            return Vec::new();
        };

        let mut offsets = self.offsets.lock();
        let next = offsets
            .entry((group_id.to_string(), topic.to_string()))
            .or_insert(log.records.len() as u64);

        let start = *next as usize;
        let end = start
            .saturating_add(self.max_poll_records)
            .min(log.records.len());
        if start >= end {
            return Vec::new();
        }

        let batch = log.records[start..end].to_vec();
        *next = end as u64;
        self.stats
            .total_delivered
            .fetch_add(batch.len() as u64, Ordering::Relaxed);
        batch
    }

    fn ensure_open(&self) -> MessagingResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(MessagingError::closed(PROVIDER_NAME));
        }
        Ok(())
    }
}

/// In-memory broker for testing and single-process use
///
/// Cloning is cheap; clones share the same topics and consumer groups.
///
/// # Example
///
/// ```rust
/// use dispatch_core::messaging::{BrokerConsumer, BrokerTransport, InMemoryBroker};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let broker = InMemoryBroker::new();
/// let mut consumer = broker.create_consumer("subscriber-a", "OrderPlaced").await?;
///
/// broker.send("OrderPlaced", "event-1", b"{}".to_vec()).await?;
///
/// let records = consumer.poll(Duration::from_millis(100)).await?;
/// assert_eq!(records.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryBroker {
    state: Arc<BrokerState>,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBroker {
    /// Create a new in-memory broker
    pub fn new() -> Self {
        Self::with_max_poll_records(DEFAULT_MAX_POLL_RECORDS)
    }

    /// Create a broker returning at most `max_poll_records` records per poll
    pub fn with_max_poll_records(max_poll_records: usize) -> Self {
        Self {
            state: Arc::new(BrokerState {
                topics: RwLock::new(HashMap::new()),
                offsets: Mutex::new(HashMap::new()),
                closed: AtomicBool::new(false),
                max_poll_records: max_poll_records.max(1),
                stats: BrokerStatistics::default(),
            }),
        }
    }

    /// Number of records ever written to a topic (for testing)
    pub fn topic_len(&self, topic: &str) -> usize {
        self.state
            .topics
            .read()
            .get(topic)
            .map(|log| log.records.len())
            .unwrap_or(0)
    }

    /// Names of all known topics, sorted
    pub fn topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.topics.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of distinct consumer groups registered on a topic
    pub fn group_count(&self, topic: &str) -> usize {
        self.state
            .offsets
            .lock()
            .keys()
            .filter(|(_, t)| t == topic)
            .count()
    }

    pub fn stats(&self) -> BrokerStats {
        BrokerStats {
            total_sent: self.state.stats.total_sent.load(Ordering::Relaxed),
            total_delivered: self.state.stats.total_delivered.load(Ordering::Relaxed),
            consumers_created: self.state.stats.consumers_created.load(Ordering::Relaxed),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl BrokerTransport for InMemoryBroker {
    async fn send(
        &self,
        topic: &str,
        key: &str,
        payload: Vec<u8>,
    ) -> MessagingResult<DeliveryAck> {
        self.state.ensure_open()?;
        if topic.is_empty() {
            return Err(MessagingError::invalid_topic(topic, "topic name is empty"));
        }

        let (offset, notify) = {
            let mut topics = self.state.topics.write();
            let log = topics.entry(topic.to_string()).or_default();
            let offset = log.records.len() as u64;
            log.records.push(BrokerRecord {
                topic: topic.to_string(),
                key: key.to_string(),
                payload,
                offset,
                timestamp: Utc::now(),
            });
            (offset, Arc::clone(&log.notify))
        };

        self.state.stats.total_sent.fetch_add(1, Ordering::Relaxed);
        notify.notify_waiters();

        debug!(topic = %topic, key = %key, offset = offset, "📤 BROKER: Record appended");

        Ok(DeliveryAck {
            topic: topic.to_string(),
            key: key.to_string(),
            offset,
        })
    }

    async fn create_consumer(
        &self,
        group_id: &str,
        topic: &str,
    ) -> MessagingResult<Box<dyn BrokerConsumer>> {
        self.state.ensure_open()?;
        if topic.is_empty() {
            return Err(MessagingError::invalid_topic(topic, "topic name is empty"));
        }

        let log_end = self.state.ensure_topic(topic);
        self.state
            .offsets
            .lock()
            .entry((group_id.to_string(), topic.to_string()))
            .or_insert(log_end);
        self.state
            .stats
            .consumers_created
            .fetch_add(1, Ordering::Relaxed);

        debug!(
            topic = %topic,
            group_id = %group_id,
            start_offset = log_end,
            "📥 BROKER: Consumer joined group"
        );

        Ok(Box::new(InMemoryConsumer {
            state: Arc::clone(&self.state),
            group_id: group_id.to_string(),
            topic: topic.to_string(),
            closed: false,
        }))
    }

    async fn close(&self) -> MessagingResult<()> {
        if self.state.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        // Wake parked polls so they observe the closed flag
        for log in self.state.topics.read().values() {
            log.notify.notify_waiters();
        }

        info!(
            total_sent = self.state.stats.total_sent.load(Ordering::Relaxed),
            "🛑 BROKER: In-memory broker closed"
        );
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Consumer handed out by [`InMemoryBroker::create_consumer`]
#[derive(Debug)]
pub struct InMemoryConsumer {
    state: Arc<BrokerState>,
    group_id: String,
    topic: String,
    closed: bool,
}

#[async_trait]
impl BrokerConsumer for InMemoryConsumer {
    async fn poll(&mut self, timeout: Duration) -> MessagingResult<Vec<BrokerRecord>> {
        if self.closed {
            return Err(MessagingError::poll(
                &self.topic,
                &self.group_id,
                "consumer is closed",
            ));
        }

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            self.state.ensure_open()?;

            let notify = self
                .state
                .topic_notify(&self.topic)
                .ok_or_else(|| MessagingError::poll(&self.topic, &self.group_id, "unknown topic"))?;
            // Register interest before fetching so a concurrent send cannot be missed
            let notified = notify.notified();

            let batch = self.state.fetch(&self.group_id, &self.topic);
            if !batch.is_empty() {
                return Ok(batch);
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(Vec::new());
            }
        }
    }

    async fn close(&mut self) {
        self.closed = true;
        debug!(
            topic = %self.topic,
            group_id = %self.group_id,
            "BROKER: Consumer closed"
        );
    }

    fn group_id(&self) -> &str {
        &self.group_id
    }

    fn topic(&self) -> &str {
        &self.topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLL: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn test_distinct_groups_each_receive_every_record() {
        let broker = InMemoryBroker::new();
        let mut a = broker.create_consumer("group-a", "topic").await.unwrap();
        let mut b = broker.create_consumer("group-b", "topic").await.unwrap();

        broker.send("topic", "k1", b"one".to_vec()).await.unwrap();
        broker.send("topic", "k2", b"two".to_vec()).await.unwrap();

        let from_a = a.poll(POLL).await.unwrap();
        let from_b = b.poll(POLL).await.unwrap();

        assert_eq!(from_a.len(), 2);
        assert_eq!(from_b.len(), 2);
        assert_eq!(from_a[0].key, "k1");
        assert_eq!(from_a[1].key, "k2");
        assert_eq!(broker.group_count("topic"), 2);
    }

    #[tokio::test]
    async fn test_same_group_shares_offsets() {
        let broker = InMemoryBroker::new();
        let mut first = broker.create_consumer("shared", "topic").await.unwrap();
        let mut second = broker.create_consumer("shared", "topic").await.unwrap();

        broker.send("topic", "k1", b"one".to_vec()).await.unwrap();

        let got_first = first.poll(POLL).await.unwrap();
        let got_second = second.poll(POLL).await.unwrap();
        assert_eq!(got_first.len() + got_second.len(), 1);
    }

    #[tokio::test]
    async fn test_new_group_starts_at_latest() {
        let broker = InMemoryBroker::new();
        broker.send("topic", "old", b"old".to_vec()).await.unwrap();

        let mut consumer = broker.create_consumer("late", "topic").await.unwrap();
        assert!(consumer.poll(POLL).await.unwrap().is_empty());

        broker.send("topic", "new", b"new".to_vec()).await.unwrap();
        let records = consumer.poll(POLL).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "new");
        assert_eq!(records[0].offset, 1);
    }

    #[tokio::test]
    async fn test_poll_wakes_on_send() {
        let broker = InMemoryBroker::new();
        let mut consumer = broker.create_consumer("g", "topic").await.unwrap();

        let producer = broker.clone();
        let sender = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            producer.send("topic", "k", b"late".to_vec()).await.unwrap();
        });

        let records = consumer.poll(Duration::from_secs(5)).await.unwrap();
        assert_eq!(records.len(), 1);
        sender.await.unwrap();
    }

    #[tokio::test]
    async fn test_max_poll_records_caps_batches() {
        let broker = InMemoryBroker::with_max_poll_records(2);
        let mut consumer = broker.create_consumer("g", "topic").await.unwrap();
        for i in 0..5 {
            broker
                .send("topic", &format!("k{i}"), Vec::new())
                .await
                .unwrap();
        }

        assert_eq!(consumer.poll(POLL).await.unwrap().len(), 2);
        assert_eq!(consumer.poll(POLL).await.unwrap().len(), 2);
        assert_eq!(consumer.poll(POLL).await.unwrap().len(), 1);
        assert_eq!(broker.stats().total_delivered, 5);
    }

    #[tokio::test]
    async fn test_closed_broker_rejects_operations() {
        let broker = InMemoryBroker::new();
        let mut consumer = broker.create_consumer("g", "topic").await.unwrap();
        broker.close().await.unwrap();

        assert!(broker.is_closed());
        assert!(matches!(
            broker.send("topic", "k", Vec::new()).await,
            Err(MessagingError::Closed { .. })
        ));
        assert!(matches!(
            broker.create_consumer("g2", "topic").await,
            Err(MessagingError::Closed { .. })
        ));
        assert!(matches!(
            consumer.poll(POLL).await,
            Err(MessagingError::Closed { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_topic_name_rejected() {
        let broker = InMemoryBroker::new();
        assert!(matches!(
            broker.send("", "k", Vec::new()).await,
            Err(MessagingError::InvalidTopic { .. })
        ));
    }
}
