//! # Dispatch Configuration
//!
//! Typed configuration for the bus, the queue, the pool and logging.
//!
//! Values are layered by [`ConfigManager`]: built-in defaults, then
//! `config/dispatch.toml`, then `config/dispatch.{environment}.toml`, then
//! `DISPATCH__SECTION__KEY` environment variables. Every section has serde
//! defaults, so any file may set only the keys it cares about.
//!
//! ```rust,no_run
//! use dispatch_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let workers = manager.config().worker_pool.worker_count;
//! let poll = manager.config().event_bus.poll_interval();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{bus, pool, queue, system, worker};
pub use crate::pool::ExecutionModel;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Root configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub environment: String,
    pub logging: LoggingConfig,
    pub event_bus: EventBusConfig,
    pub queue: QueueConfig,
    pub worker_pool: WorkerPoolConfig,
    pub worker: WorkerConfig,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            environment: system::DEFAULT_ENVIRONMENT.to_string(),
            logging: LoggingConfig::default(),
            event_bus: EventBusConfig::default(),
            queue: QueueConfig::default(),
            worker_pool: WorkerPoolConfig::default(),
            worker: WorkerConfig::default(),
        }
    }
}

impl DispatchConfig {
    /// Reject values that would make a component unusable
    pub fn validate(&self) -> ConfigResult<()> {
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigurationError::invalid_value(
                "logging.level",
                &self.logging.level,
                format!("expected one of {LOG_LEVELS:?}"),
            ));
        }

        if self.event_bus.poll_interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "event_bus.poll_interval_ms",
                0,
                "poll interval must be greater than zero",
            ));
        }
        if self.event_bus.close_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "event_bus.close_timeout_ms",
                0,
                "close timeout must be greater than zero",
            ));
        }
        if self.event_bus.consumer_group_prefix.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "consumer_group_prefix",
                "event_bus",
            ));
        }
        if self.event_bus.max_poll_records == 0 {
            return Err(ConfigurationError::invalid_value(
                "event_bus.max_poll_records",
                0,
                "at least one record must be returned per poll",
            ));
        }

        if self.queue.name.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field("name", "queue"));
        }
        if self.queue.capacity == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "queue.capacity",
                0,
                "bounded queues need room for at least one task",
            ));
        }

        if self.worker_pool.worker_count == 0 {
            return Err(ConfigurationError::invalid_value(
                "worker_pool.worker_count",
                0,
                "a pool needs at least one worker",
            ));
        }
        if self.worker_pool.shutdown_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "worker_pool.shutdown_timeout_ms",
                0,
                "shutdown timeout must be greater than zero",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set
    pub level: String,
    pub format: LogFormat,
    pub with_target: bool,
    pub with_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            with_target: true,
            with_thread_ids: false,
        }
    }
}

/// Which event bus transport the application wires up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusTransport {
    #[default]
    InProcess,
    Broker,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBusConfig {
    pub transport: BusTransport,
    pub poll_interval_ms: u64,
    pub close_timeout_ms: u64,
    pub topic_prefix: String,
    pub consumer_group_prefix: String,
    pub max_poll_records: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            transport: BusTransport::InProcess,
            poll_interval_ms: bus::DEFAULT_POLL_INTERVAL_MS,
            close_timeout_ms: bus::DEFAULT_CLOSE_TIMEOUT_MS,
            topic_prefix: String::new(),
            consumer_group_prefix: bus::DEFAULT_CONSUMER_GROUP_PREFIX.to_string(),
            max_poll_records: bus::DEFAULT_MAX_POLL_RECORDS,
        }
    }
}

impl EventBusConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub name: String,
    /// Bounded when set; unbounded otherwise
    pub capacity: Option<usize>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: queue::DEFAULT_QUEUE_NAME.to_string(),
            capacity: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    pub worker_count: usize,
    pub shutdown_timeout_ms: u64,
    pub drain_poll_interval_ms: u64,
    pub execution_model: ExecutionModel,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: pool::DEFAULT_WORKER_COUNT,
            shutdown_timeout_ms: pool::DEFAULT_SHUTDOWN_TIMEOUT_MS,
            drain_poll_interval_ms: pool::DEFAULT_DRAIN_POLL_INTERVAL_MS,
            execution_model: ExecutionModel::Cooperative,
        }
    }
}

impl WorkerPoolConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub step_delay_ms: u64,
    pub name_prefix: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: worker::DEFAULT_STEP_DELAY_MS,
            name_prefix: worker::DEFAULT_NAME_PREFIX.to_string(),
        }
    }
}

impl WorkerConfig {
    /// `{name_prefix}-{index}`, 1-based
    pub fn worker_name(&self, index: usize) -> String {
        format!("{}-{}", self.name_prefix, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = DispatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.worker_pool.worker_count, 3);
        assert_eq!(config.event_bus.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.worker.worker_name(2), "Worker-2");
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = DispatchConfig::default();
        config.worker_pool.worker_count = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidValue { ref field, .. }) if field == "worker_pool.worker_count"
        ));
    }

    #[test]
    fn test_zero_capacity_and_bad_level_rejected() {
        let mut config = DispatchConfig::default();
        config.queue.capacity = Some(0);
        assert!(config.validate().is_err());

        let mut config = DispatchConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }
}
