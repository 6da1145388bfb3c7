//! # System Constants
//!
//! Default values that define the operational boundaries of the event bus and
//! the worker pool. Configuration falls back to these when a value is not set.

/// Event bus defaults
pub mod bus {
    /// Interval between broker polls for each consumption loop
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

    /// Bounded wait for each consumption loop to exit on close
    pub const DEFAULT_CLOSE_TIMEOUT_MS: u64 = 3_000;

    /// Prefix for the per-subscription consumer group identifier
    pub const DEFAULT_CONSUMER_GROUP_PREFIX: &str = "subscriber";

    /// Maximum records returned by a single poll
    pub const DEFAULT_MAX_POLL_RECORDS: usize = 500;
}

/// Worker pool defaults
pub mod pool {
    /// Number of workers in the demo pool
    pub const DEFAULT_WORKER_COUNT: usize = 3;

    /// Shared deadline for all execution contexts to exit on shutdown
    pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 30_000;

    /// Polling interval used while waiting for the pool to drain
    pub const DEFAULT_DRAIN_POLL_INTERVAL_MS: u64 = 10;

    /// Wait for an aborted cooperative context to be dropped
    pub const ABORT_JOIN_GRACE_MS: u64 = 100;
}

/// Worker defaults
pub mod worker {
    /// Simulated latency of each order processing step
    pub const DEFAULT_STEP_DELAY_MS: u64 = 100;

    /// Worker names are `{DEFAULT_NAME_PREFIX}-{n}`
    pub const DEFAULT_NAME_PREFIX: &str = "Worker";
}

/// Task queue defaults
pub mod queue {
    /// Name used for logging when none is supplied
    pub const DEFAULT_QUEUE_NAME: &str = "tasks";
}

/// Order domain constants
pub mod orders {
    /// Item name the inventory component always reports as unavailable
    pub const OUT_OF_STOCK_ITEM: &str = "OutOfStockItem";

    /// Payments at or above this amount (in cents) are declined
    pub const PAYMENT_LIMIT_CENTS: u64 = 1_000_000;

    /// Prefix for generated shipment tracking numbers
    pub const TRACKING_PREFIX: &str = "TRACK-";
}

/// Configuration discovery
pub mod system {
    /// Environment variable selecting the configuration environment
    pub const ENVIRONMENT_VAR: &str = "DISPATCH_ENV";

    /// Prefix for environment variable overrides (`DISPATCH__SECTION__KEY`)
    pub const ENV_OVERRIDE_PREFIX: &str = "DISPATCH";

    /// Separator between nested keys in environment overrides
    pub const ENV_OVERRIDE_SEPARATOR: &str = "__";

    /// Default configuration directory, relative to the working directory
    pub const DEFAULT_CONFIG_DIR: &str = "config";

    /// Base name of the configuration files (`dispatch.toml`, `dispatch.test.toml`)
    pub const CONFIG_FILE_STEM: &str = "dispatch";

    /// Environment used when none is specified
    pub const DEFAULT_ENVIRONMENT: &str = "development";
}
