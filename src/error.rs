//! Crate-level error type aggregating the per-module errors.

use thiserror::Error;

use crate::bus::BusError;
use crate::config::ConfigurationError;
use crate::events::CodecError;
use crate::messaging::MessagingError;
use crate::pool::PoolError;
use crate::queue::QueueError;
use crate::worker::WorkerError;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Event bus error: {0}")]
    Bus(#[from] BusError),

    #[error("Messaging error: {0}")]
    Messaging(#[from] MessagingError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Worker pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
