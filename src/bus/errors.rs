//! # Event Bus Error Types

use thiserror::Error;

use crate::events::CodecError;
use crate::messaging::MessagingError;

/// Errors returned by [`EventBus`](super::EventBus) operations
#[derive(Error, Debug)]
pub enum BusError {
    #[error("Event bus is closed: {transport}")]
    Closed { transport: &'static str },

    #[error("Broker delivery error: {0}")]
    Messaging(#[from] MessagingError),

    #[error("Event codec error: {0}")]
    Codec(#[from] CodecError),
}

impl BusError {
    pub fn closed(transport: &'static str) -> Self {
        Self::Closed { transport }
    }
}

pub type BusResult<T> = Result<T, BusError>;

/// Failure reported by a subscriber's handler
///
/// Handler failures are isolated by the bus: they are logged and counted, never
/// propagated to the publisher or into a consumption loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Handler failed: {message}")]
pub struct HandlerError {
    pub message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

pub type HandlerResult = Result<(), HandlerError>;
