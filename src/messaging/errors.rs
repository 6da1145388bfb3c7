//! # Messaging Error Types
//!
//! Structured errors for the broker transport using thiserror instead of
//! `Box<dyn Error>` patterns.

use thiserror::Error;

/// Broker transport errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessagingError {
    #[error("Broker connection error: {message}")]
    Connection { message: String },

    #[error("Send failed: {topic}: {message}")]
    Send { topic: String, message: String },

    #[error("Poll failed: {topic} (group {group_id}): {message}")]
    Poll {
        topic: String,
        group_id: String,
        message: String,
    },

    #[error("Invalid topic name: {topic}: {reason}")]
    InvalidTopic { topic: String, reason: String },

    #[error("Broker transport is closed: {provider}")]
    Closed { provider: String },

    #[error("Network timeout: operation {operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Internal messaging error: {message}")]
    Internal { message: String },
}

impl MessagingError {
    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a send error
    pub fn send(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Send {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Create a poll error
    pub fn poll(
        topic: impl Into<String>,
        group_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Poll {
            topic: topic.into(),
            group_id: group_id.into(),
            message: message.into(),
        }
    }

    /// Create an invalid topic error
    pub fn invalid_topic(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTopic {
            topic: topic.into(),
            reason: reason.into(),
        }
    }

    /// Create a closed-transport error
    pub fn closed(provider: impl Into<String>) -> Self {
        Self::Closed {
            provider: provider.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether retrying the same operation later can succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Poll { .. } | Self::Timeout { .. }
        )
    }
}

/// Conversion from String to MessagingError
impl From<String> for MessagingError {
    fn from(message: String) -> Self {
        MessagingError::internal(message)
    }
}

/// Result type alias for messaging operations
pub type MessagingResult<T> = Result<T, MessagingError>;
