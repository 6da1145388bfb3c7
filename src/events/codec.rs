//! # Event Codec
//!
//! Serialization contract used by the durable-broker transport. The codec must
//! round-trip every field of an event, timestamps included.

use std::marker::PhantomData;

use thiserror::Error;

use super::types::{DomainEvent, EventKind};

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Event serialization error: {message}")]
    Serialization { message: String },

    #[error("Event deserialization error: {message}")]
    Deserialization { message: String },

    #[error("Event kind mismatch: expected {expected}, decoded {actual}")]
    KindMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

impl CodecError {
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::Deserialization {
            message: message.into(),
        }
    }
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Converts events to and from broker payload bytes
pub trait EventCodec<E: DomainEvent>: Send + Sync {
    fn serialize(&self, event: &E) -> CodecResult<Vec<u8>>;

    /// Decode `bytes` into an event of the declared kind
    fn deserialize(&self, bytes: &[u8], kind: E::Kind) -> CodecResult<E>;

    fn content_type(&self) -> &'static str;
}

/// JSON codec backed by serde_json
#[derive(Debug)]
pub struct JsonEventCodec<E> {
    _event: PhantomData<fn() -> E>,
}

impl<E> JsonEventCodec<E> {
    pub fn new() -> Self {
        Self {
            _event: PhantomData,
        }
    }
}

impl<E> Default for JsonEventCodec<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for JsonEventCodec<E> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<E: DomainEvent> EventCodec<E> for JsonEventCodec<E> {
    fn serialize(&self, event: &E) -> CodecResult<Vec<u8>> {
        serde_json::to_vec(event).map_err(|e| CodecError::serialization(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8], kind: E::Kind) -> CodecResult<E> {
        let event: E = serde_json::from_slice(bytes)
            .map_err(|e| CodecError::deserialization(e.to_string()))?;

        if event.kind() != kind {
            return Err(CodecError::KindMismatch {
                expected: kind.type_name(),
                actual: event.kind().type_name(),
            });
        }

        Ok(event)
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}
