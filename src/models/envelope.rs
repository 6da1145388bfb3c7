//! # Envelope
//!
//! Immutable carrier shared by tasks and events: a unique identifier, the
//! creation time and a domain payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable task/event envelope
///
/// The identifier is a UUID v4 generated at construction and the creation time is
/// captured once. Fields are private so an envelope cannot change after it is
/// built; identity is the `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<P> {
    id: String,
    created_at: DateTime<Utc>,
    payload: P,
}

impl<P> Envelope<P> {
    /// Wrap a payload with a fresh identifier and the current time
    pub fn new(payload: P) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            payload,
        }
    }

    /// Rebuild an envelope from its parts (used by codecs and fixtures)
    pub fn from_parts(id: impl Into<String>, created_at: DateTime<Utc>, payload: P) -> Self {
        Self {
            id: id.into(),
            created_at,
            payload,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Consume the envelope and return the payload
    pub fn into_payload(self) -> P {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_envelope_ids_are_unique() {
        let ids: HashSet<String> = (0..1_000)
            .map(|i| Envelope::new(i).id().to_string())
            .collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn test_envelope_creation_time_is_captured_once() {
        let before = Utc::now();
        let envelope = Envelope::new("payload");
        let after = Utc::now();

        assert!(envelope.created_at() >= before);
        assert!(envelope.created_at() <= after);

        let cloned = envelope.clone();
        assert_eq!(cloned.created_at(), envelope.created_at());
        assert_eq!(cloned, envelope);
    }

    #[test]
    fn test_envelope_serde_preserves_every_field() {
        let envelope = Envelope::new(vec!["Widget".to_string(), "Gadget".to_string()]);
        let json = serde_json::to_string(&envelope).unwrap();
        let decoded: Envelope<Vec<String>> = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.id(), envelope.id());
        assert_eq!(decoded.created_at(), envelope.created_at());
        assert_eq!(decoded.payload(), envelope.payload());
    }
}
