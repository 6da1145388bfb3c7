//! # Event Types
//!
//! Routing on the bus is done on a closed, enumerated tag rather than on the
//! runtime type of the event. Every event family is a sum type implementing
//! [`DomainEvent`], and its tag implements [`EventKind`].

use std::fmt::{Debug, Display};
use std::hash::Hash;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Discriminator for one variant of an event family
pub trait EventKind: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static {
    /// Stable type name; broker topics are derived from it
    fn type_name(&self) -> &'static str;

    /// Every kind of the family, in declaration order
    fn all() -> &'static [Self];
}

/// An event that can be routed by the bus
pub trait DomainEvent:
    Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Kind: EventKind;

    /// Tag used for subscription routing
    fn kind(&self) -> Self::Kind;

    /// Unique event identifier, used as the broker record key
    fn event_id(&self) -> &str;

    fn timestamp(&self) -> DateTime<Utc>;
}
