//! # Order Domain Models
//!
//! Payloads for the order workflow: the task handed to the worker pool and the
//! two events published on the bus.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::envelope::Envelope;
use crate::events::{DomainEvent, EventKind};

/// Order fields carried by a pool task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order_id: String,
    pub customer_id: String,
    pub items: Vec<String>,
    pub total_amount_cents: u64,
}

/// Unit of work processed by the worker pool
pub type OrderTask = Envelope<OrderDetails>;

impl OrderTask {
    /// Build a task for an order
    pub fn for_order(
        order_id: impl Into<String>,
        customer_id: impl Into<String>,
        items: Vec<String>,
        total_amount_cents: u64,
    ) -> Self {
        Envelope::new(OrderDetails {
            order_id: order_id.into(),
            customer_id: customer_id.into(),
            items,
            total_amount_cents,
        })
    }

    pub fn order_id(&self) -> &str {
        &self.payload().order_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: String,
    pub customer_id: String,
    pub items: Vec<String>,
    pub total_amount_cents: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order_id: String,
    pub reason: String,
}

/// Tag for [`OrderEvent`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderEventKind {
    Placed,
    Cancelled,
}

impl EventKind for OrderEventKind {
    fn type_name(&self) -> &'static str {
        match self {
            OrderEventKind::Placed => "OrderPlaced",
            OrderEventKind::Cancelled => "OrderCancelled",
        }
    }

    fn all() -> &'static [Self] {
        &[OrderEventKind::Placed, OrderEventKind::Cancelled]
    }
}

impl fmt::Display for OrderEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Order lifecycle events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum OrderEvent {
    #[serde(rename = "OrderPlaced")]
    Placed(Envelope<OrderPlaced>),
    #[serde(rename = "OrderCancelled")]
    Cancelled(Envelope<OrderCancelled>),
}

impl OrderEvent {
    pub fn placed(
        order_id: impl Into<String>,
        customer_id: impl Into<String>,
        items: Vec<String>,
        total_amount_cents: u64,
    ) -> Self {
        OrderEvent::Placed(Envelope::new(OrderPlaced {
            order_id: order_id.into(),
            customer_id: customer_id.into(),
            items,
            total_amount_cents,
        }))
    }

    pub fn cancelled(order_id: impl Into<String>, reason: impl Into<String>) -> Self {
        OrderEvent::Cancelled(Envelope::new(OrderCancelled {
            order_id: order_id.into(),
            reason: reason.into(),
        }))
    }

    pub fn order_id(&self) -> &str {
        match self {
            OrderEvent::Placed(e) => &e.payload().order_id,
            OrderEvent::Cancelled(e) => &e.payload().order_id,
        }
    }
}

impl DomainEvent for OrderEvent {
    type Kind = OrderEventKind;

    fn kind(&self) -> OrderEventKind {
        match self {
            OrderEvent::Placed(_) => OrderEventKind::Placed,
            OrderEvent::Cancelled(_) => OrderEventKind::Cancelled,
        }
    }

    fn event_id(&self) -> &str {
        match self {
            OrderEvent::Placed(e) => e.id(),
            OrderEvent::Cancelled(e) => e.id(),
        }
    }

    fn timestamp(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::Placed(e) => e.created_at(),
            OrderEvent::Cancelled(e) => e.created_at(),
        }
    }
}
