//! Events exchanged between the mediator and its components.

use serde::{Deserialize, Serialize};

use crate::models::{Envelope, OrderDetails};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSubmittedPayload {
    pub order_id: String,
    pub customer_id: String,
    pub items: Vec<String>,
    pub total_amount_cents: u64,
}

/// Order handed to the mediator for processing
pub type OrderSubmitted = Envelope<OrderSubmittedPayload>;

impl OrderSubmitted {
    pub fn submit(
        order_id: impl Into<String>,
        customer_id: impl Into<String>,
        items: Vec<String>,
        total_amount_cents: u64,
    ) -> Self {
        Envelope::new(OrderSubmittedPayload {
            order_id: order_id.into(),
            customer_id: customer_id.into(),
            items,
            total_amount_cents,
        })
    }
}

impl From<&OrderDetails> for OrderSubmittedPayload {
    fn from(details: &OrderDetails) -> Self {
        Self {
            order_id: details.order_id.clone(),
            customer_id: details.customer_id.clone(),
            items: details.items.clone(),
            total_amount_cents: details.total_amount_cents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryResult {
    pub order_id: String,
    pub available: bool,
}

pub type InventoryChecked = Envelope<InventoryResult>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub order_id: String,
    pub success: bool,
}

pub type PaymentProcessed = Envelope<PaymentResult>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingResult {
    pub order_id: String,
    pub tracking_number: String,
}

pub type ShippingArranged = Envelope<ShippingResult>;
