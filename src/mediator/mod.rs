//! # Order Processing Mediator
//!
//! Central coordinator that drives an order through inventory, payment and
//! shipping in sequence. The pipeline stops at the first failed step, so later
//! components never see an order that an earlier one rejected.

pub mod components;
pub mod events;

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

pub use components::{Component, InventoryComponent, PaymentComponent, ShippingComponent};
pub use events::{
    InventoryChecked, OrderSubmitted, OrderSubmittedPayload, PaymentProcessed, ShippingArranged,
};

/// Result of running an order through the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MediationOutcome {
    Completed { tracking_number: String },
    OutOfStock,
    PaymentDeclined,
}

impl MediationOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, MediationOutcome::Completed { .. })
    }
}

/// Coordinates components in response to an event
pub trait EventMediator: Send + Sync {
    type Event;

    fn process_event(&self, event: &Self::Event) -> MediationOutcome;
}

/// Inventory → payment → shipping pipeline
#[derive(Debug, Clone)]
pub struct OrderProcessingMediator {
    inventory: Arc<InventoryComponent>,
    payment: Arc<PaymentComponent>,
    shipping: Arc<ShippingComponent>,
}

impl Default for OrderProcessingMediator {
    fn default() -> Self {
        Self::new(
            Arc::new(InventoryComponent::new()),
            Arc::new(PaymentComponent::new()),
            Arc::new(ShippingComponent::new()),
        )
    }
}

impl OrderProcessingMediator {
    pub fn new(
        inventory: Arc<InventoryComponent>,
        payment: Arc<PaymentComponent>,
        shipping: Arc<ShippingComponent>,
    ) -> Self {
        Self {
            inventory,
            payment,
            shipping,
        }
    }

    pub fn inventory(&self) -> &InventoryComponent {
        &self.inventory
    }

    pub fn payment(&self) -> &PaymentComponent {
        &self.payment
    }

    pub fn shipping(&self) -> &ShippingComponent {
        &self.shipping
    }

    /// Run one order through the pipeline
    pub fn process(&self, order: &OrderSubmittedPayload) -> MediationOutcome {
        let order_id = order.order_id.as_str();
        info!(order_id = %order_id, "🧭 MEDIATOR: Processing order");

        let inventory = self.inventory.check_inventory(order_id, &order.items);
        if !inventory.payload().available {
            warn!(order_id = %order_id, "⚠️ MEDIATOR: Order failed, out of stock");
            return MediationOutcome::OutOfStock;
        }

        let payment = self
            .payment
            .process_payment(order_id, order.total_amount_cents);
        if !payment.payload().success {
            warn!(order_id = %order_id, "⚠️ MEDIATOR: Order failed, payment declined");
            return MediationOutcome::PaymentDeclined;
        }

        let shipment = self.shipping.arrange_shipping(order_id);
        let tracking_number = shipment.into_payload().tracking_number;
        info!(
            order_id = %order_id,
            tracking_number = %tracking_number,
            "✅ MEDIATOR: Order completed"
        );
        MediationOutcome::Completed { tracking_number }
    }
}

impl EventMediator for OrderProcessingMediator {
    type Event = OrderSubmitted;

    fn process_event(&self, event: &OrderSubmitted) -> MediationOutcome {
        self.process(event.payload())
    }
}
