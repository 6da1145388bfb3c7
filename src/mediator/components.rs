//! # Order Processing Components
//!
//! Stateless domain checks coordinated by the mediator and reused by the order
//! worker. Each component keeps an append-only log of the orders it handled.

use parking_lot::Mutex;
use tracing::debug;

use super::events::{
    InventoryChecked, InventoryResult, PaymentProcessed, PaymentResult, ShippingArranged,
    ShippingResult,
};
use crate::constants::orders::{OUT_OF_STOCK_ITEM, PAYMENT_LIMIT_CENTS, TRACKING_PREFIX};
use crate::models::Envelope;

/// A participant in order processing
pub trait Component: Send + Sync {
    fn name(&self) -> &'static str;

    /// Order ids this component handled, in call order
    fn handled_orders(&self) -> Vec<String>;
}

#[derive(Debug, Default)]
pub struct InventoryComponent {
    checked_orders: Mutex<Vec<String>>,
}

impl InventoryComponent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stock is unavailable when any item is the out-of-stock marker
    pub fn check_inventory(&self, order_id: &str, items: &[String]) -> InventoryChecked {
        debug!(order_id = %order_id, items = ?items, "📦 INVENTORY: Checking stock");
        self.checked_orders.lock().push(order_id.to_string());
        let available = !items.iter().any(|item| item == OUT_OF_STOCK_ITEM);
        Envelope::new(InventoryResult {
            order_id: order_id.to_string(),
            available,
        })
    }
}

impl Component for InventoryComponent {
    fn name(&self) -> &'static str {
        "Inventory"
    }

    fn handled_orders(&self) -> Vec<String> {
        self.checked_orders.lock().clone()
    }
}

#[derive(Debug, Default)]
pub struct PaymentComponent {
    processed_orders: Mutex<Vec<String>>,
}

impl PaymentComponent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authorizes amounts strictly below the payment limit
    pub fn process_payment(&self, order_id: &str, amount_cents: u64) -> PaymentProcessed {
        debug!(order_id = %order_id, amount_cents = amount_cents, "💳 PAYMENT: Authorizing");
        self.processed_orders.lock().push(order_id.to_string());
        Envelope::new(PaymentResult {
            order_id: order_id.to_string(),
            success: amount_cents < PAYMENT_LIMIT_CENTS,
        })
    }
}

impl Component for PaymentComponent {
    fn name(&self) -> &'static str {
        "Payment"
    }

    fn handled_orders(&self) -> Vec<String> {
        self.processed_orders.lock().clone()
    }
}

#[derive(Debug, Default)]
pub struct ShippingComponent {
    shipped_orders: Mutex<Vec<String>>,
}

impl ShippingComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arrange_shipping(&self, order_id: &str) -> ShippingArranged {
        debug!(order_id = %order_id, "🚚 SHIPPING: Arranging shipment");
        self.shipped_orders.lock().push(order_id.to_string());
        Envelope::new(ShippingResult {
            order_id: order_id.to_string(),
            tracking_number: format!("{TRACKING_PREFIX}{order_id}"),
        })
    }
}

impl Component for ShippingComponent {
    fn name(&self) -> &'static str {
        "Shipping"
    }

    fn handled_orders(&self) -> Vec<String> {
        self.shipped_orders.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_flags_out_of_stock_item() {
        let inventory = InventoryComponent::new();
        let ok = inventory.check_inventory("ORD-1", &["Widget".to_string()]);
        let missing = inventory.check_inventory(
            "ORD-2",
            &["Widget".to_string(), "OutOfStockItem".to_string()],
        );

        assert!(ok.payload().available);
        assert!(!missing.payload().available);
        assert_eq!(inventory.handled_orders(), vec!["ORD-1", "ORD-2"]);
    }

    #[test]
    fn test_payment_limit_is_exclusive() {
        let payment = PaymentComponent::new();
        assert!(payment.process_payment("ORD-1", 999_999).payload().success);
        assert!(!payment.process_payment("ORD-2", 1_000_000).payload().success);
        assert_eq!(payment.handled_orders().len(), 2);
    }

    #[test]
    fn test_tracking_number_derived_from_order() {
        let shipping = ShippingComponent::new();
        let shipment = shipping.arrange_shipping("ORD-7");
        assert_eq!(shipment.payload().tracking_number, "TRACK-ORD-7");
        assert_eq!(shipping.name(), "Shipping");
    }
}
