//! # Order Event Subscribers
//!
//! Independent reactions to order events. Each subscriber registers its
//! handlers on any [`EventBus`] carrying [`OrderEvent`] and records what it
//! observed, so the same wiring runs over either transport.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::bus::{handler, BusResult, EventBus};
use crate::models::{OrderEvent, OrderEventKind};

/// Reserves stock on placement and releases it on cancellation
#[derive(Debug, Default)]
pub struct InventorySubscriber {
    reserved: Mutex<Vec<String>>,
    released: Mutex<Vec<String>>,
}

impl InventorySubscriber {
    pub async fn register<B>(bus: &B) -> BusResult<Arc<Self>>
    where
        B: EventBus<OrderEvent> + ?Sized,
    {
        let subscriber = Arc::new(Self::default());

        let on_placed = Arc::clone(&subscriber);
        bus.subscribe(
            OrderEventKind::Placed,
            handler(move |event: &OrderEvent| {
                if let OrderEvent::Placed(placed) = event {
                    let order = placed.payload();
                    info!(order_id = %order.order_id, items = ?order.items, "📦 INVENTORY: Reserving stock");
                    on_placed.reserved.lock().push(order.order_id.clone());
                }
                Ok(())
            }),
        )
        .await?;

        let on_cancelled = Arc::clone(&subscriber);
        bus.subscribe(
            OrderEventKind::Cancelled,
            handler(move |event: &OrderEvent| {
                if let OrderEvent::Cancelled(cancelled) = event {
                    let order_id = &cancelled.payload().order_id;
                    info!(order_id = %order_id, "📦 INVENTORY: Releasing stock");
                    on_cancelled.released.lock().push(order_id.clone());
                }
                Ok(())
            }),
        )
        .await?;

        Ok(subscriber)
    }

    pub fn reserved(&self) -> Vec<String> {
        self.reserved.lock().clone()
    }

    pub fn released(&self) -> Vec<String> {
        self.released.lock().clone()
    }
}

/// A notification the subscriber would have sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    OrderConfirmation { customer_id: String, order_id: String },
    CancellationNotice { order_id: String, reason: String },
}

/// Sends customer notifications for order events
#[derive(Debug, Default)]
pub struct NotificationSubscriber {
    sent: Mutex<Vec<Notification>>,
}

impl NotificationSubscriber {
    pub async fn register<B>(bus: &B) -> BusResult<Arc<Self>>
    where
        B: EventBus<OrderEvent> + ?Sized,
    {
        let subscriber = Arc::new(Self::default());

        for kind in [OrderEventKind::Placed, OrderEventKind::Cancelled] {
            let this = Arc::clone(&subscriber);
            bus.subscribe(
                kind,
                handler(move |event: &OrderEvent| {
                    this.notify(event);
                    Ok(())
                }),
            )
            .await?;
        }

        Ok(subscriber)
    }

    fn notify(&self, event: &OrderEvent) {
        let notification = match event {
            OrderEvent::Placed(placed) => Notification::OrderConfirmation {
                customer_id: placed.payload().customer_id.clone(),
                order_id: placed.payload().order_id.clone(),
            },
            OrderEvent::Cancelled(cancelled) => Notification::CancellationNotice {
                order_id: cancelled.payload().order_id.clone(),
                reason: cancelled.payload().reason.clone(),
            },
        };
        info!(notification = ?notification, "✉️ NOTIFICATION: Sending");
        self.sent.lock().push(notification);
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }
}

/// Records revenue from placed orders
#[derive(Debug, Default)]
pub struct AnalyticsSubscriber {
    orders: AtomicU64,
    revenue_cents: AtomicU64,
}

impl AnalyticsSubscriber {
    pub async fn register<B>(bus: &B) -> BusResult<Arc<Self>>
    where
        B: EventBus<OrderEvent> + ?Sized,
    {
        let subscriber = Arc::new(Self::default());

        let this = Arc::clone(&subscriber);
        bus.subscribe(
            OrderEventKind::Placed,
            handler(move |event: &OrderEvent| {
                if let OrderEvent::Placed(placed) = event {
                    let amount = placed.payload().total_amount_cents;
                    this.orders.fetch_add(1, Ordering::Relaxed);
                    this.revenue_cents.fetch_add(amount, Ordering::Relaxed);
                    info!(amount_cents = amount, "📈 ANALYTICS: Recording sale");
                }
                Ok(())
            }),
        )
        .await?;

        Ok(subscriber)
    }

    pub fn orders_recorded(&self) -> u64 {
        self.orders.load(Ordering::Relaxed)
    }

    pub fn revenue_cents(&self) -> u64 {
        self.revenue_cents.load(Ordering::Relaxed)
    }
}

/// Publishes order lifecycle events
pub struct OrderPublisher {
    bus: Arc<dyn EventBus<OrderEvent>>,
}

impl std::fmt::Debug for OrderPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderPublisher")
            .field("transport", &self.bus.transport_name())
            .finish()
    }
}

impl OrderPublisher {
    pub fn new(bus: Arc<dyn EventBus<OrderEvent>>) -> Self {
        Self { bus }
    }

    /// Build and publish an `OrderPlaced` event, returning it
    pub async fn place_order(
        &self,
        order_id: impl Into<String>,
        customer_id: impl Into<String>,
        items: Vec<String>,
        total_amount_cents: u64,
    ) -> BusResult<OrderEvent> {
        let event = OrderEvent::placed(order_id, customer_id, items, total_amount_cents);
        info!(order_id = %event.order_id(), "📣 PUBLISHER: Publishing OrderPlaced");
        self.bus.publish(&event).await?;
        Ok(event)
    }

    pub async fn cancel_order(
        &self,
        order_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> BusResult<OrderEvent> {
        let event = OrderEvent::cancelled(order_id, reason);
        info!(order_id = %event.order_id(), "📣 PUBLISHER: Publishing OrderCancelled");
        self.bus.publish(&event).await?;
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InProcessEventBus;

    #[tokio::test]
    async fn test_subscribers_observe_order_lifecycle() {
        let bus: Arc<dyn EventBus<OrderEvent>> = Arc::new(InProcessEventBus::new());
        let inventory = InventorySubscriber::register(bus.as_ref()).await.unwrap();
        let notifications = NotificationSubscriber::register(bus.as_ref()).await.unwrap();
        let analytics = AnalyticsSubscriber::register(bus.as_ref()).await.unwrap();

        let publisher = OrderPublisher::new(Arc::clone(&bus));
        publisher
            .place_order("ORD-001", "CUST-42", vec!["Widget".into(), "Gadget".into()], 9_999)
            .await
            .unwrap();
        publisher.cancel_order("ORD-001", "customer request").await.unwrap();

        assert_eq!(inventory.reserved(), vec!["ORD-001"]);
        assert_eq!(inventory.released(), vec!["ORD-001"]);
        assert_eq!(
            notifications.sent(),
            vec![
                Notification::OrderConfirmation {
                    customer_id: "CUST-42".into(),
                    order_id: "ORD-001".into()
                },
                Notification::CancellationNotice {
                    order_id: "ORD-001".into(),
                    reason: "customer request".into()
                },
            ]
        );
        assert_eq!(analytics.orders_recorded(), 1);
        assert_eq!(analytics.revenue_cents(), 9_999);
    }
}
