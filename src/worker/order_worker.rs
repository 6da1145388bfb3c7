use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::{Worker, WorkerError, WorkerResult};
use crate::config::WorkerConfig;
use crate::mediator::{MediationOutcome, OrderProcessingMediator};
use crate::models::OrderTask;

/// Outcome of one processed order
pub type OrderOutcome = MediationOutcome;

/// Runs orders through inventory, payment and shipping
///
/// Every task handed to [`Worker::process`] is appended to the worker's audit
/// log as `(task_id, order_id)`, including rejected ones.
#[derive(Debug)]
pub struct OrderWorker {
    name: String,
    mediator: OrderProcessingMediator,
    step_delay: Duration,
    audit_log: Mutex<Vec<(String, String)>>,
}

impl OrderWorker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mediator: OrderProcessingMediator::default(),
            step_delay: Duration::ZERO,
            audit_log: Mutex::new(Vec::new()),
        }
    }

    pub fn from_config(name: impl Into<String>, config: &WorkerConfig) -> Self {
        Self::new(name).with_step_delay(Duration::from_millis(config.step_delay_ms))
    }

    /// Simulated latency before each step
    pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
        self.step_delay = step_delay;
        self
    }

    /// Share components (and their logs) with other workers
    pub fn with_mediator(mut self, mediator: OrderProcessingMediator) -> Self {
        self.mediator = mediator;
        self
    }

    pub fn processed_orders(&self) -> Vec<String> {
        self.audit_log
            .lock()
            .iter()
            .map(|(_, order_id)| order_id.clone())
            .collect()
    }

    pub fn processed_task_ids(&self) -> Vec<String> {
        self.audit_log
            .lock()
            .iter()
            .map(|(task_id, _)| task_id.clone())
            .collect()
    }

    pub fn processed_count(&self) -> usize {
        self.audit_log.lock().len()
    }

    async fn pause(&self) {
        if !self.step_delay.is_zero() {
            tokio::time::sleep(self.step_delay).await;
        }
    }

    async fn run_steps(&self, task: &OrderTask) -> WorkerResult<OrderOutcome> {
        let order = task.payload();
        if order.items.is_empty() {
            return Err(WorkerError::rejected(task.id(), "order has no items"));
        }

        self.pause().await;
        let inventory = self
            .mediator
            .inventory()
            .check_inventory(&order.order_id, &order.items);
        if !inventory.payload().available {
            return Ok(OrderOutcome::OutOfStock);
        }

        self.pause().await;
        let payment = self
            .mediator
            .payment()
            .process_payment(&order.order_id, order.total_amount_cents);
        if !payment.payload().success {
            return Ok(OrderOutcome::PaymentDeclined);
        }

        self.pause().await;
        let shipment = self.mediator.shipping().arrange_shipping(&order.order_id);
        Ok(OrderOutcome::Completed {
            tracking_number: shipment.into_payload().tracking_number,
        })
    }
}

#[async_trait]
impl Worker<OrderTask> for OrderWorker {
    type Outcome = OrderOutcome;

    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, task: &OrderTask) -> WorkerResult<OrderOutcome> {
        debug!(worker = %self.name, task_id = %task.id(), order_id = %task.order_id(), "🔧 WORKER: Processing order");

        let result = self.run_steps(task).await;
        self.audit_log
            .lock()
            .push((task.id().to_string(), task.order_id().to_string()));

        if let Ok(outcome) = &result {
            info!(
                worker = %self.name,
                order_id = %task.order_id(),
                outcome = ?outcome,
                "✅ WORKER: Order processed"
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mediator::Component;

    #[tokio::test]
    async fn test_completed_order_gets_tracking_number() {
        let worker = OrderWorker::new("Worker-1");
        let task = OrderTask::for_order("ORD-1", "C-1", vec!["Book".into()], 2_500);

        let outcome = worker.process(&task).await.unwrap();

        assert_eq!(
            outcome,
            OrderOutcome::Completed {
                tracking_number: "TRACK-ORD-1".into()
            }
        );
        assert_eq!(worker.processed_orders(), vec!["ORD-1"]);
        assert_eq!(worker.processed_task_ids(), vec![task.id().to_string()]);
    }

    #[tokio::test]
    async fn test_rejected_task_is_still_logged() {
        let worker = OrderWorker::new("Worker-1");
        let task = OrderTask::for_order("ORD-EMPTY", "C-1", Vec::new(), 100);

        let result = worker.process(&task).await;

        assert!(matches!(result, Err(WorkerError::Rejected { .. })));
        assert_eq!(worker.processed_orders(), vec!["ORD-EMPTY"]);
    }

    #[tokio::test]
    async fn test_workers_share_component_logs() {
        let mediator = OrderProcessingMediator::default();
        let first = OrderWorker::new("Worker-1").with_mediator(mediator.clone());
        let second = OrderWorker::new("Worker-2").with_mediator(mediator.clone());

        first
            .process(&OrderTask::for_order("ORD-1", "C", vec!["A".into()], 100))
            .await
            .unwrap();
        second
            .process(&OrderTask::for_order("ORD-2", "C", vec!["OutOfStockItem".into()], 100))
            .await
            .unwrap();

        assert_eq!(mediator.inventory().handled_orders().len(), 2);
        assert_eq!(mediator.shipping().handled_orders(), vec!["ORD-1"]);
        assert_eq!(first.processed_count(), 1);
        assert_eq!(second.processed_count(), 1);
    }
}
