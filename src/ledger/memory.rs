//! In-memory ledger backend, used by tests and available as a throwaway
//! backend when no orders file is configured.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{persistable_lines, DateRange, NewOrder, Order, OrderLedger};
use crate::errors::ServiceError;

#[derive(Default)]
pub struct InMemoryLedger {
    // One lock covers the whole read-max-then-append critical section.
    orders: Mutex<Vec<Order>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderLedger for InMemoryLedger {
    async fn append(&self, order: NewOrder) -> Result<Order, ServiceError> {
        let lines = persistable_lines(order.lines);
        if lines.is_empty() {
            return Err(ServiceError::EmptyOrder);
        }

        let mut orders = self.orders.lock().await;
        let serial = orders
            .iter()
            .map(|order| order.order_serial)
            .max()
            .unwrap_or(0)
            + 1;
        let order = Order {
            order_serial: serial,
            customer_number: order.customer_number,
            created_at: Utc::now(),
            delivery_date: order.delivery_date,
            lines,
        };
        orders.push(order.clone());
        Ok(order)
    }

    async fn query(&self, range: DateRange) -> Result<Vec<Order>, ServiceError> {
        let orders = self.orders.lock().await;
        Ok(orders
            .iter()
            .filter(|order| range.contains(order.created_at))
            .cloned()
            .collect())
    }
}
