//! Order submission: finalizes a customer's cart into a ledger order.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::cart::{CartEntryInput, CartStore};
use crate::catalog::CatalogStore;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::ledger::{NewOrder, OrderLedger, OrderLine};

#[derive(Debug, Deserialize)]
pub struct SubmitOrderInput {
    pub customer_number: String,
    /// Optional passthrough; stored on the order and exportable, drives no
    /// logic.
    pub delivery_date: Option<NaiveDate>,
    /// Final batch of quantity edits applied to the cart before submission,
    /// typically the visible grid at the moment the operator hit submit.
    #[serde(default)]
    pub entries: Vec<CartEntryInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitOrderReceipt {
    pub order_serial: u64,
    pub customer_number: String,
    pub lines: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct OrderService {
    catalog: Arc<CatalogStore>,
    carts: Arc<CartStore>,
    ledger: Arc<dyn OrderLedger>,
    event_sender: EventSender,
}

impl OrderService {
    pub fn new(
        catalog: Arc<CatalogStore>,
        carts: Arc<CartStore>,
        ledger: Arc<dyn OrderLedger>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            catalog,
            carts,
            ledger,
            event_sender,
        }
    }

    /// Validates the customer, folds the final batch into the cart, then
    /// hands the cart to the ledger. On any rejection the cart is left (or
    /// put back) exactly as it was, so the operator can fix and resubmit.
    #[instrument(skip(self, input), fields(customer = %input.customer_number))]
    pub async fn submit(&self, input: SubmitOrderInput) -> Result<SubmitOrderReceipt, ServiceError> {
        let customer_number = input.customer_number.trim().to_string();
        if customer_number.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Missing customer number".to_string(),
            ));
        }

        let snapshot = self.catalog.snapshot();
        if snapshot.customer(&customer_number).is_none() {
            return Err(ServiceError::NotFound(format!(
                "Customer {customer_number} not found"
            )));
        }

        if !input.entries.is_empty() {
            self.carts
                .apply_batch(&customer_number, &input.entries, &snapshot);
        }

        // Ownership of the lines transfers to the ledger; taken back only if
        // the append is rejected.
        let cart_lines = self.carts.take(&customer_number);
        let lines: Vec<OrderLine> = cart_lines
            .iter()
            .map(|line| OrderLine {
                item_code: line.item_code.clone(),
                quantity: line.quantity,
            })
            .collect();

        let appended = self
            .ledger
            .append(NewOrder {
                customer_number: customer_number.clone(),
                delivery_date: input.delivery_date,
                lines,
            })
            .await;

        let order = match appended {
            Ok(order) => order,
            Err(err) => {
                self.carts.restore(&customer_number, cart_lines);
                return Err(err);
            }
        };

        self.event_sender
            .send_or_log(Event::OrderSubmitted {
                order_serial: order.order_serial,
                customer_number: customer_number.clone(),
                lines: order.lines.len(),
            })
            .await;

        info!(
            order_serial = order.order_serial,
            lines = order.lines.len(),
            "order accepted"
        );

        Ok(SubmitOrderReceipt {
            order_serial: order.order_serial,
            customer_number,
            lines: order.lines.len(),
            created_at: order.created_at,
        })
    }
}
