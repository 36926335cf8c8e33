//! Append-only order ledger.
//!
//! The ledger exclusively owns finalized orders. The contract is minimal so
//! the backend stays swappable without touching cart or filter logic: append
//! an order (assigning the next serial inside a critical section), and query
//! by an optional inclusive creation-date range.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

pub mod csv_file;
pub mod memory;

pub use csv_file::CsvLedger;
pub use memory::InMemoryLedger;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_code: String,
    pub quantity: Decimal,
}

/// A finalized order. Immutable once appended; there is deliberately no edit
/// or delete operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_serial: u64,
    pub customer_number: String,
    pub created_at: DateTime<Utc>,
    pub delivery_date: Option<NaiveDate>,
    pub lines: Vec<OrderLine>,
}

/// Order contents before a serial has been assigned.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_number: String,
    pub delivery_date: Option<NaiveDate>,
    pub lines: Vec<OrderLine>,
}

/// Inclusive calendar-date bounds applied to an order's creation timestamp.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        let date = timestamp.date_naive();
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

#[async_trait]
pub trait OrderLedger: Send + Sync {
    /// Appends a new order, assigning `1 + max(stored serials)`.
    ///
    /// Lines without a positive quantity are discarded; when none survive the
    /// append fails with [`ServiceError::EmptyOrder`] and nothing is written.
    /// The read-max/compute/append sequence is serialized, so concurrent
    /// submissions never receive the same serial.
    async fn append(&self, order: NewOrder) -> Result<Order, ServiceError>;

    /// Orders whose creation timestamp falls within `range`, in append order.
    async fn query(&self, range: DateRange) -> Result<Vec<Order>, ServiceError>;
}

/// Drops non-persistable lines: blank codes and quantities ≤ 0.
pub(crate) fn persistable_lines(lines: Vec<OrderLine>) -> Vec<OrderLine> {
    lines
        .into_iter()
        .filter(|line| !line.item_code.trim().is_empty() && line.quantity > Decimal::ZERO)
        .collect()
}
