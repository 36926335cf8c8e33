//! File-backed ledger: one CSV row per order line, appended and never
//! rewritten.
//!
//! The full file is parsed once at open; appends go to both the in-memory
//! state and the file inside the same critical section. Rows that fail to
//! parse are skipped when rebuilding state; a corrupt stored serial can at
//! worst make the next serial restart from 1, which is the deliberate
//! liveness-over-strictness choice for submissions.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{persistable_lines, DateRange, NewOrder, Order, OrderLedger, OrderLine};
use crate::errors::ServiceError;

const HEADERS: [&str; 6] = [
    "OrderSerial",
    "CustomerNumber",
    "CreatedAt",
    "DeliveryDate",
    "ItemCode",
    "Quantity",
];

#[derive(Default)]
struct LedgerState {
    orders: Vec<Order>,
    max_serial: u64,
}

pub struct CsvLedger {
    path: PathBuf,
    state: Mutex<LedgerState>,
}

impl CsvLedger {
    /// Opens (or prepares to create) the ledger file and rebuilds state from
    /// the rows already present.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ServiceError> {
        let path = path.into();
        let state = if path.exists() {
            Self::load(&path)?
        } else {
            LedgerState::default()
        };
        info!(
            path = %path.display(),
            orders = state.orders.len(),
            max_serial = state.max_serial,
            "order ledger opened"
        );
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    fn load(path: &Path) -> Result<LedgerState, ServiceError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)?;

        let mut state = LedgerState::default();
        for record in reader.records() {
            let record = match record {
                Ok(record) => record,
                Err(err) => {
                    warn!(error = %err, "skipping malformed ledger record");
                    continue;
                }
            };
            let Some(row) = parse_row(&record) else {
                warn!(?record, "skipping unparsable ledger row");
                continue;
            };

            state.max_serial = state.max_serial.max(row.serial);
            match state
                .orders
                .iter_mut()
                .find(|order| order.order_serial == row.serial)
            {
                Some(order) => order.lines.push(row.line),
                None => state.orders.push(Order {
                    order_serial: row.serial,
                    customer_number: row.customer_number,
                    created_at: row.created_at,
                    delivery_date: row.delivery_date,
                    lines: vec![row.line],
                }),
            }
        }
        Ok(state)
    }

    fn persist(&self, order: &Order) -> Result<(), ServiceError> {
        let write_headers = !self.path.exists()
            || std::fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if write_headers {
            writer.write_record(HEADERS)?;
        }
        for line in &order.lines {
            writer.write_record([
                order.order_serial.to_string(),
                order.customer_number.clone(),
                order.created_at.to_rfc3339(),
                order
                    .delivery_date
                    .map(|date| date.to_string())
                    .unwrap_or_default(),
                line.item_code.clone(),
                line.quantity.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

struct ParsedRow {
    serial: u64,
    customer_number: String,
    created_at: DateTime<Utc>,
    delivery_date: Option<NaiveDate>,
    line: OrderLine,
}

fn parse_row(record: &csv::StringRecord) -> Option<ParsedRow> {
    let field = |idx: usize| record.get(idx).map(str::trim).unwrap_or_default();

    let serial = field(0).parse::<u64>().ok()?;
    let customer_number = field(1).to_string();
    let created_at = DateTime::parse_from_rfc3339(field(2))
        .ok()?
        .with_timezone(&Utc);
    let delivery_date = NaiveDate::from_str(field(3)).ok();
    let item_code = field(4).to_string();
    if item_code.is_empty() {
        return None;
    }
    let quantity = Decimal::from_str(field(5)).ok()?;

    Some(ParsedRow {
        serial,
        customer_number,
        created_at,
        delivery_date,
        line: OrderLine {
            item_code,
            quantity,
        },
    })
}

#[async_trait]
impl OrderLedger for CsvLedger {
    async fn append(&self, order: NewOrder) -> Result<Order, ServiceError> {
        let lines = persistable_lines(order.lines);
        if lines.is_empty() {
            return Err(ServiceError::EmptyOrder);
        }

        // Critical section: serial assignment and the file append must not
        // interleave across submissions.
        let mut state = self.state.lock().await;
        let order = Order {
            order_serial: state.max_serial + 1,
            customer_number: order.customer_number,
            created_at: Utc::now(),
            delivery_date: order.delivery_date,
            lines,
        };
        self.persist(&order)?;
        state.max_serial = order.order_serial;
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn query(&self, range: DateRange) -> Result<Vec<Order>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .filter(|order| range.contains(order.created_at))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn new_order(customer: &str, lines: &[(&str, Decimal)]) -> NewOrder {
        NewOrder {
            customer_number: customer.to_string(),
            delivery_date: None,
            lines: lines
                .iter()
                .map(|(code, quantity)| OrderLine {
                    item_code: code.to_string(),
                    quantity: *quantity,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn serials_survive_reopen() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("orders.csv");

        {
            let ledger = CsvLedger::open(&path).expect("open");
            let first = ledger
                .append(new_order("1001", &[("A1", dec!(2))]))
                .await
                .expect("append");
            assert_eq!(first.order_serial, 1);
            let second = ledger
                .append(new_order("2002", &[("B1", dec!(1)), ("B2", dec!(3))]))
                .await
                .expect("append");
            assert_eq!(second.order_serial, 2);
        }

        let reopened = CsvLedger::open(&path).expect("reopen");
        let orders = reopened.query(DateRange::default()).await.expect("query");
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[1].lines.len(), 2);

        let third = reopened
            .append(new_order("1001", &[("A1", dec!(1))]))
            .await
            .expect("append");
        assert_eq!(third.order_serial, 3);
    }

    #[tokio::test]
    async fn corrupt_serials_fall_back_instead_of_failing() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("orders.csv");
        std::fs::write(
            &path,
            "OrderSerial,CustomerNumber,CreatedAt,DeliveryDate,ItemCode,Quantity\n\
             not-a-number,1001,garbage,,A1,2\n",
        )
        .expect("write");

        let ledger = CsvLedger::open(&path).expect("open tolerates corruption");
        let order = ledger
            .append(new_order("1001", &[("A1", dec!(2))]))
            .await
            .expect("append still works");
        assert_eq!(order.order_serial, 1);
    }

    #[tokio::test]
    async fn empty_order_writes_nothing() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("orders.csv");
        let ledger = CsvLedger::open(&path).expect("open");

        let err = ledger
            .append(new_order("1001", &[("A1", dec!(0)), ("", dec!(5))]))
            .await
            .expect_err("must reject");
        assert!(matches!(err, ServiceError::EmptyOrder));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn append_never_rewrites_existing_orders() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("orders.csv");
        let ledger = CsvLedger::open(&path).expect("open");

        ledger
            .append(new_order("1001", &[("A1", dec!(2))]))
            .await
            .expect("append");
        let after_first = std::fs::read_to_string(&path).expect("read");

        ledger
            .append(new_order("2002", &[("B1", dec!(1))]))
            .await
            .expect("append");
        let after_second = std::fs::read_to_string(&path).expect("read");
        assert!(after_second.starts_with(&after_first));
    }
}
