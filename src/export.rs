//! Export formatter: reshapes ledger orders into the externally mandated
//! column contract.
//!
//! The target layout is a list of column names in an explicit order. Each
//! name binds to a variable field populated from ledger data, to a configured
//! constant, or (when neither matches) stays present but blank. The default
//! layout and constants mirror the downstream ERP ingestion contract.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::ServiceError;
use crate::ledger::Order;

/// Variable fields a target column can bind to. Column-name synonyms from
/// the ERP side (`MaterialNumber`, `OrderQuantity`, ...) are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportField {
    OrderNumber,
    /// Dense 1..N sequence over the distinct serials in the export,
    /// ascending by original serial.
    OrderSequence,
    CustomerNumber,
    ItemCode,
    Quantity,
    /// Order creation date, formatted `DDMMYYYY`.
    ReferenceDate,
    DeliveryDate,
    SoldToParty,
    ShipToParty,
}

impl ExportField {
    fn from_column(name: &str) -> Option<Self> {
        let field = match name {
            "OrderNumber" => Self::OrderNumber,
            "OrderSequence" => Self::OrderSequence,
            "CustomerNumber" => Self::CustomerNumber,
            "ItemCode" | "MaterialNumber" => Self::ItemCode,
            "Quantity" | "OrderQuantity" => Self::Quantity,
            "ReferenceDate" | "CustomerReferenceDate" => Self::ReferenceDate,
            "DeliveryDate" => Self::DeliveryDate,
            "SoldToParty" => Self::SoldToParty,
            "ShipToParty" => Self::ShipToParty,
            _ => return None,
        };
        Some(field)
    }
}

#[derive(Debug, Clone)]
enum ColumnSource {
    Field(ExportField),
    Constant(String),
    Blank,
}

#[derive(Debug, Clone)]
struct ColumnSpec {
    name: String,
    source: ColumnSource,
}

/// A compiled target layout. Variable bindings win over constants of the same
/// name; unmapped names become blank columns, never omitted ones.
#[derive(Debug, Clone)]
pub struct ExportLayout {
    columns: Vec<ColumnSpec>,
}

impl ExportLayout {
    pub fn new(columns: &[String], constants: &HashMap<String, String>) -> Self {
        let columns = columns
            .iter()
            .map(|name| {
                let source = match ExportField::from_column(name) {
                    Some(field) => ColumnSource::Field(field),
                    None => constants
                        .get(name)
                        .map(|value| ColumnSource::Constant(value.clone()))
                        .unwrap_or(ColumnSource::Blank),
                };
                ColumnSpec {
                    name: name.clone(),
                    source,
                }
            })
            .collect();
        Self { columns }
    }

    pub fn header(&self) -> Vec<String> {
        self.columns.iter().map(|spec| spec.name.clone()).collect()
    }

    /// One output row per order line, sorted by `(order serial, item code)`.
    pub fn rows(&self, orders: &[Order]) -> Vec<Vec<String>> {
        let mut sorted: Vec<&Order> = orders.iter().collect();
        sorted.sort_by_key(|order| order.order_serial);

        // Dense sequence: distinct serials ascending → 1..N.
        let sequence: BTreeMap<u64, usize> = sorted
            .iter()
            .map(|order| order.order_serial)
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(idx, serial)| (serial, idx + 1))
            .collect();

        let mut rows = Vec::new();
        for order in sorted {
            let mut lines: Vec<_> = order.lines.iter().collect();
            lines.sort_by(|a, b| a.item_code.cmp(&b.item_code));
            for line in lines {
                let row = self
                    .columns
                    .iter()
                    .map(|spec| match &spec.source {
                        ColumnSource::Field(field) => match field {
                            ExportField::OrderNumber => order.order_serial.to_string(),
                            ExportField::OrderSequence => sequence
                                .get(&order.order_serial)
                                .map(|seq| seq.to_string())
                                .unwrap_or_default(),
                            ExportField::CustomerNumber
                            | ExportField::SoldToParty
                            | ExportField::ShipToParty => order.customer_number.clone(),
                            ExportField::ItemCode => line.item_code.clone(),
                            ExportField::Quantity => line.quantity.normalize().to_string(),
                            ExportField::ReferenceDate => format_reference_date(order.created_at),
                            ExportField::DeliveryDate => order
                                .delivery_date
                                .map(|date| date.format("%d%m%Y").to_string())
                                .unwrap_or_default(),
                        },
                        ColumnSource::Constant(value) => value.clone(),
                        ColumnSource::Blank => String::new(),
                    })
                    .collect();
                rows.push(row);
            }
        }
        rows
    }

    /// Renders header plus rows as a CSV document. An empty order set still
    /// produces the full header with zero data rows.
    pub fn to_csv(&self, orders: &[Order]) -> Result<Vec<u8>, ServiceError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(self.header())?;
        for row in self.rows(orders) {
            writer.write_record(&row)?;
        }
        writer
            .into_inner()
            .map_err(|err| ServiceError::InternalError(format!("export buffer: {err}")))
    }
}

pub fn format_reference_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%d%m%Y").to_string()
}

/// Accepts the ERP-side `DDMMYYYY` format and ISO `YYYY-MM-DD`.
pub fn parse_range_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%d%m%Y")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d"))
        .ok()
}

/// Attachment filename carrying the generation timestamp.
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("orders_export_{}.csv", now.format("%Y%m%d_%H%M"))
}
