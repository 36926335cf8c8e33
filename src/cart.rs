//! Per-customer selection accumulator (the cart).
//!
//! The cart is a keyed store: customer number → ordered map of item code →
//! pending line. Batches mutate it incrementally; a batch only ever touches
//! the item codes it names, so a submission narrowed by a facet filter never
//! wipes entries selected under a different filter state. Per-key locking in
//! the underlying map applies same-customer batches in arrival order.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::CatalogSnapshot;

/// A pending order line, carrying a snapshot of the item's display fields as
/// of the moment it was entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_code: String,
    pub name: String,
    pub domain: String,
    pub category: String,
    pub subcategory: String,
    pub quantity: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// One entry of a cart batch. The quantity arrives as raw text (or a bare
/// JSON number); anything that does not parse to a value greater than zero
/// means "remove this item code".
#[derive(Debug, Clone, Deserialize)]
pub struct CartEntryInput {
    pub item_code: String,
    #[serde(default)]
    pub quantity: serde_json::Value,
}

impl CartEntryInput {
    pub fn quantity_text(&self) -> String {
        match &self.quantity {
            serde_json::Value::String(text) => text.clone(),
            serde_json::Value::Number(number) => number.to_string(),
            _ => String::new(),
        }
    }
}

/// Parses raw quantity text; `None` when unparsable or not strictly positive.
pub fn parse_quantity(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim())
        .ok()
        .filter(|quantity| *quantity > Decimal::ZERO)
}

#[derive(Default)]
pub struct CartStore {
    carts: DashMap<String, BTreeMap<String, CartLine>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cart lines for a customer, in item-code order. Empty when no
    /// batch has touched this customer yet.
    pub fn get(&self, customer_number: &str) -> Vec<CartLine> {
        self.carts
            .get(customer_number)
            .map(|cart| cart.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Applies one batch of entries and returns the resulting cart.
    ///
    /// Positive parseable quantities upsert; everything else removes the
    /// named code (a no-op when absent). Codes not named in the batch are
    /// untouched. Entries naming an item code missing from the catalog are
    /// skipped with a warning, the same recovery as bad rows in bulk loads.
    pub fn apply_batch(
        &self,
        customer_number: &str,
        entries: &[CartEntryInput],
        snapshot: &CatalogSnapshot,
    ) -> Vec<CartLine> {
        let mut cart = self.carts.entry(customer_number.to_string()).or_default();

        for entry in entries {
            let code = entry.item_code.trim();
            if code.is_empty() {
                continue;
            }
            match parse_quantity(&entry.quantity_text()) {
                Some(quantity) => {
                    let Some(item) = snapshot.item(code) else {
                        warn!(
                            customer = customer_number,
                            item_code = code,
                            "skipping cart entry for unknown item"
                        );
                        continue;
                    };
                    cart.insert(
                        code.to_string(),
                        CartLine {
                            item_code: item.code.clone(),
                            name: item.name.clone(),
                            domain: item.domain.clone(),
                            category: item.category.clone(),
                            subcategory: item.subcategory.clone(),
                            quantity,
                            updated_at: Utc::now(),
                        },
                    );
                }
                None => {
                    cart.remove(code);
                }
            }
        }

        cart.values().cloned().collect()
    }

    /// Removes and returns the whole cart for a customer. Used at submission:
    /// ownership of the lines transfers to the ledger; on failure the caller
    /// restores them with [`CartStore::restore`].
    pub fn take(&self, customer_number: &str) -> Vec<CartLine> {
        self.carts
            .remove(customer_number)
            .map(|(_, cart)| cart.into_values().collect())
            .unwrap_or_default()
    }

    /// Puts taken lines back after a failed submission. Entries the customer
    /// re-added in the meantime win over the restored ones.
    pub fn restore(&self, customer_number: &str, lines: Vec<CartLine>) {
        if lines.is_empty() {
            return;
        }
        let mut cart = self.carts.entry(customer_number.to_string()).or_default();
        for line in lines {
            cart.entry(line.item_code.clone()).or_insert(line);
        }
    }

    pub fn clear(&self, customer_number: &str) {
        self.carts.remove(customer_number);
    }
}
