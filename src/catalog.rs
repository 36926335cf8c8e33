//! Catalog store: normalized item and customer reference tables.
//!
//! Both tables are reloaded wholesale from their source files and swapped in
//! as an immutable snapshot; readers hold a consistent `Arc` for the duration
//! of a request even while an admin reload is in flight.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::TabularError;
use crate::tabular::{self, Table, CUSTOMER_HEADER_SYNONYMS, ITEM_HEADER_SYNONYMS};

pub const REQUIRED_ITEM_COLUMNS: &[&str] =
    &["ItemCode", "ItemName", "Domain", "Category", "SubCategory"];

pub const REQUIRED_CUSTOMER_COLUMNS: &[&str] =
    &["CustomerNumber", "CustomerName", "SalesManager"];

/// A catalog item. Immutable once loaded; `code` is the unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub code: String,
    pub name: String,
    pub domain: String,
    pub category: String,
    pub subcategory: String,
}

/// A customer reference record. `number` is the unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub number: String,
    pub name: String,
    pub sales_manager: String,
}

/// Row counts reported after a reload.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReloadSummary {
    pub items: usize,
    pub customers: usize,
}

/// An immutable view of both reference tables as of one load.
#[derive(Debug)]
pub struct CatalogSnapshot {
    items: Vec<Item>,
    customers: Vec<Customer>,
    items_by_code: HashMap<String, usize>,
    customers_by_number: HashMap<String, usize>,
    pub loaded_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    fn from_tables(item_table: &Table, customer_table: &Table) -> Self {
        let mut items = Vec::with_capacity(item_table.len());
        let mut items_by_code = HashMap::new();
        for row in item_table.rows() {
            // Rows with a blank key are dropped; the first occurrence of a
            // duplicated code wins.
            let Some(code) = row.get("ItemCode") else {
                continue;
            };
            if items_by_code.contains_key(code) {
                continue;
            }
            items_by_code.insert(code.to_string(), items.len());
            items.push(Item {
                code: code.to_string(),
                name: row.get("ItemName").unwrap_or_default().to_string(),
                domain: row.get("Domain").unwrap_or_default().to_string(),
                category: row.get("Category").unwrap_or_default().to_string(),
                subcategory: row.get("SubCategory").unwrap_or_default().to_string(),
            });
        }

        let mut customers = Vec::with_capacity(customer_table.len());
        let mut customers_by_number = HashMap::new();
        for row in customer_table.rows() {
            let Some(number) = row.get("CustomerNumber") else {
                continue;
            };
            if customers_by_number.contains_key(number) {
                continue;
            }
            customers.push(Customer {
                number: number.to_string(),
                name: row.get("CustomerName").unwrap_or_default().to_string(),
                sales_manager: row.get("SalesManager").unwrap_or_default().to_string(),
            });
            customers_by_number.insert(number.to_string(), customers.len() - 1);
        }

        customers.sort_by(|a, b| (&a.name, &a.number).cmp(&(&b.name, &b.number)));
        let customers_by_number = customers
            .iter()
            .enumerate()
            .map(|(idx, customer)| (customer.number.clone(), idx))
            .collect();

        Self {
            items,
            customers,
            items_by_code,
            customers_by_number,
            loaded_at: Utc::now(),
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn item(&self, code: &str) -> Option<&Item> {
        self.items_by_code.get(code).map(|idx| &self.items[*idx])
    }

    pub fn customer(&self, number: &str) -> Option<&Customer> {
        self.customers_by_number
            .get(number)
            .map(|idx| &self.customers[*idx])
    }

    /// Distinct sales managers, sorted.
    pub fn sales_managers(&self) -> Vec<String> {
        self.customers
            .iter()
            .map(|customer| customer.sales_manager.clone())
            .filter(|manager| !manager.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Filters customers by exact (case-insensitive) sales manager and a
    /// case-insensitive substring over number and name. Result is sorted by
    /// `(name, number)`.
    pub fn filter_customers(&self, manager: Option<&str>, query: Option<&str>) -> Vec<Customer> {
        let manager = manager.map(str::trim).filter(|m| !m.is_empty());
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        self.customers
            .iter()
            .filter(|customer| {
                manager.map_or(true, |m| customer.sales_manager.eq_ignore_ascii_case(m))
            })
            .filter(|customer| {
                query.as_deref().map_or(true, |q| {
                    customer.number.to_lowercase().contains(q)
                        || customer.name.to_lowercase().contains(q)
                })
            })
            .cloned()
            .collect()
    }
}

/// Process-wide holder of the current catalog snapshot.
pub struct CatalogStore {
    items_file: PathBuf,
    customers_file: PathBuf,
    snapshot: RwLock<Arc<CatalogSnapshot>>,
}

impl CatalogStore {
    /// Loads both reference tables and returns the store, or a load-time
    /// error naming the offending file and columns.
    pub fn load(
        items_file: impl Into<PathBuf>,
        customers_file: impl Into<PathBuf>,
    ) -> Result<Self, TabularError> {
        let items_file = items_file.into();
        let customers_file = customers_file.into();
        let snapshot = Self::read_snapshot(&items_file, &customers_file)?;
        Ok(Self {
            items_file,
            customers_file,
            snapshot: RwLock::new(Arc::new(snapshot)),
        })
    }

    fn read_snapshot(
        items_file: &Path,
        customers_file: &Path,
    ) -> Result<CatalogSnapshot, TabularError> {
        let item_table = tabular::read_table(items_file, ITEM_HEADER_SYNONYMS, REQUIRED_ITEM_COLUMNS)?;
        let customer_table = tabular::read_table(
            customers_file,
            CUSTOMER_HEADER_SYNONYMS,
            REQUIRED_CUSTOMER_COLUMNS,
        )?;
        Ok(CatalogSnapshot::from_tables(&item_table, &customer_table))
    }

    /// Re-reads both source files wholesale and swaps in the new snapshot.
    /// On error the previous snapshot stays in place.
    pub fn reload(&self) -> Result<ReloadSummary, TabularError> {
        let snapshot = Self::read_snapshot(&self.items_file, &self.customers_file)?;
        let summary = ReloadSummary {
            items: snapshot.items.len(),
            customers: snapshot.customers.len(),
        };
        *self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Arc::new(snapshot);
        info!(
            items = summary.items,
            customers = summary.customers,
            "catalog reloaded"
        );
        Ok(summary)
    }

    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
