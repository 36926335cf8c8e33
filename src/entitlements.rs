//! Per-customer entitlement resolution.
//!
//! Entitlements arrive as zero or more tabular files per customer in a single
//! directory, either `{number}.csv` or split across `{number}_*.csv`. The
//! resolver unions the item codes across every matching source.
//!
//! Absence policy: when no source yields any entitlement row the resolver
//! reports [`Entitlement::NoRecords`], and callers treat that as "no
//! restriction": the full catalog is visible. New customers are routinely
//! onboarded before their entitlement files land; tests assert this policy.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::warn;

use crate::tabular::{self, ENTITLEMENT_HEADER_SYNONYMS};

/// The resolved allow-list for one customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entitlement {
    /// No entitlement row exists anywhere for this customer. Distinct from an
    /// explicit empty set; callers fall back to the full catalog.
    NoRecords,
    /// Entitlement records exist; only these item codes may be ordered.
    Only(HashSet<String>),
}

impl Entitlement {
    pub fn permits(&self, code: &str) -> bool {
        match self {
            Entitlement::NoRecords => true,
            Entitlement::Only(codes) => codes.contains(code),
        }
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self, Entitlement::Only(_))
    }
}

/// Resolves customer allow-lists from the entitlement directory.
pub struct EntitlementResolver {
    dir: PathBuf,
}

impl EntitlementResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Merges every source table for `customer_number` into one deduplicated
    /// set of item codes.
    ///
    /// Rows with a blank item code are skipped. A source file that cannot be
    /// read, or whose headers do not normalize to `ItemCode`, is skipped as a
    /// whole with a warning; only when no source contributes a row does the
    /// resolver report [`Entitlement::NoRecords`].
    pub fn resolve(&self, customer_number: &str) -> Entitlement {
        let mut codes = HashSet::new();
        let mut saw_rows = false;

        for path in self.source_files(customer_number) {
            let table = match tabular::read_table(&path, ENTITLEMENT_HEADER_SYNONYMS, &["ItemCode"])
            {
                Ok(table) => table,
                Err(err) => {
                    warn!(customer = customer_number, error = %err, "skipping entitlement source");
                    continue;
                }
            };
            for row in table.rows() {
                if let Some(code) = row.get("ItemCode") {
                    saw_rows = true;
                    codes.insert(code.to_string());
                }
            }
        }

        if saw_rows {
            Entitlement::Only(codes)
        } else {
            Entitlement::NoRecords
        }
    }

    /// `{number}.csv` plus every `{number}_*.csv`, sorted for deterministic
    /// merge order.
    fn source_files(&self, customer_number: &str) -> Vec<PathBuf> {
        let customer_number = customer_number.trim();
        if customer_number.is_empty() {
            return Vec::new();
        }

        let mut files = Vec::new();
        let single = self.dir.join(format!("{customer_number}.csv"));
        if single.is_file() {
            files.push(single);
        }

        let split_prefix = format!("{customer_number}_");
        if let Ok(entries) = std::fs::read_dir(&self.dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if name.starts_with(&split_prefix) && name.ends_with(".csv") && path.is_file() {
                    files.push(path);
                }
            }
        }

        files.sort();
        files
    }
}
