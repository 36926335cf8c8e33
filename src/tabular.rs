//! Tabular source loading with header normalization.
//!
//! Every external input (catalog, customers, entitlements) arrives as a
//! delimited table whose header names may vary between exports of the same
//! upstream system. Each entity declares a synonym table mapping known header
//! variants onto canonical column names; unmapped headers pass through
//! untouched. A required canonical column that is still missing after
//! normalization aborts the load naming the file and the columns.

use std::collections::HashMap;
use std::path::Path;

use csv::StringRecord;
use tracing::warn;

use crate::errors::TabularError;

/// Header variants accepted for item catalog files.
pub const ITEM_HEADER_SYNONYMS: &[(&str, &str)] = &[("ItemDescription", "ItemName")];

/// Header variants accepted for customer files.
pub const CUSTOMER_HEADER_SYNONYMS: &[(&str, &str)] = &[("CustomerID", "CustomerNumber")];

/// Header variants accepted for per-customer entitlement files.
pub const ENTITLEMENT_HEADER_SYNONYMS: &[(&str, &str)] = &[("MaterialNumber", "ItemCode")];

/// A loaded table with canonicalized column lookup.
#[derive(Debug, Clone)]
pub struct Table {
    file: String,
    columns: HashMap<String, usize>,
    rows: Vec<StringRecord>,
}

impl Table {
    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |record| Row {
            columns: &self.columns,
            record,
        })
    }
}

/// A borrowed row with access by canonical column name.
///
/// `get` returns `None` for unknown columns and for blank cells, so callers
/// can treat "column absent" and "value missing" uniformly when skipping
/// low-quality rows.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a StringRecord,
}

impl<'a> Row<'a> {
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.columns
            .get(column)
            .and_then(|idx| self.record.get(*idx))
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Reads a delimited file, normalizes its headers through `synonyms`, and
/// verifies that every column in `required` is present afterwards.
///
/// Individual malformed records are skipped with a warning; the load only
/// fails on unreadable files and missing required columns.
pub fn read_table(
    path: &Path,
    synonyms: &[(&str, &str)],
    required: &[&str],
) -> Result<Table, TabularError> {
    let file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|source| TabularError::Csv {
            file: file.clone(),
            source,
        })?;

    let headers = reader
        .headers()
        .map_err(|source| TabularError::Csv {
            file: file.clone(),
            source,
        })?
        .clone();

    let mut columns = HashMap::new();
    for (idx, header) in headers.iter().enumerate() {
        let name = header.trim();
        let canonical = synonyms
            .iter()
            .find(|(variant, _)| variant.eq_ignore_ascii_case(name))
            .map(|(_, canonical)| *canonical)
            .unwrap_or(name);
        // First occurrence wins when a file carries duplicate headers.
        columns.entry(canonical.to_string()).or_insert(idx);
    }

    let missing: Vec<String> = required
        .iter()
        .filter(|name| !columns.contains_key(**name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(TabularError::MissingColumns {
            file,
            columns: missing,
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        match record {
            Ok(record) => rows.push(record),
            Err(err) => warn!(file = %file, error = %err, "skipping malformed record"),
        }
    }

    Ok(Table {
        file,
        columns,
        rows,
    })
}
