//! Cascading facet filters over a working item set.
//!
//! The cascade is fixed: domain, then category within the domain result, then
//! subcategory within the category result, then free-text over all display
//! fields. The facet values offered at each stage are the distinct values
//! *still reachable* after every upstream selection, so the dropdowns narrow
//! progressively and never offer a combination with zero rows.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::Item;

/// One filter selection per cascade stage. Blank strings are treated the same
/// as absent selections, matching what HTML form submissions send.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemFilter {
    pub domain: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    /// Case-insensitive substring over code, name, domain, category and
    /// subcategory.
    pub search: Option<String>,
}

impl ItemFilter {
    fn selection(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Distinct values reachable at each cascade stage, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetOptions {
    pub domains: Vec<String>,
    pub categories: Vec<String>,
    pub subcategories: Vec<String>,
}

/// The filtered item set plus its facet options.
#[derive(Debug, Clone, Serialize)]
pub struct FilteredView {
    pub items: Vec<Item>,
    pub facets: FacetOptions,
}

/// Canonical display order: stable sort by
/// `(domain, category, subcategory, name, code)`. Stability matters so ties
/// do not reorder between re-filters of the same base set.
pub fn canonical_sort(items: &mut [Item]) {
    items.sort_by(|a, b| {
        (&a.domain, &a.category, &a.subcategory, &a.name, &a.code)
            .cmp(&(&b.domain, &b.category, &b.subcategory, &b.name, &b.code))
    });
}

/// Applies the filter cascade to `items`.
///
/// An empty base set yields an empty result with empty facet lists; a filter
/// value not present in the current base set yields an empty result. Neither
/// is an error.
pub fn apply(mut items: Vec<Item>, filter: &ItemFilter) -> FilteredView {
    canonical_sort(&mut items);

    let domains = distinct(items.iter().map(|item| item.domain.as_str()));
    if let Some(domain) = ItemFilter::selection(&filter.domain) {
        items.retain(|item| item.domain == domain);
    }

    let categories = distinct(items.iter().map(|item| item.category.as_str()));
    if let Some(category) = ItemFilter::selection(&filter.category) {
        items.retain(|item| item.category == category);
    }

    let subcategories = distinct(items.iter().map(|item| item.subcategory.as_str()));
    if let Some(subcategory) = ItemFilter::selection(&filter.subcategory) {
        items.retain(|item| item.subcategory == subcategory);
    }

    if let Some(search) = ItemFilter::selection(&filter.search) {
        let needle = search.to_lowercase();
        items.retain(|item| {
            [
                &item.code,
                &item.name,
                &item.domain,
                &item.category,
                &item.subcategory,
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
        });
    }

    FilteredView {
        items,
        facets: FacetOptions {
            domains,
            categories,
            subcategories,
        },
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
