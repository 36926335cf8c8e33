//! Builds the selection view: the entitled, cascade-filtered item set for one
//! customer, merged with whatever is already in that customer's cart.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cart::{CartLine, CartStore};
use crate::catalog::{CatalogStore, Customer, Item};
use crate::entitlements::{Entitlement, EntitlementResolver};
use crate::errors::ServiceError;
use crate::filters::{self, FacetOptions, ItemFilter};

/// Which base item set the filter cascade starts from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogScope {
    /// Items the customer is entitled to order. When the customer has no
    /// entitlement records at all this falls back to the full catalog; the
    /// service-wide absence policy.
    #[default]
    Entitled,
    /// The unrestricted catalog, regardless of entitlements.
    All,
}

/// One visible item with the quantity already in the cart, if any.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionRow {
    #[serde(flatten)]
    pub item: Item,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionView {
    pub customer: Customer,
    /// Whether entitlement records restrict this customer's catalog.
    pub restricted: bool,
    pub items: Vec<SelectionRow>,
    pub facets: FacetOptions,
    pub cart: Vec<CartLine>,
}

#[derive(Clone)]
pub struct SelectionService {
    catalog: Arc<CatalogStore>,
    entitlements: Arc<EntitlementResolver>,
    carts: Arc<CartStore>,
}

impl SelectionService {
    pub fn new(
        catalog: Arc<CatalogStore>,
        entitlements: Arc<EntitlementResolver>,
        carts: Arc<CartStore>,
    ) -> Self {
        Self {
            catalog,
            entitlements,
            carts,
        }
    }

    /// Resolves the visible item set for `customer_number` under `scope` and
    /// `filter`. The cart rides along untouched so a filter change can never
    /// reset in-progress quantities.
    #[instrument(skip(self, filter))]
    pub fn view(
        &self,
        customer_number: &str,
        scope: CatalogScope,
        filter: &ItemFilter,
    ) -> Result<SelectionView, ServiceError> {
        let snapshot = self.catalog.snapshot();
        let customer = snapshot
            .customer(customer_number)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {customer_number} not found")))?;

        let (base, restricted): (Vec<Item>, bool) = match scope {
            CatalogScope::All => (snapshot.items().to_vec(), false),
            CatalogScope::Entitled => match self.entitlements.resolve(customer_number) {
                Entitlement::NoRecords => (snapshot.items().to_vec(), false),
                Entitlement::Only(codes) => (
                    snapshot
                        .items()
                        .iter()
                        .filter(|item| codes.contains(&item.code))
                        .cloned()
                        .collect(),
                    true,
                ),
            },
        };

        let view = filters::apply(base, filter);
        let cart = self.carts.get(customer_number);

        let items = view
            .items
            .into_iter()
            .map(|item| {
                let quantity = cart
                    .iter()
                    .find(|line| line.item_code == item.code)
                    .map(|line| line.quantity);
                SelectionRow { item, quantity }
            })
            .collect();

        Ok(SelectionView {
            customer,
            restricted,
            items,
            facets: view.facets,
            cart,
        })
    }
}
