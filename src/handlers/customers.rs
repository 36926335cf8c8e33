use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::catalog::Customer;
use crate::errors::ServiceError;
use crate::filters::ItemFilter;
use crate::services::CatalogScope;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CustomerListParams {
    /// Exact (case-insensitive) sales manager.
    pub manager: Option<String>,
    /// Substring over customer number and name.
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
struct CustomerListResponse {
    customers: Vec<Customer>,
    sales_managers: Vec<String>,
}

async fn list_customers(
    State(state): State<AppState>,
    Query(params): Query<CustomerListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let snapshot = state.catalog.snapshot();
    Ok(Json(CustomerListResponse {
        customers: snapshot.filter_customers(params.manager.as_deref(), params.q.as_deref()),
        sales_managers: snapshot.sales_managers(),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct SelectionParams {
    #[serde(default)]
    pub scope: CatalogScope,
    pub domain: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub q: Option<String>,
}

async fn customer_items(
    State(state): State<AppState>,
    Path(number): Path<String>,
    Query(params): Query<SelectionParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let filter = ItemFilter {
        domain: params.domain,
        category: params.category,
        subcategory: params.subcategory,
        search: params.q,
    };
    let view = state
        .services
        .selection
        .view(&number, params.scope, &filter)?;
    Ok(Json(view))
}

pub fn customers_routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers))
        .route("/customers/:number/items", get(customer_items))
}
