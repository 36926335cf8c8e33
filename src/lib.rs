//! Orderdesk API Library
//!
//! Order-capture backend: a sales operator selects a customer, sees the
//! entitlement-filtered catalog, accumulates quantities in a cart, and
//! submits orders that are appended to a ledger and exported in a fixed
//! tabular layout for downstream ERP ingestion.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod entitlements;
pub mod errors;
pub mod events;
pub mod export;
pub mod filters;
pub mod handlers;
pub mod ledger;
pub mod services;
pub mod tabular;

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::cart::CartStore;
use crate::catalog::CatalogStore;
use crate::config::AppConfig;
use crate::entitlements::EntitlementResolver;
use crate::errors::ServiceError;
use crate::events::EventSender;
use crate::export::ExportLayout;
use crate::ledger::OrderLedger;
use crate::services::{OrderService, SelectionService};

/// Service handles shared by the handlers.
#[derive(Clone)]
pub struct AppServices {
    pub selection: Arc<SelectionService>,
    pub orders: Arc<OrderService>,
}

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<CatalogStore>,
    pub entitlements: Arc<EntitlementResolver>,
    pub carts: Arc<CartStore>,
    pub ledger: Arc<dyn OrderLedger>,
    pub export_layout: Arc<ExportLayout>,
    pub event_sender: EventSender,
    pub services: AppServices,
}

impl AppState {
    /// Loads the catalog from the configured paths and wires up every store
    /// and service. Fails when a reference table is missing required columns.
    pub fn build(
        config: AppConfig,
        ledger: Arc<dyn OrderLedger>,
        event_sender: EventSender,
    ) -> Result<Self, ServiceError> {
        let catalog = Arc::new(CatalogStore::load(
            &config.data.items_file,
            &config.data.customers_file,
        )?);
        let entitlements = Arc::new(EntitlementResolver::new(&config.data.entitlements_dir));
        let carts = Arc::new(CartStore::new());
        let export_layout = Arc::new(ExportLayout::new(
            &config.export.columns,
            &config.export.constants,
        ));

        let selection = Arc::new(SelectionService::new(
            catalog.clone(),
            entitlements.clone(),
            carts.clone(),
        ));
        let orders = Arc::new(OrderService::new(
            catalog.clone(),
            carts.clone(),
            ledger.clone(),
            event_sender.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            catalog,
            entitlements,
            carts,
            ledger,
            export_layout,
            event_sender,
            services: AppServices { selection, orders },
        })
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    catalog_loaded_at: DateTime<Utc>,
    items: usize,
    customers: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.catalog.snapshot();
    Json(HealthResponse {
        status: "ok",
        catalog_loaded_at: snapshot.loaded_at,
        items: snapshot.items().len(),
        customers: snapshot.customers().len(),
    })
}

/// Builds the full application router with the standard middleware stack.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", handlers::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state)
}
