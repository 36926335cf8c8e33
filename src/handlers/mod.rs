pub mod admin;
pub mod carts;
pub mod customers;
pub mod orders;

use axum::Router;

use crate::AppState;

/// All versioned API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(customers::customers_routes())
        .merge(carts::carts_routes())
        .merge(orders::orders_routes())
        .merge(admin::admin_routes())
}
