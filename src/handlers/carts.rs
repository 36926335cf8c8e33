use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::cart::{CartEntryInput, CartLine};
use crate::errors::ServiceError;
use crate::events::Event;
use crate::AppState;

#[derive(Debug, Serialize)]
struct CartResponse {
    customer_number: String,
    lines: Vec<CartLine>,
}

async fn get_cart(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let snapshot = state.catalog.snapshot();
    if snapshot.customer(&number).is_none() {
        return Err(ServiceError::NotFound(format!("Customer {number} not found")));
    }
    Ok(Json(CartResponse {
        lines: state.carts.get(&number),
        customer_number: number,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CartBatchRequest {
    pub entries: Vec<CartEntryInput>,
}

/// Applies one partial batch of quantity edits. Item codes missing from the
/// batch are untouched, so submissions from a filtered grid never wipe the
/// rest of the cart.
async fn update_cart(
    State(state): State<AppState>,
    Path(number): Path<String>,
    Json(batch): Json<CartBatchRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let snapshot = state.catalog.snapshot();
    if snapshot.customer(&number).is_none() {
        return Err(ServiceError::NotFound(format!("Customer {number} not found")));
    }

    let lines = state.carts.apply_batch(&number, &batch.entries, &snapshot);
    state
        .event_sender
        .send_or_log(Event::CartUpdated {
            customer_number: number.clone(),
            lines: lines.len(),
        })
        .await;

    Ok(Json(CartResponse {
        lines,
        customer_number: number,
    }))
}

pub fn carts_routes() -> Router<AppState> {
    Router::new()
        .route("/carts/:number", get(get_cart))
        .route("/carts/:number", post(update_cart))
}
