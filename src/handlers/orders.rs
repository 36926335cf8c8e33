use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};

use crate::errors::ServiceError;
use crate::services::SubmitOrderInput;
use crate::AppState;

async fn submit_order(
    State(state): State<AppState>,
    Json(input): Json<SubmitOrderInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let receipt = state.services.orders.submit(input).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub fn orders_routes() -> Router<AppState> {
    Router::new().route("/orders", post(submit_order))
}
