use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::AdminToken;
use crate::errors::ServiceError;
use crate::events::Event;
use crate::export::{self, parse_range_date};
use crate::ledger::DateRange;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    /// Inclusive lower bound, `DDMMYYYY` or `YYYY-MM-DD`.
    pub from: Option<String>,
    /// Inclusive upper bound, same formats.
    pub to: Option<String>,
}

fn parse_bound(label: &str, value: Option<&str>) -> Result<Option<chrono::NaiveDate>, ServiceError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(text) => parse_range_date(text)
            .map(Some)
            .ok_or_else(|| ServiceError::InvalidInput(format!("Invalid {label} date: {text}"))),
    }
}

/// Streams the order ledger as a spreadsheet-style CSV attachment. An empty
/// ledger (or empty range) still yields the full header row.
async fn export_orders(
    State(state): State<AppState>,
    _admin: AdminToken,
    Query(params): Query<ExportParams>,
) -> Result<Response, ServiceError> {
    let range = DateRange {
        from: parse_bound("from", params.from.as_deref())?,
        to: parse_bound("to", params.to.as_deref())?,
    };

    let orders = state.ledger.query(range).await?;
    let body = state.export_layout.to_csv(&orders)?;
    let filename = export::export_filename(Utc::now());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

async fn reload_catalog(
    State(state): State<AppState>,
    _admin: AdminToken,
) -> Result<impl IntoResponse, ServiceError> {
    let summary = state.catalog.reload()?;
    state
        .event_sender
        .send_or_log(Event::CatalogReloaded {
            items: summary.items,
            customers: summary.customers,
        })
        .await;
    Ok(Json(summary))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/export", get(export_orders))
        .route("/admin/reload", post(reload_catalog))
}
