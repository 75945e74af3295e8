//! Route handlers.

use std::collections::HashMap;

use axum::{
    extract::{rejection::PathRejection, rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::monthly::{MonthlyIndex, SheetRows};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub index_budget_ms: u64,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    let services = state.services.load();
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        index_budget_ms: services.months.index_budget().as_millis(),
    })
}

/// `GET /api/months?order=&limit=&from=&to=`
pub async fn monthly_index(
    State(state): State<AppState>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<MonthlyIndex>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::Validation(e.body_text()))?;
    let services = state.services.load_full();
    let index = services.months.index(&query, &state.shutdown).await?;
    Ok(Json(index))
}

/// `GET /api/months/{month}/rows`
pub async fn month_rows(
    State(state): State<AppState>,
    month: Result<Path<String>, PathRejection>,
) -> Result<Json<SheetRows>, ApiError> {
    let Path(month) = month.map_err(|e| ApiError::Validation(e.body_text()))?;
    let services = state.services.load_full();
    let rows = services.months.rows(&month, &state.shutdown).await?;
    Ok(Json(rows))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}
