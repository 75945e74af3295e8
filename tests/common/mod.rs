//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::Path,
    http::{HeaderMap, Request, StatusCode},
    routing::get as route_get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

use sheet_dashboard::config::DashboardConfig;
use sheet_dashboard::monthly::MonthlyTabMeta;
use sheet_dashboard::resilience::AbortSignal;
use sheet_dashboard::sheets::{InMemorySource, MonthlySource};
use sheet_dashboard::HttpServer;

/// Monthly tab for `year_month` ("YYYY-MM"), titled the way users name them.
pub fn tab(sheet_id: i64, year_month: &str, index: u32) -> MonthlyTabMeta {
    let ym = year_month.parse().unwrap();
    MonthlyTabMeta::new(sheet_id, year_month.replace('-', "/"), ym, index)
}

/// Twelve consecutive months of 2025, deliberately out of calendar order.
pub fn year_of_tabs() -> Vec<MonthlyTabMeta> {
    let mut tabs: Vec<_> = (1..=12)
        .map(|m| tab(100 + m as i64, &format!("2025-{:02}", m), m))
        .collect();
    tabs.rotate_left(5);
    tabs
}

/// Defaults with short budgets so timeout tests stay fast.
pub fn test_config(index_budget_ms: u64) -> DashboardConfig {
    let mut config = DashboardConfig::default();
    config.timeouts.index_budget_ms = index_budget_ms;
    config.timeouts.rows_budget_ms = index_budget_ms;
    config
}

pub fn app(config: DashboardConfig, source: Arc<InMemorySource>) -> Router {
    let source: Arc<dyn MonthlySource> = source;
    HttpServer::with_source(config, source, AbortSignal::never())
        .unwrap()
        .router()
}

/// Send a GET through the router and decode the JSON body.
pub async fn get(router: &Router, uri: &str) -> (StatusCode, HeaderMap, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

/// Start a mock sheet service on an ephemeral port.
///
/// Serves `/tabs` and `/tabs/{id}/rows`; every response is delayed by `delay`.
pub async fn start_mock_sheet_service(delay: Duration) -> SocketAddr {
    let router = Router::new()
        .route(
            "/tabs",
            route_get(move || async move {
                tokio::time::sleep(delay).await;
                Json(json!({
                    "tabs": [
                        {"sheetId": 1, "title": "2025年10月", "index": 0},
                        {"sheetId": 2, "title": "Summary", "index": 1},
                        {"sheetId": 3, "title": "2025-09", "index": 2}
                    ]
                }))
            }),
        )
        .route(
            "/tabs/{id}/rows",
            route_get(move |Path(id): Path<i64>| async move {
                tokio::time::sleep(delay).await;
                match id {
                    1 => Ok(Json(json!({"rows": [["Task", "Owner"], ["Ship", "Ana"]]}))),
                    3 => Ok(Json(json!({"rows": []}))),
                    _ => Err(StatusCode::NOT_FOUND),
                }
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}
