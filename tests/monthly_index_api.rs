//! End-to-end tests for the monthly index and rows endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use sheet_dashboard::http::{X_REQUEST_ID, X_RESPONSE_TIME_MS};
use sheet_dashboard::sheets::InMemorySource;

mod common;

use common::{app, get, tab, test_config, year_of_tabs};

#[tokio::test]
async fn test_index_round_trip() {
    let source = Arc::new(InMemorySource::new(vec![
        tab(10, "2025-09", 1),
        tab(11, "2025-10", 0),
    ]));
    let router = app(test_config(1_000), source.clone());

    let (status, headers, body) = get(&router, "/api/months").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["months"], json!(["2025-10", "2025-09"]));
    assert_eq!(body["latestMonth"], "2025-10");
    assert_eq!(body["tabs"]["2025-10"]["sheetId"], 11);
    assert_eq!(body["tabs"]["2025-09"]["title"], "2025/09");
    assert!(headers.contains_key(X_RESPONSE_TIME_MS));
    assert!(headers.contains_key(X_REQUEST_ID));
    assert_eq!(source.list_calls(), 1);
}

#[tokio::test]
async fn test_filters_and_order() {
    let router = app(test_config(1_000), Arc::new(InMemorySource::new(year_of_tabs())));

    let (status, _, body) = get(&router, "/api/months?order=asc&limit=3&from=2025-04&to=2025-10").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["months"], json!(["2025-04", "2025-05", "2025-06"]));
    assert_eq!(body["latestMonth"], "2025-06");
    assert_eq!(body["tabs"].as_object().unwrap().len(), 3);
}

#[tokio::test]
async fn test_empty_range_has_no_latest() {
    let router = app(test_config(1_000), Arc::new(InMemorySource::new(year_of_tabs())));

    let (status, _, body) = get(&router, "/api/months?from=2026-01").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["months"], json!([]));
    assert!(body.get("latestMonth").is_none());
}

#[tokio::test]
async fn test_invalid_order_rejected_before_source() {
    let source = Arc::new(InMemorySource::new(year_of_tabs()));
    let router = app(test_config(1_000), source.clone());

    let (status, headers, body) = get(&router, "/api/months?order=down").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("order"));
    assert!(headers.contains_key(X_RESPONSE_TIME_MS));
    assert_eq!(source.list_calls(), 0);
}

#[tokio::test]
async fn test_limit_bounds() {
    let router = app(test_config(1_000), Arc::new(InMemorySource::new(year_of_tabs())));

    for bad in ["0", "101", "-1", "+3", "ten"] {
        let (status, _, body) = get(&router, &format!("/api/months?limit={bad}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "limit={bad}");
        assert!(body["error"].as_str().unwrap().contains("limit"));
    }

    let (status, _, body) = get(&router, "/api/months?limit=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["months"], json!(["2025-12"]));

    let (status, _, body) = get(&router, "/api/months?limit=100").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["months"].as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn test_malformed_month_bounds_rejected() {
    let router = app(test_config(1_000), Arc::new(InMemorySource::new(year_of_tabs())));

    for uri in ["/api/months?from=2025-13", "/api/months?to=2025-1", "/api/months?from=yesterday"] {
        let (status, _, _) = get(&router, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_source_times_out() {
    let source = Arc::new(InMemorySource::new(year_of_tabs()).with_latency(Duration::from_secs(5)));
    let router = app(test_config(50), source);

    let (status, headers, body) = get(&router, "/api/months").await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body, json!({"error": "Request timed out"}));
    assert!(headers.contains_key(X_RESPONSE_TIME_MS));
}

#[tokio::test]
async fn test_failing_source_is_internal_error() {
    let source = Arc::new(InMemorySource::new(year_of_tabs()).failing("quota exceeded"));
    let router = app(test_config(1_000), source);

    let (status, _, body) = get(&router, "/api/months").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));
}

#[tokio::test]
async fn test_duplicate_months_are_internal_error() {
    let source = Arc::new(InMemorySource::new(vec![
        tab(1, "2025-03", 0),
        tab(2, "2025-03", 1),
    ]));
    let router = app(test_config(1_000), source);

    let (status, _, _) = get(&router, "/api/months").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _, _) = get(&router, "/api/months/2025-03/rows").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_repeated_requests_are_identical() {
    let router = app(test_config(1_000), Arc::new(InMemorySource::new(year_of_tabs())));

    let (_, _, first) = get(&router, "/api/months?order=asc&limit=6").await;
    let (_, _, second) = get(&router, "/api/months?order=asc&limit=6").await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_caller_request_id_is_echoed() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let router = app(test_config(1_000), Arc::new(InMemorySource::new(year_of_tabs())));
    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(X_REQUEST_ID, "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()[X_REQUEST_ID], "abc-123");
}

#[tokio::test]
async fn test_month_rows() {
    let source = Arc::new(
        InMemorySource::new(vec![tab(7, "2025-07", 0)])
            .with_rows(7, vec![vec![json!("Task"), json!(3)]]),
    );
    let router = app(test_config(1_000), source.clone());

    let (status, _, body) = get(&router, "/api/months/2025-07/rows").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["yearMonth"], "2025-07");
    assert_eq!(body["sheetId"], 7);
    assert_eq!(body["rows"], json!([["Task", 3]]));
    assert_eq!(source.row_calls(), 1);

    let (status, _, _) = get(&router, "/api/months/2025-08/rows").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = get(&router, "/api/months/2025-13/rows").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_route_and_health() {
    let router = app(test_config(1_000), Arc::new(InMemorySource::default()));

    let (status, headers, body) = get(&router, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
    assert!(headers.contains_key(X_RESPONSE_TIME_MS));

    let (status, _, body) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["indexBudgetMs"], 1_000);
}
