//! Per-request stamping: request ID and elapsed time.
//!
//! # Responsibilities
//! - Generate a UUID v4 request ID unless the caller sent one
//! - Measure processing time and report it on every response, success or failure
//! - Record request metrics
//!
//! The elapsed-time middleware is the outermost layer, so even fallback
//! and timeout responses carry the header.

use std::time::Instant;

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::observability::metrics;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_RESPONSE_TIME_MS: &str = "x-response-time-ms";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Middleware adding `x-response-time-ms` to every response.
pub async fn stamp_elapsed(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();

    let mut response = next.run(request).await;

    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    response
        .headers_mut()
        .insert(HeaderName::from_static(X_RESPONSE_TIME_MS), HeaderValue::from(elapsed_ms));
    metrics::record_request(method.as_str(), response.status().as_u16(), start);

    response
}
