//! Request instrumentation layer.
//!
//! Wraps every route (and the fallback) to record:
//! - `agon_http_requests_total{method,endpoint,status}`
//! - `agon_http_request_duration_seconds{method,endpoint}`
//! - `agon_http_requests_in_progress`
//! - `agon_errors_total{error_type}` for any response with status >= 400
//!
//! `endpoint` is the matched route pattern, never the raw URI, so label
//! cardinality stays bounded.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::obs::metrics::GatewayMetrics;

/// Endpoint label for requests that matched no route.
pub const UNMATCHED_ENDPOINT: &str = "unmatched";

/// Failure kind attached to error responses as an extension, read back here to
/// label `agon_errors_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureKind(pub &'static str);

pub async fn track_requests(
    State(metrics): State<Arc<GatewayMetrics>>,
    req: Request,
    next: Next,
) -> Response {
    let _in_flight = metrics.track_in_flight();
    let start = Instant::now();

    let method = req.method().as_str().to_owned();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ENDPOINT.to_owned());

    let response = next.run(req).await;

    let elapsed = start.elapsed();
    let status = response.status();
    let status_s = status.as_u16().to_string();

    metrics.http_requests.inc(&[
        ("method", method.as_str()),
        ("endpoint", endpoint.as_str()),
        ("status", status_s.as_str()),
    ]);
    metrics.http_request_duration.observe_duration(
        &[("method", method.as_str()), ("endpoint", endpoint.as_str())],
        elapsed,
    );

    if status.is_client_error() || status.is_server_error() {
        let kind = response
            .extensions()
            .get::<FailureKind>()
            .map(|k| k.0)
            .unwrap_or_else(|| kind_for_status(status));
        metrics.record_error(kind);
    }

    tracing::debug!(
        %method,
        %endpoint,
        status = status.as_u16(),
        latency_us = elapsed.as_micros() as u64,
        "request"
    );

    response
}

/// Fallback kind for framework-level failures that carry no `FailureKind`.
fn kind_for_status(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NOT_FOUND => "NotFound",
        StatusCode::METHOD_NOT_ALLOWED => "MethodNotAllowed",
        StatusCode::PAYLOAD_TOO_LARGE => "PayloadTooLarge",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UnsupportedMediaType",
        s if s.is_server_error() => "ServerError",
        _ => "ClientError",
    }
}
