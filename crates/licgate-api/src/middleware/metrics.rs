//! # Prometheus Metrics
//!
//! Per-route request counters and latency histograms recorded through the
//! `metrics` facade. Without an installed recorder the macros are no-ops;
//! `main` installs the Prometheus recorder when metrics are enabled and
//! `/metrics` renders it.

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Total requests, labelled by method, route and status.
pub const REQUESTS_TOTAL: &str = "licgate_http_requests_total";

/// Request latency in seconds, labelled by method and route.
pub const REQUEST_DURATION: &str = "licgate_http_request_duration_seconds";

/// Middleware recording one counter increment and one latency sample per request.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!(REQUEST_DURATION, "method" => method, "route" => route)
        .record(start.elapsed().as_secs_f64());

    response
}

pub fn router() -> Router<AppState> {
    Router::new().route("/metrics", get(render))
}

/// GET /metrics — Prometheus text exposition, 404 when metrics are disabled.
async fn render(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}
