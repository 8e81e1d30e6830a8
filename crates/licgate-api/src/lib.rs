//! # licgate-api — Axum RPC Surface
//!
//! Exposes the license engine over HTTP. Mutating operations take signed
//! requests: the body carries a payload, the signer's address and an Ed25519
//! signature over the payload's canonical JSON. Each payload also carries a
//! `nonce` and an `expires_at` deadline, and [`replay::ReplayGuard`] accepts
//! a `(signer, nonce)` pair once. Verification and queries are
//! unauthenticated.
//!
//! ## API Surface
//!
//! | Route | Module | Operation |
//! |---|---|---|
//! | `POST /v1/publishers` | [`routes::publishers`] | initialize |
//! | `GET /v1/publishers/{publisher}` | [`routes::publishers`] | fetch record |
//! | `GET /v1/authorities/{authority}/publisher` | [`routes::publishers`] | derive + fetch |
//! | `POST /v1/publishers/{publisher}/licenses` | [`routes::licenses`] | purchase |
//! | `DELETE /v1/publishers/{publisher}/licenses` | [`routes::licenses`] | revoke |
//! | `GET /v1/publishers/{publisher}/access/{subscriber}` | [`routes::licenses`] | verify |
//! | `GET /v1/accounts/{address}` | [`routes::accounts`] | balance |
//! | `GET /v1/audit` | [`routes::audit`] | audit trail |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → metrics_middleware → Handler
//! ```

pub mod bootstrap;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod replay;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) sit outside the metrics and trace layers.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::publishers::router())
        .merge(routes::licenses::router())
        .merge(routes::accounts::router())
        .merge(routes::audit::router())
        .merge(openapi::router())
        .merge(middleware::metrics::router())
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — the ledger is in memory, so ready once serving.
async fn readiness() -> &'static str {
    "ready"
}
