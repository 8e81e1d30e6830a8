//! # Audit Routes
//!
//! - `GET /v1/audit?from=&limit=` — one page of the hash-chained transition
//!   log, oldest first. `chain_valid` covers the returned page and its link
//!   to the record before it; walking every page checks the whole trail.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use licgate_state::LicenseTransitionRecord;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, ErrorBody};
use crate::extractors::extract_query;
use crate::state::AppState;

/// Page size when `limit` is omitted.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Largest accepted `limit`.
pub const MAX_PAGE_SIZE: usize = 1000;

/// One committed transition.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuditRecordResponse {
    pub sequence: u64,
    /// `initialize`, `issue` or `revoke`.
    pub action: String,
    pub publisher: String,
    /// Subscriber, or the authority for `initialize`.
    pub subject: String,
    pub from_state: Option<String>,
    pub to_state: Option<String>,
    pub subscribers_after: u64,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub prev_digest: Option<String>,
    pub digest: String,
}

impl From<&LicenseTransitionRecord> for AuditRecordResponse {
    fn from(r: &LicenseTransitionRecord) -> Self {
        let t = &r.transition;
        Self {
            sequence: r.sequence,
            action: t.action.to_string(),
            publisher: t.publisher.to_hex(),
            subject: t.subject.to_hex(),
            from_state: t.from_state.map(|s| s.to_string()),
            to_state: t.to_state.map(|s| s.to_string()),
            subscribers_after: t.subscribers_after,
            timestamp: r.timestamp.to_iso8601(),
            prev_digest: r.prev_digest.map(|d| d.to_hex()),
            digest: r.digest.to_hex(),
        }
    }
}

/// Paging window.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditQuery {
    /// First sequence number to return. Defaults to 0.
    pub from: Option<u64>,
    /// Records per page, 1 to 1000. Defaults to 100.
    pub limit: Option<usize>,
}

/// One page of the audit trail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuditTrailResponse {
    pub records: Vec<AuditRecordResponse>,
    /// Records in the whole trail.
    pub total: u64,
    /// `from` for the following page, absent on the last page.
    pub next: Option<u64>,
    /// Digest of the newest record in the whole trail.
    pub head: Option<String>,
    /// Whether this page's links and digests check out.
    pub chain_valid: bool,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/audit", get(get_audit_trail))
}

/// GET /v1/audit — One page of committed transitions.
#[utoipa::path(
    get,
    path = "/v1/audit",
    params(AuditQuery),
    responses(
        (status = 200, description = "Audit trail page", body = AuditTrailResponse),
        (status = 400, description = "Malformed query", body = ErrorBody),
        (status = 422, description = "Limit out of range", body = ErrorBody),
    ),
    tag = "audit"
)]
pub async fn get_audit_trail(
    State(state): State<AppState>,
    query: Result<Query<AuditQuery>, QueryRejection>,
) -> Result<Json<AuditTrailResponse>, AppError> {
    let query = extract_query(query)?;
    let from = query.from.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }

    let page = state.engine.audit_page(from, limit);
    let chain_valid = match &page.verification {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(from, limit, error = %e, "audit chain verification failed");
            false
        }
    };
    let next = page
        .records
        .last()
        .map(|r| r.sequence.saturating_add(1))
        .filter(|n| *n < page.total);
    Ok(Json(AuditTrailResponse {
        records: page.records.iter().map(AuditRecordResponse::from).collect(),
        total: page.total,
        next,
        head: page.head.map(|d| d.to_hex()),
        chain_valid,
    }))
}
