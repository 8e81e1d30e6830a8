//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "licgate API",
        version = "0.1.0",
        description = "Licensing gate: publishers sell a scarce entitlement unit, subscribers holding it are granted access.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        crate::routes::publishers::initialize_publisher,
        crate::routes::publishers::get_publisher,
        crate::routes::publishers::get_publisher_by_authority,
        crate::routes::licenses::purchase_license,
        crate::routes::licenses::revoke_license,
        crate::routes::licenses::verify_access,
        crate::routes::accounts::get_account,
        crate::routes::audit::get_audit_trail,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::publishers::InitializePayload,
        crate::routes::publishers::InitializeRequest,
        crate::routes::publishers::PublisherResponse,
        crate::routes::licenses::PurchasePayload,
        crate::routes::licenses::SignedPurchase,
        crate::routes::licenses::PurchaseRequest,
        crate::routes::licenses::RevokePayload,
        crate::routes::licenses::RevokeRequest,
        crate::routes::licenses::IssuanceResponse,
        crate::routes::licenses::RevocationResponse,
        crate::routes::licenses::AccessResponse,
        crate::routes::accounts::AccountResponse,
        crate::routes::audit::AuditRecordResponse,
        crate::routes::audit::AuditTrailResponse,
    )),
    tags(
        (name = "publishers", description = "Publisher records"),
        (name = "licenses", description = "Issuance, revocation and access verification"),
        (name = "accounts", description = "Currency balances"),
        (name = "audit", description = "Hash-chained transition log"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/v1/publishers",
            "/v1/publishers/{publisher}",
            "/v1/authorities/{authority}/publisher",
            "/v1/publishers/{publisher}/licenses",
            "/v1/publishers/{publisher}/access/{subscriber}",
            "/v1/accounts/{address}",
            "/v1/audit",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
