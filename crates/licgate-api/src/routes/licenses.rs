//! # License Routes
//!
//! - `POST   /v1/publishers/{publisher}/licenses` — purchase, signed by the
//!   subscriber (and the payer, when someone else pays)
//! - `DELETE /v1/publishers/{publisher}/licenses` — revoke, signed by the
//!   Publisher's authority
//! - `GET    /v1/publishers/{publisher}/access/{subscriber}?entitlement_class=`
//!   — verify; unauthenticated and read-only
//!
//! Every signed payload names the publisher it targets. A payload signed for
//! one publisher is rejected on another's route.
//!
//! Purchase terms name the subscriber, the payer and the price, and the
//! payer must co-sign exactly the subscriber's terms. A payer's consent can
//! therefore not be attached to someone else's purchase, and a changed price
//! voids old signatures. Each payload's `(signer, nonce)` is accepted once
//! before `expires_at`, so captured requests cannot be replayed.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use licgate_core::{Address, EntitlementClass, Lamports, Timestamp};
use licgate_crypto::Ed25519Signature;
use licgate_state::{IssuanceReceipt, RevocationReceipt};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_json, extract_query, parse_address, verify_signed};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Purchase terms. The subscriber signs them, and so does the payer when
/// someone else pays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct PurchasePayload {
    /// Publisher record address (hex).
    #[schema(value_type = String)]
    pub publisher: Address,
    /// Who receives the license (hex).
    #[schema(value_type = String)]
    pub subscriber: Address,
    /// Who is debited (hex). Equal to `subscriber` when self-paying.
    #[schema(value_type = String)]
    pub payer: Address,
    /// Price the signers agree to, in lamports. Must equal the license price.
    #[schema(value_type = u64)]
    pub license_price: Lamports,
    /// Signer-chosen; accepted once per signer.
    pub nonce: u64,
    /// RFC 3339 deadline, at most the configured window ahead.
    #[schema(value_type = String)]
    pub expires_at: Timestamp,
}

/// One co-signature on a purchase.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SignedPurchase {
    pub payload: PurchasePayload,
    #[schema(value_type = String)]
    pub signer: Address,
    #[schema(value_type = String)]
    pub signature: Ed25519Signature,
}

/// Purchase request. Without `payer` the terms must name the subscriber as
/// payer.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct PurchaseRequest {
    pub subscriber: SignedPurchase,
    #[serde(default)]
    pub payer: Option<SignedPurchase>,
}

/// Signed content of a revocation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RevokePayload {
    #[schema(value_type = String)]
    pub publisher: Address,
    #[schema(value_type = String)]
    pub entitlement_class: EntitlementClass,
    #[schema(value_type = String)]
    pub subscriber: Address,
    /// Signer-chosen; accepted once per signer.
    pub nonce: u64,
    /// RFC 3339 deadline, at most the configured window ahead.
    #[schema(value_type = String)]
    pub expires_at: Timestamp,
}

/// Revocation request signed by the Publisher's authority.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RevokeRequest {
    pub payload: RevokePayload,
    #[schema(value_type = String)]
    pub signer: Address,
    #[schema(value_type = String)]
    pub signature: Ed25519Signature,
}

/// A committed issuance.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IssuanceResponse {
    pub publisher: String,
    pub subscriber: String,
    pub payer: String,
    /// Subscriber's holding account (hex).
    pub holding: String,
    pub entitlement_class: String,
    /// Lamports charged.
    pub price_paid: u64,
    /// Subscriber balance after minting.
    pub balance: u64,
    pub total_subscribers: u64,
    /// Audit sequence number.
    pub sequence: u64,
}

impl From<IssuanceReceipt> for IssuanceResponse {
    fn from(r: IssuanceReceipt) -> Self {
        Self {
            publisher: r.publisher.to_hex(),
            subscriber: r.subscriber.to_hex(),
            payer: r.payer.to_hex(),
            holding: r.holding.to_hex(),
            entitlement_class: r.entitlement_class.to_string(),
            price_paid: r.price_paid.get(),
            balance: r.balance,
            total_subscribers: r.total_subscribers,
            sequence: r.sequence,
        }
    }
}

/// A committed revocation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevocationResponse {
    pub publisher: String,
    pub subscriber: String,
    pub holding: String,
    pub entitlement_class: String,
    /// Units burned.
    pub burned: u64,
    pub total_subscribers: u64,
    /// Audit sequence number.
    pub sequence: u64,
}

impl From<RevocationReceipt> for RevocationResponse {
    fn from(r: RevocationReceipt) -> Self {
        Self {
            publisher: r.publisher.to_hex(),
            subscriber: r.subscriber.to_hex(),
            holding: r.holding.to_hex(),
            entitlement_class: r.entitlement_class.to_string(),
            burned: r.burned,
            total_subscribers: r.total_subscribers,
            sequence: r.sequence,
        }
    }
}

/// Query for access verification.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AccessQuery {
    /// Class to check (hex). Must be the Publisher's class.
    #[param(value_type = String)]
    pub entitlement_class: EntitlementClass,
}

/// Verification result.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessResponse {
    pub publisher: String,
    pub subscriber: String,
    pub entitlement_class: String,
    /// Whether the subscriber holds at least one unit.
    pub granted: bool,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/publishers/{publisher}/licenses",
            post(purchase_license).delete(revoke_license),
        )
        .route(
            "/v1/publishers/{publisher}/access/{subscriber}",
            get(verify_access),
        )
}

fn require_target(path: &Address, signed: &Address) -> Result<(), AppError> {
    if path != signed {
        return Err(AppError::Validation(format!(
            "signed payload targets publisher {signed}, not {path}"
        )));
    }
    Ok(())
}

/// The party the terms name must be the party that signed them.
fn require_party(role: &str, named: &Address, signer: &Address) -> Result<(), AppError> {
    if named != signer {
        tracing::warn!(role, named = %named, signer = %signer, "purchase terms signed by the wrong party");
        return Err(AppError::Forbidden(format!(
            "terms name {role} {named}, signed by {signer}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/publishers/{publisher}/licenses — Buy a license.
#[utoipa::path(
    post,
    path = "/v1/publishers/{publisher}/licenses",
    params(("publisher" = String, Path, description = "Publisher record address (hex)")),
    request_body = PurchaseRequest,
    responses(
        (status = 201, description = "License issued", body = IssuanceResponse),
        (status = 401, description = "Invalid signature", body = ErrorBody),
        (status = 402, description = "Payer cannot cover the price", body = ErrorBody),
        (status = 403, description = "Terms signed by a party they do not name, or payer signed other terms", body = ErrorBody),
        (status = 404, description = "Publisher not found", body = ErrorBody),
        (status = 409, description = "Subscriber already licensed, or nonce reused", body = ErrorBody),
        (status = 422, description = "Terms target another publisher or price, or deadline too far ahead", body = ErrorBody),
    ),
    tag = "licenses"
)]
pub async fn purchase_license(
    State(state): State<AppState>,
    Path(publisher): Path<String>,
    body: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IssuanceResponse>), AppError> {
    let publisher = parse_address(&publisher)?;
    let req = extract_json(body)?;

    let s = req.subscriber;
    let (terms, subscriber) = verify_signed(s.payload, s.signer, s.signature)?;
    require_target(&publisher, &terms.publisher)?;
    require_party("subscriber", &terms.subscriber, subscriber.address())?;
    let payer = match req.payer {
        Some(p) => {
            let (payer_terms, payer) = verify_signed(p.payload, p.signer, p.signature)?;
            if payer_terms != terms {
                tracing::warn!(payer = %payer.address(), "payer co-signed different purchase terms");
                return Err(AppError::Forbidden(
                    "payer co-signed different purchase terms".to_string(),
                ));
            }
            payer
        }
        None => subscriber,
    };
    require_party("payer", &terms.payer, payer.address())?;

    let price = state.engine.publisher(&publisher)?.license_price;
    if terms.license_price != price {
        return Err(AppError::Validation(format!(
            "terms agree to {}, license costs {price}",
            terms.license_price
        )));
    }

    let mut signers = vec![*subscriber.address()];
    if payer != subscriber {
        signers.push(*payer.address());
    }
    state
        .replay
        .consume(&signers, terms.nonce, terms.expires_at)?;

    let receipt = state
        .engine
        .purchase_license(&publisher, &subscriber, &payer)?;
    metrics::counter!("licgate_licenses_issued_total").increment(1);
    Ok((StatusCode::CREATED, Json(receipt.into())))
}

/// DELETE /v1/publishers/{publisher}/licenses — Revoke a subscriber's license.
#[utoipa::path(
    delete,
    path = "/v1/publishers/{publisher}/licenses",
    params(("publisher" = String, Path, description = "Publisher record address (hex)")),
    request_body = RevokeRequest,
    responses(
        (status = 200, description = "License revoked", body = RevocationResponse),
        (status = 401, description = "Invalid signature", body = ErrorBody),
        (status = 403, description = "Signer is not the publisher authority", body = ErrorBody),
        (status = 404, description = "Publisher not found", body = ErrorBody),
        (status = 409, description = "Subscriber holds no license, or nonce reused", body = ErrorBody),
    ),
    tag = "licenses"
)]
pub async fn revoke_license(
    State(state): State<AppState>,
    Path(publisher): Path<String>,
    body: Result<Json<RevokeRequest>, JsonRejection>,
) -> Result<Json<RevocationResponse>, AppError> {
    let publisher = parse_address(&publisher)?;
    let req = extract_json(body)?;
    let (payload, authority) = verify_signed(req.payload, req.signer, req.signature)?;
    require_target(&publisher, &payload.publisher)?;
    state
        .replay
        .consume(&[*authority.address()], payload.nonce, payload.expires_at)?;

    let receipt = state.engine.revoke_license(
        &publisher,
        &payload.entitlement_class,
        &authority,
        &payload.subscriber,
    )?;
    metrics::counter!("licgate_licenses_revoked_total").increment(1);
    Ok(Json(receipt.into()))
}

/// GET /v1/publishers/{publisher}/access/{subscriber} — Does the subscriber
/// hold a license?
#[utoipa::path(
    get,
    path = "/v1/publishers/{publisher}/access/{subscriber}",
    params(
        ("publisher" = String, Path, description = "Publisher record address (hex)"),
        ("subscriber" = String, Path, description = "Subscriber address (hex)"),
        AccessQuery,
    ),
    responses(
        (status = 200, description = "Verification result", body = AccessResponse),
        (status = 404, description = "Publisher not found", body = ErrorBody),
        (status = 422, description = "Class is not the publisher's", body = ErrorBody),
    ),
    tag = "licenses"
)]
pub async fn verify_access(
    State(state): State<AppState>,
    Path((publisher, subscriber)): Path<(String, String)>,
    query: Result<Query<AccessQuery>, QueryRejection>,
) -> Result<Json<AccessResponse>, AppError> {
    let publisher = parse_address(&publisher)?;
    let subscriber = parse_address(&subscriber)?;
    let query = extract_query(query)?;
    let granted = state
        .engine
        .verify_access(&publisher, &subscriber, &query.entitlement_class)?;
    Ok(Json(AccessResponse {
        publisher: publisher.to_hex(),
        subscriber: subscriber.to_hex(),
        entitlement_class: query.entitlement_class.to_string(),
        granted,
    }))
}
