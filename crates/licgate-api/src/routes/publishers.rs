//! # Publisher Routes
//!
//! - `POST /v1/publishers` — signed initialize; the signer becomes the authority
//! - `GET  /v1/publishers/{publisher}` — fetch a Publisher record
//! - `GET  /v1/authorities/{authority}/publisher` — derive and fetch

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use licgate_core::{Address, EntitlementClass, Lamports, Timestamp};
use licgate_crypto::Ed25519Signature;
use licgate_state::Publisher;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_validated_json, parse_address, verify_signed, Validate};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Signed content of an initialize request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct InitializePayload {
    /// Class to mint as this publisher's license (hex).
    #[schema(value_type = String)]
    pub entitlement_class: EntitlementClass,
    /// Price per issuance in lamports. Must be > 0.
    #[schema(value_type = u64)]
    pub license_price: Lamports,
    /// Signer-chosen; accepted once per signer.
    pub nonce: u64,
    /// RFC 3339 deadline, at most the configured window ahead.
    #[schema(value_type = String)]
    pub expires_at: Timestamp,
}

/// Initialize request signed by the intended authority.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct InitializeRequest {
    pub payload: InitializePayload,
    /// Authority address (Ed25519 public key, hex).
    #[schema(value_type = String)]
    pub signer: Address,
    /// Signature over the canonical JSON of `payload` (hex).
    #[schema(value_type = String)]
    pub signature: Ed25519Signature,
}

impl Validate for InitializeRequest {
    fn validate(&self) -> Result<(), String> {
        if self.payload.license_price.is_zero() {
            return Err("license_price must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// A Publisher record.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublisherResponse {
    /// Record address (hex).
    pub address: String,
    pub authority: String,
    pub entitlement_class: String,
    /// Lamports per issuance.
    pub license_price: u64,
    pub total_subscribers: u64,
}

impl PublisherResponse {
    fn new(address: &Address, record: &Publisher) -> Self {
        Self {
            address: address.to_hex(),
            authority: record.authority.to_hex(),
            entitlement_class: record.entitlement_class.to_string(),
            license_price: record.license_price.get(),
            total_subscribers: record.total_subscribers,
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/publishers", post(initialize_publisher))
        .route("/v1/publishers/{publisher}", get(get_publisher))
        .route(
            "/v1/authorities/{authority}/publisher",
            get(get_publisher_by_authority),
        )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/publishers — Create the signer's Publisher record.
#[utoipa::path(
    post,
    path = "/v1/publishers",
    request_body = InitializeRequest,
    responses(
        (status = 201, description = "Publisher initialized", body = PublisherResponse),
        (status = 401, description = "Invalid signature", body = ErrorBody),
        (status = 404, description = "Entitlement class not found", body = ErrorBody),
        (status = 409, description = "Already initialized, class minted by someone else, or nonce reused", body = ErrorBody),
        (status = 422, description = "Invalid price", body = ErrorBody),
    ),
    tag = "publishers"
)]
pub async fn initialize_publisher(
    State(state): State<AppState>,
    body: Result<Json<InitializeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PublisherResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let (payload, authority) = verify_signed(req.payload, req.signer, req.signature)?;
    state
        .replay
        .consume(&[*authority.address()], payload.nonce, payload.expires_at)?;
    let address = state.engine.initialize(
        &authority,
        payload.entitlement_class,
        payload.license_price,
    )?;
    let record = state.engine.publisher(&address)?;
    Ok((
        StatusCode::CREATED,
        Json(PublisherResponse::new(&address, &record)),
    ))
}

/// GET /v1/publishers/{publisher} — Fetch a Publisher record.
#[utoipa::path(
    get,
    path = "/v1/publishers/{publisher}",
    params(("publisher" = String, Path, description = "Publisher record address (hex)")),
    responses(
        (status = 200, description = "Publisher record", body = PublisherResponse),
        (status = 404, description = "No record at this address", body = ErrorBody),
        (status = 422, description = "Malformed address", body = ErrorBody),
    ),
    tag = "publishers"
)]
pub async fn get_publisher(
    State(state): State<AppState>,
    Path(publisher): Path<String>,
) -> Result<Json<PublisherResponse>, AppError> {
    let address = parse_address(&publisher)?;
    let record = state.engine.publisher(&address)?;
    Ok(Json(PublisherResponse::new(&address, &record)))
}

/// GET /v1/authorities/{authority}/publisher — Derive the authority's
/// Publisher address and fetch the record.
#[utoipa::path(
    get,
    path = "/v1/authorities/{authority}/publisher",
    params(("authority" = String, Path, description = "Authority address (hex)")),
    responses(
        (status = 200, description = "Publisher record", body = PublisherResponse),
        (status = 404, description = "Authority has not initialized", body = ErrorBody),
        (status = 422, description = "Malformed address", body = ErrorBody),
    ),
    tag = "publishers"
)]
pub async fn get_publisher_by_authority(
    State(state): State<AppState>,
    Path(authority): Path<String>,
) -> Result<Json<PublisherResponse>, AppError> {
    let authority = parse_address(&authority)?;
    let address = state.engine.publisher_address(&authority)?;
    let record = state.engine.publisher(&address)?;
    Ok(Json(PublisherResponse::new(&address, &record)))
}
