//! # Account Routes
//!
//! - `GET /v1/accounts/{address}` — lamport balance of any address

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, ErrorBody};
use crate::extractors::parse_address;
use crate::state::AppState;

/// Currency balance of one address.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub address: String,
    pub lamports: u64,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/accounts/{address}", get(get_account))
}

/// GET /v1/accounts/{address} — Lamport balance. Unfunded addresses hold zero.
#[utoipa::path(
    get,
    path = "/v1/accounts/{address}",
    params(("address" = String, Path, description = "Account address (hex)")),
    responses(
        (status = 200, description = "Account balance", body = AccountResponse),
        (status = 422, description = "Malformed address", body = ErrorBody),
    ),
    tag = "accounts"
)]
pub async fn get_account(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<AccountResponse>, AppError> {
    let address = parse_address(&address)?;
    Ok(Json(AccountResponse {
        address: address.to_hex(),
        lamports: state.ledger.lamports(&address).get(),
    }))
}
