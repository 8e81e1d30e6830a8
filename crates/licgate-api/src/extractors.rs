//! # Custom Extractors & Validation
//!
//! Provides the [`Validate`] trait for request DTOs, helpers to extract JSON
//! bodies and query strings, and signature verification for signed requests.

use std::str::FromStr;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;
use licgate_core::Address;
use licgate_crypto::{Ed25519Signature, SignedMessage, Signer};
use serde::Serialize;

use crate::error::AppError;

/// Trait for request types that can validate their business rules
/// beyond what serde deserialization checks.
pub trait Validate {
    /// Validate business rules. Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Extract a query string, mapping parse errors to [`AppError::BadRequest`].
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Parse a hex address from a path segment.
pub fn parse_address(segment: &str) -> Result<Address, AppError> {
    Ok(Address::from_str(segment)?)
}

/// Check `signature` over the canonical bytes of `payload`.
///
/// Returns the payload together with the proven [`Signer`]; a bad signature
/// is [`AppError::Unauthorized`].
pub fn verify_signed<T: Serialize>(
    payload: T,
    signer: Address,
    signature: Ed25519Signature,
) -> Result<(T, Signer), AppError> {
    let message = SignedMessage {
        payload,
        signer,
        signature,
    };
    match message.verify() {
        Ok(proven) => Ok((message.payload, proven)),
        Err(e) => {
            tracing::warn!(signer = %signer, error = %e, "rejected request signature");
            Err(e.into())
        }
    }
}
