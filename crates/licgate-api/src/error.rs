//! # API Error Types
//!
//! `AppError` is what every handler returns. License, validation and
//! signature failures map to an HTTP status plus a JSON body carrying a
//! machine-readable code. Internal details never reach the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use licgate_core::{CryptoError, ValidationError};
use licgate_state::LicenseError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "PAYMENT_REQUIRED").
    pub code: String,
    /// Display text of the underlying error.
    pub message: String,
}

/// Handler error, rendered through [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// No Publisher record or class at that address (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Well-formed request with unacceptable values (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body or query could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Signature missing or invalid (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Payer cannot cover the price (402).
    #[error("payment required: {0}")]
    PaymentRequired(String),

    /// Valid signature, wrong signer (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with current account state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Invariant or ledger failure (500). Logged, never echoed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::PaymentRequired(_) => (StatusCode::PAYMENT_REQUIRED, "PAYMENT_REQUIRED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Signature failures.
impl From<CryptoError> for AppError {
    fn from(err: CryptoError) -> Self {
        Self::Unauthorized(err.to_string())
    }
}

impl From<LicenseError> for AppError {
    fn from(err: LicenseError) -> Self {
        match &err {
            LicenseError::PublisherNotFound(_) | LicenseError::EntitlementClassNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            LicenseError::AlreadyInitialized(_)
            | LicenseError::AlreadyLicensed(_)
            | LicenseError::NotLicensed(_)
            | LicenseError::MintAuthorityMismatch { .. } => Self::Conflict(err.to_string()),
            LicenseError::InsufficientFunds { .. } => Self::PaymentRequired(err.to_string()),
            LicenseError::Unauthorized(_) => Self::Forbidden(err.to_string()),
            LicenseError::InvalidPrice | LicenseError::EntitlementClassMismatch { .. } => {
                Self::Validation(err.to_string())
            }
            LicenseError::InvariantViolation(_)
            | LicenseError::Record(_)
            | LicenseError::Ledger(_)
            | LicenseError::Canonicalization(_) => Self::Internal(err.to_string()),
        }
    }
}
