//! # License Errors
//!
//! Every failure aborts the enclosing transaction. Callers get a typed
//! variant, never a generic failure, and `Unauthorized` is always
//! distinguishable from `PublisherNotFound`.

use licgate_core::{Address, CanonicalizationError, EntitlementClass, Lamports};
use licgate_ledger::LedgerError;
use thiserror::Error;

/// Errors from the license lifecycle operations.
#[derive(Error, Debug)]
pub enum LicenseError {
    /// A Publisher record already exists for this authority.
    #[error("publisher {0} is already initialized")]
    AlreadyInitialized(Address),

    /// No Publisher record exists at this address.
    #[error("publisher {0} not found")]
    PublisherNotFound(Address),

    /// License price must be greater than zero.
    #[error("license price must be greater than zero")]
    InvalidPrice,

    /// The payer cannot cover the license price.
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds {
        /// Payer balance.
        have: Lamports,
        /// License price.
        need: Lamports,
    },

    /// The signer is not the Publisher's authority.
    #[error("{0} is not the publisher authority")]
    Unauthorized(Address),

    /// The subscriber holds no license to revoke.
    #[error("subscriber {0} holds no license")]
    NotLicensed(Address),

    /// The subscriber already holds a license and re-purchase is rejected.
    #[error("subscriber {0} already holds a license")]
    AlreadyLicensed(Address),

    /// Counter or balance arithmetic left its valid range.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The entitlement class does not exist on the ledger.
    #[error("entitlement class {0} not found")]
    EntitlementClassNotFound(EntitlementClass),

    /// The requested class is not the one this Publisher issues.
    #[error("publisher issues {expected}, not {actual}")]
    EntitlementClassMismatch {
        /// The Publisher's class.
        expected: EntitlementClass,
        /// The class supplied by the caller.
        actual: EntitlementClass,
    },

    /// The class's mint authority is neither the signer nor the Publisher.
    #[error("mint authority of {class} is {mint_authority}")]
    MintAuthorityMismatch {
        /// The class.
        class: EntitlementClass,
        /// Its current mint authority.
        mint_authority: Address,
    },

    /// A stored Publisher record could not be decoded.
    #[error("publisher record: {0}")]
    Record(#[from] RecordError),

    /// Any other ledger failure.
    #[error("ledger: {0}")]
    Ledger(LedgerError),

    /// Address derivation or audit hashing failed.
    #[error("canonicalization: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

impl From<LedgerError> for LicenseError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds { have, need, .. } => Self::InsufficientFunds { have, need },
            LedgerError::ClassNotFound(class) => Self::EntitlementClassNotFound(class),
            LedgerError::MintAuthorityMismatch {
                class, expected, ..
            } => Self::MintAuthorityMismatch {
                class,
                mint_authority: expected,
            },
            LedgerError::Derivation(e) => Self::Canonicalization(e),
            other => Self::Ledger(other),
        }
    }
}

/// Errors decoding the fixed Publisher record layout.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Data length differs from the record layout.
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Layout length.
        expected: usize,
        /// Stored length.
        actual: usize,
    },

    /// The leading discriminator does not identify a Publisher record.
    #[error("discriminator mismatch")]
    DiscriminatorMismatch,
}

/// Errors detected while verifying the audit hash chain.
#[derive(Error, Debug)]
pub enum AuditError {
    /// Sequence numbers are not contiguous from zero.
    #[error("expected sequence {expected}, found {found}")]
    SequenceGap {
        /// Expected sequence number.
        expected: u64,
        /// Sequence number found.
        found: u64,
    },

    /// A record's back-link does not match its predecessor's digest.
    #[error("record {sequence} does not link to its predecessor")]
    BrokenLink {
        /// The offending record.
        sequence: u64,
    },

    /// A record's content no longer hashes to its stored digest.
    #[error("record {sequence} digest mismatch")]
    DigestMismatch {
        /// The offending record.
        sequence: u64,
    },

    /// A record could not be canonicalized.
    #[error("canonicalization: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_funds_error_maps_to_license_variant() {
        let err: LicenseError = LedgerError::InsufficientFunds {
            address: Address::new([1; 32]),
            have: Lamports(5),
            need: Lamports(9),
        }
        .into();
        assert!(matches!(
            err,
            LicenseError::InsufficientFunds {
                have: Lamports(5),
                need: Lamports(9)
            }
        ));
    }

    #[test]
    fn missing_class_maps_to_license_variant() {
        let class = EntitlementClass::new(Address::new([2; 32]));
        let err: LicenseError = LedgerError::ClassNotFound(class).into();
        assert!(matches!(err, LicenseError::EntitlementClassNotFound(c) if c == class));
    }

    #[test]
    fn other_ledger_errors_are_wrapped() {
        let err: LicenseError = LedgerError::UndeclaredWrite(Address::new([3; 32])).into();
        assert!(matches!(err, LicenseError::Ledger(LedgerError::UndeclaredWrite(_))));
    }

    #[test]
    fn unauthorized_and_not_found_render_differently() {
        let a = Address::new([4; 32]);
        assert_ne!(
            LicenseError::Unauthorized(a).to_string(),
            LicenseError::PublisherNotFound(a).to_string()
        );
    }
}
