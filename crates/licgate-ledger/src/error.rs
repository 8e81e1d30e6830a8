//! Ledger errors.

use licgate_core::{Address, CanonicalizationError, EntitlementClass, Lamports};
use thiserror::Error;

/// Errors raised by the ledger capability.
///
/// Any error returned inside a transaction aborts it; none of its staged
/// writes are applied.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The debited account cannot cover the transfer.
    #[error("insufficient funds in {address}: have {have}, need {need}")]
    InsufficientFunds {
        /// The debited account.
        address: Address,
        /// Its balance.
        have: Lamports,
        /// The requested amount.
        need: Lamports,
    },

    /// No entitlement class exists at this address.
    #[error("entitlement class {0} not found")]
    ClassNotFound(EntitlementClass),

    /// An entitlement class already exists at this address.
    #[error("entitlement class {0} already exists")]
    ClassExists(EntitlementClass),

    /// The caller is not the class's mint authority.
    #[error("mint authority of {class} is {expected}, not {actual}")]
    MintAuthorityMismatch {
        /// The class.
        class: EntitlementClass,
        /// Its recorded mint authority.
        expected: Address,
        /// The address that attempted to act.
        actual: Address,
    },

    /// A holding account exists but belongs to another owner or class.
    #[error("holding account {address} does not match owner {owner} and class {class}")]
    HoldingMismatch {
        /// The holding account.
        address: Address,
        /// Expected owner.
        owner: Address,
        /// Expected class.
        class: EntitlementClass,
    },

    /// Burn exceeds the holding balance.
    #[error("holding {address} has {have} units, cannot burn {need}")]
    InsufficientEntitlement {
        /// The holding account.
        address: Address,
        /// Its balance.
        have: u64,
        /// The requested burn.
        need: u64,
    },

    /// The burning address is neither the holding owner nor the mint authority.
    #[error("{authority} may not burn from {address}")]
    BurnNotAuthorized {
        /// The holding account.
        address: Address,
        /// The address that attempted the burn.
        authority: Address,
    },

    /// A record already exists at this address.
    #[error("record {0} already exists")]
    RecordExists(Address),

    /// No record exists at this address.
    #[error("record {0} not found")]
    RecordNotFound(Address),

    /// The transaction wrote an account it did not declare writable.
    #[error("account {0} written but not declared writable")]
    UndeclaredWrite(Address),

    /// The transaction debited an account that did not sign.
    #[error("account {0} debited without signature")]
    MissingSignature(Address),

    /// A balance or supply would overflow `u64`.
    #[error("arithmetic overflow on {0}")]
    Overflow(Address),

    /// Address derivation failed.
    #[error("derivation failed: {0}")]
    Derivation(#[from] CanonicalizationError),
}
