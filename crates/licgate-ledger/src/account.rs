//! # Account Types
//!
//! The ledger stores four kinds of state: lamport balances keyed by wallet
//! address, entitlement classes, holding accounts, and opaque record data
//! owned by programs (the license engine's Publisher records).

use licgate_core::{derive_address, Address, CanonicalizationError, EntitlementClass};
use serde::{Deserialize, Serialize};

/// Program id under which holding-account addresses are derived.
pub const HOLDING_PROGRAM_ID: Address = Address::from_tag(b"licgate/holding-accounts/v1");

/// Namespace tag for holding-account derivation.
pub const HOLDING_NAMESPACE: &str = "holding";

/// The canonical holding-account address for `owner`'s balance of `class`.
///
/// One holding account per (owner, class) pair; anyone can recompute it.
pub fn holding_address(
    owner: &Address,
    class: &EntitlementClass,
) -> Result<Address, CanonicalizationError> {
    derive_address(
        &HOLDING_PROGRAM_ID,
        HOLDING_NAMESPACE,
        &[*owner, *class.address()],
    )
}

/// Ledger-side state of an entitlement class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementClassInfo {
    /// The only address allowed to mint, and allowed to burn from any holding.
    pub mint_authority: Address,
    /// Units currently in existence.
    pub supply: u64,
}

/// A subscriber's balance of one entitlement class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingAccount {
    /// The subscriber that owns the balance.
    pub owner: Address,
    /// The class held.
    pub class: EntitlementClass,
    /// Units held.
    pub amount: u64,
}

/// One account a transaction touches, with its access flags.
///
/// The in-memory ledger refuses writes to accounts not declared writable and
/// debits from accounts not declared as signers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMeta {
    /// The account.
    pub address: Address,
    /// Whether the transaction may modify it.
    pub writable: bool,
    /// Whether the transaction carries its owner's signature.
    pub signer: bool,
}

impl AccountMeta {
    /// A writable account.
    pub fn writable(address: Address, signer: bool) -> Self {
        Self {
            address,
            writable: true,
            signer,
        }
    }

    /// A read-only account.
    pub fn readonly(address: Address, signer: bool) -> Self {
        Self {
            address,
            writable: false,
            signer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holding_address_is_per_owner_and_class() {
        let owner = Address::new([1; 32]);
        let class = EntitlementClass::new(Address::new([2; 32]));
        let other_class = EntitlementClass::new(Address::new([3; 32]));
        let a = holding_address(&owner, &class).unwrap();
        assert_eq!(a, holding_address(&owner, &class).unwrap());
        assert_ne!(a, holding_address(&owner, &other_class).unwrap());
        assert_ne!(a, holding_address(&Address::new([9; 32]), &class).unwrap());
    }

    #[test]
    fn meta_constructors_set_flags() {
        let a = Address::new([1; 32]);
        assert!(AccountMeta::writable(a, true).writable);
        assert!(!AccountMeta::readonly(a, false).writable);
        assert!(AccountMeta::readonly(a, true).signer);
    }
}
