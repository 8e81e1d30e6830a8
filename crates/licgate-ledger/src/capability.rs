//! # Ledger Capability
//!
//! The license engine depends only on these traits, never on a concrete
//! ledger. They cover the three external collaborators the engine drives:
//!
//! - currency transfer ([`LedgerWrite::transfer`]),
//! - the entitlement primitive ([`LedgerWrite::mint_to`],
//!   [`LedgerWrite::burn_from`], [`LedgerRead::balance_of`]),
//! - program-owned record storage for Publisher records.
//!
//! [`Ledger::transact`] runs a closure as one all-or-nothing transaction;
//! [`Ledger::view`] runs a read-only closure that cannot mutate anything.

use licgate_core::{Address, EntitlementClass, Lamports};

use crate::account::{AccountMeta, EntitlementClassInfo, HoldingAccount};
use crate::error::LedgerError;

/// Read access to ledger state.
pub trait LedgerRead {
    /// Lamport balance of `address`; zero if the account was never funded.
    fn lamports(&self, address: &Address) -> Lamports;

    /// State of an entitlement class.
    fn class_info(&self, class: &EntitlementClass) -> Option<EntitlementClassInfo>;

    /// Holding account at `address`, if it was ever created.
    fn holding(&self, address: &Address) -> Option<HoldingAccount>;

    /// Record data stored at `address`.
    fn record(&self, address: &Address) -> Option<Vec<u8>>;

    /// Balance of `class` in the holding account at `holding`.
    ///
    /// Zero when the holding account does not exist or holds another class.
    fn balance_of(&self, holding: &Address, class: &EntitlementClass) -> u64 {
        self.holding(holding)
            .filter(|h| &h.class == class)
            .map_or(0, |h| h.amount)
    }
}

/// Write access to ledger state inside a transaction.
pub trait LedgerWrite: LedgerRead {
    /// Move `amount` lamports from `from` to `to`.
    ///
    /// Fails with [`LedgerError::InsufficientFunds`] if `from` cannot cover it.
    fn transfer(&mut self, from: &Address, to: &Address, amount: Lamports)
        -> Result<(), LedgerError>;

    /// Create the holding account for (`owner`, `class`) at `holding` if absent.
    ///
    /// Succeeds without change if it already exists with the same owner and
    /// class; fails with [`LedgerError::HoldingMismatch`] otherwise.
    fn ensure_holding(
        &mut self,
        holding: &Address,
        owner: &Address,
        class: &EntitlementClass,
    ) -> Result<(), LedgerError>;

    /// Mint `amount` units of `class` into `holding`, signing as `minter`.
    fn mint_to(
        &mut self,
        holding: &Address,
        class: &EntitlementClass,
        amount: u64,
        minter: &Address,
    ) -> Result<(), LedgerError>;

    /// Burn `amount` units of `class` from `holding`, signing as `authority`.
    ///
    /// `authority` must be the holding's owner or the class mint authority.
    fn burn_from(
        &mut self,
        holding: &Address,
        class: &EntitlementClass,
        amount: u64,
        authority: &Address,
    ) -> Result<(), LedgerError>;

    /// Hand the class's mint authority from `current` to `new_authority`.
    fn set_mint_authority(
        &mut self,
        class: &EntitlementClass,
        current: &Address,
        new_authority: Address,
    ) -> Result<(), LedgerError>;

    /// Store a new record. Fails with [`LedgerError::RecordExists`] if occupied.
    fn create_record(&mut self, address: &Address, data: Vec<u8>) -> Result<(), LedgerError>;

    /// Overwrite an existing record. Fails with [`LedgerError::RecordNotFound`].
    fn write_record(&mut self, address: &Address, data: Vec<u8>) -> Result<(), LedgerError>;
}

/// A ledger substrate able to run atomic transactions.
pub trait Ledger: Send + Sync {
    /// Run `f` as a single transaction touching `accounts`.
    ///
    /// If `f` returns `Ok`, every write it made commits together; if it
    /// returns `Err`, none do. Concurrent transactions are serialized, so a
    /// read-modify-write inside `f` never loses an update.
    fn transact<R, E>(
        &self,
        accounts: &[AccountMeta],
        f: impl FnOnce(&mut dyn LedgerWrite) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<LedgerError>;

    /// Run a read-only closure against committed state.
    fn view<R>(&self, f: impl FnOnce(&dyn LedgerRead) -> R) -> R;
}
