//! # licgate-ledger — Ledger Capability
//!
//! The license engine never touches balances directly. It drives a
//! [`Ledger`]: currency transfer, the entitlement primitive (mint, burn,
//! balance per holding account) and program-owned record storage, all inside
//! all-or-nothing transactions.
//!
//! [`InMemoryLedger`] is the reference substrate used by the API server and
//! tests. Each transaction declares its accounts up front through
//! [`AccountMeta`]; writes to undeclared accounts and debits from
//! non-signers are rejected.

pub mod account;
pub mod capability;
pub mod error;
pub mod memory;

pub use account::{
    holding_address, AccountMeta, EntitlementClassInfo, HoldingAccount, HOLDING_NAMESPACE,
    HOLDING_PROGRAM_ID,
};
pub use capability::{Ledger, LedgerRead, LedgerWrite};
pub use error::LedgerError;
pub use memory::InMemoryLedger;
