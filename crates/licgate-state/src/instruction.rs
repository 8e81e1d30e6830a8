//! # Instructions
//!
//! Each operation declares the exact accounts it reads and writes before it
//! runs, so the ledger can reject anything outside that set.
//!
//! | Instruction | Writable | Signers |
//! |---|---|---|
//! | `Initialize` | publisher record, entitlement class | authority |
//! | `PurchaseLicense` | publisher record, payer, authority, holding, class | subscriber, payer |
//! | `VerifyAccess` | none | none |
//! | `RevokeLicense` | publisher record, holding, class | authority |

use licgate_core::{Address, CanonicalizationError, EntitlementClass};
use licgate_ledger::{holding_address, AccountMeta};
use serde::{Deserialize, Serialize};

use crate::publisher::Publisher;

/// A license-engine operation and the accounts it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "instruction", rename_all = "snake_case")]
pub enum Instruction {
    /// Create the Publisher record for `authority`.
    Initialize {
        /// The signing authority.
        authority: Address,
        /// The class the Publisher will mint.
        entitlement_class: EntitlementClass,
    },
    /// Pay the price and mint one unit to `subscriber`.
    PurchaseLicense {
        /// Publisher record address.
        publisher: Address,
        /// Payment recipient.
        authority: Address,
        /// The Publisher's class.
        entitlement_class: EntitlementClass,
        /// License recipient.
        subscriber: Address,
        /// Payment source.
        payer: Address,
    },
    /// Read the subscriber's balance.
    VerifyAccess {
        /// Publisher record address.
        publisher: Address,
        /// The subscriber checked.
        subscriber: Address,
        /// The class checked.
        entitlement_class: EntitlementClass,
    },
    /// Burn the subscriber's balance.
    RevokeLicense {
        /// Publisher record address.
        publisher: Address,
        /// The signing authority.
        authority: Address,
        /// The Publisher's class.
        entitlement_class: EntitlementClass,
        /// The subscriber whose license is revoked.
        subscriber: Address,
    },
}

impl Instruction {
    /// Short operation name for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
            Self::PurchaseLicense { .. } => "purchase_license",
            Self::VerifyAccess { .. } => "verify_access",
            Self::RevokeLicense { .. } => "revoke_license",
        }
    }

    /// Accounts touched under `program`, one entry per address.
    ///
    /// When the same address appears twice (a subscriber paying for itself),
    /// its flags are merged.
    pub fn accounts(&self, program: &Address) -> Result<Vec<AccountMeta>, CanonicalizationError> {
        let metas = match self {
            Self::Initialize {
                authority,
                entitlement_class,
            } => vec![
                AccountMeta::writable(Publisher::address(program, authority)?, false),
                AccountMeta::writable(*entitlement_class.address(), false),
                AccountMeta::readonly(*authority, true),
            ],
            Self::PurchaseLicense {
                publisher,
                authority,
                entitlement_class,
                subscriber,
                payer,
            } => vec![
                AccountMeta::writable(*publisher, false),
                AccountMeta::writable(*entitlement_class.address(), false),
                AccountMeta::writable(*authority, false),
                AccountMeta::readonly(*subscriber, true),
                AccountMeta::writable(*payer, true),
                AccountMeta::writable(holding_address(subscriber, entitlement_class)?, false),
            ],
            Self::VerifyAccess {
                publisher,
                subscriber,
                entitlement_class,
            } => vec![
                AccountMeta::readonly(*publisher, false),
                AccountMeta::readonly(*subscriber, false),
                AccountMeta::readonly(holding_address(subscriber, entitlement_class)?, false),
            ],
            Self::RevokeLicense {
                publisher,
                authority,
                entitlement_class,
                subscriber,
            } => vec![
                AccountMeta::writable(*publisher, false),
                AccountMeta::writable(*entitlement_class.address(), false),
                AccountMeta::readonly(*authority, true),
                AccountMeta::readonly(*subscriber, false),
                AccountMeta::writable(holding_address(subscriber, entitlement_class)?, false),
            ],
        };
        Ok(merge(metas))
    }
}

fn merge(metas: Vec<AccountMeta>) -> Vec<AccountMeta> {
    let mut out: Vec<AccountMeta> = Vec::with_capacity(metas.len());
    for meta in metas {
        match out.iter_mut().find(|m| m.address == meta.address) {
            Some(existing) => {
                existing.writable |= meta.writable;
                existing.signer |= meta.signer;
            }
            None => out.push(meta),
        }
    }
    out
}
