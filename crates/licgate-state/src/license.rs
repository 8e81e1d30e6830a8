//! # License Lifecycle
//!
//! A subscriber's license is a holding-account balance, logically boolean:
//!
//! ```text
//!              purchase_license
//! Unlicensed ─────────────────────▶ Licensed
//!      ▲                               │
//!      └───────────────────────────────┘
//!              revoke_license
//! ```
//!
//! Nothing is deleted. A revoked subscriber's holding account stays at zero
//! and can be licensed again any number of times.

use licgate_core::{Address, ContentDigest, Timestamp};
use serde::{Deserialize, Serialize};

/// Whether a subscriber currently holds a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseState {
    /// Balance is zero, or the holding account was never created.
    Unlicensed,
    /// Balance is at least one.
    Licensed,
}

impl LicenseState {
    /// State implied by a holding balance.
    pub fn from_balance(balance: u64) -> Self {
        if balance > 0 {
            Self::Licensed
        } else {
            Self::Unlicensed
        }
    }

    /// Whether access should be granted.
    pub fn grants_access(&self) -> bool {
        matches!(self, Self::Licensed)
    }
}

impl std::fmt::Display for LicenseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unlicensed => "UNLICENSED",
            Self::Licensed => "LICENSED",
        };
        f.write_str(s)
    }
}

/// The committed operation an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseAction {
    /// Publisher record created.
    Initialize,
    /// License issued by purchase.
    Issue,
    /// License revoked by the authority.
    Revoke,
}

impl std::fmt::Display for LicenseAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Initialize => "initialize",
            Self::Issue => "issue",
            Self::Revoke => "revoke",
        };
        f.write_str(s)
    }
}

/// A committed transition, before it is sequenced and hashed into the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseTransition {
    /// What happened.
    pub action: LicenseAction,
    /// Publisher record address.
    pub publisher: Address,
    /// The subscriber, or the authority for `Initialize`.
    pub subject: Address,
    /// Subscriber state before. `None` for `Initialize`.
    pub from_state: Option<LicenseState>,
    /// Subscriber state after. `None` for `Initialize`.
    pub to_state: Option<LicenseState>,
    /// `total_subscribers` after the transition.
    pub subscribers_after: u64,
}

/// A transition as stored in the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseTransitionRecord {
    /// Position in the log, from zero.
    pub sequence: u64,
    /// The transition.
    #[serde(flatten)]
    pub transition: LicenseTransition,
    /// When it was committed.
    pub timestamp: Timestamp,
    /// Digest of the previous record. `None` for the first.
    pub prev_digest: Option<ContentDigest>,
    /// SHA-256 over the canonical bytes of every other field.
    pub digest: ContentDigest,
}
