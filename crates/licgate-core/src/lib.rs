//! # licgate-core — Foundational Types
//!
//! Leaf crate of the licgate workspace. Defines the primitives the license
//! engine, ledger and API agree on:
//!
//! - [`Address`] / [`EntitlementClass`]: 32-byte account identifiers, hex on
//!   the wire, distinct types for wallets and entitlement classes.
//! - [`derive_address`]: deterministic record addressing from a program id,
//!   a namespace tag and seeds. Replaces any lookup table or registry.
//! - [`Lamports`]: base-currency amounts with checked arithmetic.
//! - [`CanonicalBytes`] and [`sha256_digest`]: the only path to a digest or a
//!   signature input.
//! - [`Timestamp`]: UTC, second-precision.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `licgate-*` crates.
//! - No `unsafe`, no `unwrap()` outside tests.

pub mod address;
pub mod amount;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod hex;
pub mod temporal;

pub use address::{derive_address, Address, EntitlementClass};
pub use amount::{Lamports, LAMPORTS_PER_UNIT};
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, CryptoError, ValidationError};
pub use temporal::Timestamp;
