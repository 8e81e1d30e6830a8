//! # licgate-crypto — Signing and Co-Signer Proofs
//!
//! - **Ed25519** key pairs whose public keys are ledger [`Address`]es,
//!   signing and verification over `CanonicalBytes` only.
//! - **[`Signer`]**: proof that an address authorized the current
//!   operation, obtainable only from a held key pair or a verified
//!   [`SignedMessage`].
//!
//! ## Crate Policy
//!
//! - Depends only on `licgate-core` internally.
//! - No mocking of cryptographic operations in tests; all tests use real
//!   Ed25519 over real canonical bytes.
//!
//! [`Address`]: licgate_core::Address

pub mod ed25519;
pub mod signer;

pub use ed25519::{verify, Ed25519KeyPair, Ed25519Signature};
pub use signer::{SignedMessage, Signer};
