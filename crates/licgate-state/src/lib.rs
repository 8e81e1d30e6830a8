//! # licgate-state — License Lifecycle
//!
//! A publisher sells a scarce entitlement unit; holding it grants access.
//!
//! - **Publisher** (`publisher.rs`): one record per authority at a derived
//!   address, with a fixed 88-byte layout. Only the subscriber counter
//!   changes after creation.
//! - **Instructions** (`instruction.rs`): the accounts each operation reads
//!   and writes, declared before it runs.
//! - **Engine** (`engine.rs`): `initialize`, `purchase_license`,
//!   `verify_access` and `revoke_license`, each a single ledger transaction.
//! - **Audit** (`audit.rs`, `license.rs`): hash-chained records of every
//!   committed transition.
//!
//! ## Invariants
//!
//! - At most one Publisher record per authority per program id.
//! - `total_subscribers` equals the number of holders with a non-zero
//!   balance. It is never clamped: an underflow is an `InvariantViolation`.
//! - A failed operation leaves every balance, counter and audit record as
//!   it was.

pub mod audit;
pub mod engine;
pub mod error;
pub mod instruction;
pub mod license;
pub mod publisher;

pub use audit::{verify_chain, verify_segment, AuditLog};
pub use engine::{
    AuditPage, EngineConfig, IssuanceReceipt, LicenseEngine, RepurchasePolicy, RevocationReceipt,
    DEFAULT_PROGRAM_ID,
};
pub use error::{AuditError, LicenseError, RecordError};
pub use instruction::Instruction;
pub use license::{LicenseAction, LicenseState, LicenseTransition, LicenseTransitionRecord};
pub use publisher::{Publisher, PUBLISHER_NAMESPACE};
