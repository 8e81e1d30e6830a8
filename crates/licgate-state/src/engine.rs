//! # License Engine
//!
//! The four operations, each one atomic ledger transaction:
//!
//! - [`LicenseEngine::initialize`] creates the Publisher record for the
//!   signing authority and takes over the class's mint authority.
//! - [`LicenseEngine::purchase_license`] moves the price from payer to
//!   authority, mints one unit to the subscriber, and counts the holder.
//! - [`LicenseEngine::verify_access`] is a read-only balance check.
//! - [`LicenseEngine::revoke_license`] burns the subscriber's whole balance
//!   and uncounts the holder. Only the Publisher's authority may call it.
//!
//! The engine mints and burns signing as the Publisher record address, the
//! way a program signs with its derived account. Every committed transition
//! is appended to the audit log inside the same transaction.

use std::str::FromStr;

use licgate_core::{Address, ContentDigest, EntitlementClass, Lamports};
use licgate_crypto::Signer;
use licgate_ledger::{holding_address, Ledger, LedgerRead};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::audit::AuditLog;
use crate::error::{AuditError, LicenseError};
use crate::instruction::Instruction;
use crate::license::{LicenseAction, LicenseState, LicenseTransition, LicenseTransitionRecord};
use crate::publisher::Publisher;

/// Program id used when none is configured.
pub const DEFAULT_PROGRAM_ID: Address = Address::from_tag(b"licgate/license-engine/v1");

/// What to do when a subscriber who already holds a license buys again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepurchasePolicy {
    /// Fail with [`LicenseError::AlreadyLicensed`]. Nothing is charged.
    #[default]
    Reject,
    /// Charge again and mint another unit. The subscriber is still counted once.
    Accumulate,
}

impl FromStr for RepurchasePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "accumulate" => Ok(Self::Accumulate),
            other => Err(format!(
                "unknown repurchase policy {other:?}, expected reject or accumulate"
            )),
        }
    }
}

impl std::fmt::Display for RepurchasePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Reject => "reject",
            Self::Accumulate => "accumulate",
        })
    }
}

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Mixed into every Publisher address.
    pub program_id: Address,
    /// Re-purchase behaviour.
    pub repurchase: RepurchasePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program_id: DEFAULT_PROGRAM_ID,
            repurchase: RepurchasePolicy::default(),
        }
    }
}

/// Result of a committed purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceReceipt {
    pub publisher: Address,
    pub subscriber: Address,
    pub payer: Address,
    pub holding: Address,
    pub entitlement_class: EntitlementClass,
    pub price_paid: Lamports,
    /// Subscriber balance after minting.
    pub balance: u64,
    pub total_subscribers: u64,
    /// Audit sequence number of this issuance.
    pub sequence: u64,
}

/// Result of a committed revocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationReceipt {
    pub publisher: Address,
    pub subscriber: Address,
    pub holding: Address,
    pub entitlement_class: EntitlementClass,
    /// Units burned (the whole former balance).
    pub burned: u64,
    pub total_subscribers: u64,
    /// Audit sequence number of this revocation.
    pub sequence: u64,
}

/// One window of the audit trail, read under a single lock.
#[derive(Debug)]
pub struct AuditPage {
    pub records: Vec<LicenseTransitionRecord>,
    /// Records in the whole trail.
    pub total: u64,
    /// Digest of the newest record in the whole trail.
    pub head: Option<ContentDigest>,
    /// Outcome of checking this window and its link to the record before it.
    pub verification: Result<(), AuditError>,
}

/// Runs license operations against a [`Ledger`].
///
/// Shareable across threads; wrap in `Arc` to serve concurrent callers.
#[derive(Debug)]
pub struct LicenseEngine<L> {
    ledger: L,
    config: EngineConfig,
    audit: Mutex<AuditLog>,
}

impl<L: Ledger> LicenseEngine<L> {
    pub fn new(ledger: L, config: EngineConfig) -> Self {
        Self {
            ledger,
            config,
            audit: Mutex::new(AuditLog::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The underlying ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Where the Publisher record for `authority` lives.
    pub fn publisher_address(&self, authority: &Address) -> Result<Address, LicenseError> {
        Ok(Publisher::address(&self.config.program_id, authority)?)
    }

    /// Where `subscriber`'s balance of `class` lives.
    pub fn holding_address(
        &self,
        subscriber: &Address,
        class: &EntitlementClass,
    ) -> Result<Address, LicenseError> {
        Ok(holding_address(subscriber, class)?)
    }

    /// Fetch and decode the Publisher record at `publisher_ref`.
    pub fn publisher(&self, publisher_ref: &Address) -> Result<Publisher, LicenseError> {
        self.ledger.view(|l| load_publisher(l, publisher_ref))
    }

    /// Snapshot of the audit trail, oldest first.
    pub fn audit_trail(&self) -> Vec<LicenseTransitionRecord> {
        self.audit.lock().records().to_vec()
    }

    /// Check the audit trail's hash chain.
    pub fn verify_audit_chain(&self) -> Result<(), AuditError> {
        self.audit.lock().verify_chain()
    }

    /// Up to `limit` audit records from sequence `from`, verified as a
    /// segment. Cost is proportional to `limit`, not to the trail.
    pub fn audit_page(&self, from: u64, limit: usize) -> AuditPage {
        let log = self.audit.lock();
        AuditPage {
            records: log.page(from, limit).to_vec(),
            total: log.len() as u64,
            head: log.head().copied(),
            verification: log.verify_page(from, limit),
        }
    }

    /// Create the Publisher record for `authority`.
    ///
    /// Fails with `InvalidPrice` for a zero price and `AlreadyInitialized`
    /// if the authority already has a record. The class must exist and its
    /// mint authority must be the signer (handed over here) or the Publisher
    /// address already. Returns the Publisher address.
    pub fn initialize(
        &self,
        authority: &Signer,
        entitlement_class: EntitlementClass,
        license_price: Lamports,
    ) -> Result<Address, LicenseError> {
        let authority = *authority.address();
        let publisher = Publisher::new(authority, entitlement_class, license_price)?;
        let address = self.publisher_address(&authority)?;
        let ix = Instruction::Initialize {
            authority,
            entitlement_class,
        };
        let accounts = ix.accounts(&self.config.program_id)?;

        self.ledger
            .transact(&accounts, |tx| -> Result<(), LicenseError> {
                if tx.record(&address).is_some() {
                    return Err(LicenseError::AlreadyInitialized(address));
                }
                let info = tx
                    .class_info(&entitlement_class)
                    .ok_or(LicenseError::EntitlementClassNotFound(entitlement_class))?;
                if info.mint_authority == authority {
                    tx.set_mint_authority(&entitlement_class, &authority, address)?;
                } else if info.mint_authority != address {
                    return Err(LicenseError::MintAuthorityMismatch {
                        class: entitlement_class,
                        mint_authority: info.mint_authority,
                    });
                }
                tx.create_record(&address, publisher.to_bytes())?;
                self.audit.lock().append(LicenseTransition {
                    action: LicenseAction::Initialize,
                    publisher: address,
                    subject: authority,
                    from_state: None,
                    to_state: None,
                    subscribers_after: 0,
                })?;
                Ok(())
            })
            .map_err(|e| log_failure(ix.name(), e))?;

        tracing::info!(
            publisher = %address,
            authority = %authority,
            class = %entitlement_class,
            price = license_price.get(),
            "publisher initialized"
        );
        Ok(address)
    }

    /// Pay `license_price` from `payer` to the authority and mint one unit
    /// to `subscriber`.
    ///
    /// The payment, the mint and the counter update commit together or not
    /// at all. See [`RepurchasePolicy`] for subscribers already licensed.
    pub fn purchase_license(
        &self,
        publisher_ref: &Address,
        subscriber: &Signer,
        payer: &Signer,
    ) -> Result<IssuanceReceipt, LicenseError> {
        let subscriber = *subscriber.address();
        let payer = *payer.address();
        let record = self.publisher(publisher_ref)?;
        let class = record.entitlement_class;
        let holding = self.holding_address(&subscriber, &class)?;
        let ix = Instruction::PurchaseLicense {
            publisher: *publisher_ref,
            authority: record.authority,
            entitlement_class: class,
            subscriber,
            payer,
        };
        let accounts = ix.accounts(&self.config.program_id)?;
        let policy = self.config.repurchase;

        let receipt = self
            .ledger
            .transact(&accounts, |tx| -> Result<IssuanceReceipt, LicenseError> {
                let mut publisher = load_publisher(&*tx, publisher_ref)?;
                ensure_unchanged(&record, &publisher)?;

                let before = tx.balance_of(&holding, &class);
                let from_state = LicenseState::from_balance(before);
                if from_state.grants_access() && policy == RepurchasePolicy::Reject {
                    return Err(LicenseError::AlreadyLicensed(subscriber));
                }

                tx.transfer(&payer, &publisher.authority, publisher.license_price)?;
                tx.ensure_holding(&holding, &subscriber, &class)?;
                tx.mint_to(&holding, &class, 1, publisher_ref)?;

                if !from_state.grants_access() {
                    publisher.record_subscription()?;
                    tx.write_record(publisher_ref, publisher.to_bytes())?;
                }
                let balance = tx.balance_of(&holding, &class);
                if balance != before.saturating_add(1) {
                    return Err(LicenseError::InvariantViolation(format!(
                        "holding balance {balance} after minting onto {before}"
                    )));
                }

                let sequence = self
                    .audit
                    .lock()
                    .append(LicenseTransition {
                        action: LicenseAction::Issue,
                        publisher: *publisher_ref,
                        subject: subscriber,
                        from_state: Some(from_state),
                        to_state: Some(LicenseState::Licensed),
                        subscribers_after: publisher.total_subscribers,
                    })?
                    .sequence;

                Ok(IssuanceReceipt {
                    publisher: *publisher_ref,
                    subscriber,
                    payer,
                    holding,
                    entitlement_class: class,
                    price_paid: publisher.license_price,
                    balance,
                    total_subscribers: publisher.total_subscribers,
                    sequence,
                })
            })
            .map_err(|e| log_failure(ix.name(), e))?;

        tracing::info!(
            publisher = %publisher_ref,
            subscriber = %subscriber,
            payer = %payer,
            price = receipt.price_paid.get(),
            total_subscribers = receipt.total_subscribers,
            "license issued"
        );
        Ok(receipt)
    }

    /// Whether `subscriber` holds at least one unit of `entitlement_class`.
    ///
    /// Read-only and unauthenticated. A holding account that was never
    /// created counts as zero. `entitlement_class` must be the Publisher's.
    pub fn verify_access(
        &self,
        publisher_ref: &Address,
        subscriber: &Address,
        entitlement_class: &EntitlementClass,
    ) -> Result<bool, LicenseError> {
        let holding = self.holding_address(subscriber, entitlement_class)?;
        let granted = self.ledger.view(|l| -> Result<bool, LicenseError> {
            let publisher = load_publisher(l, publisher_ref)?;
            if &publisher.entitlement_class != entitlement_class {
                return Err(LicenseError::EntitlementClassMismatch {
                    expected: publisher.entitlement_class,
                    actual: *entitlement_class,
                });
            }
            Ok(LicenseState::from_balance(l.balance_of(&holding, entitlement_class)).grants_access())
        })?;
        tracing::debug!(publisher = %publisher_ref, subscriber = %subscriber, granted, "access verified");
        Ok(granted)
    }

    /// Burn `subscriber`'s whole balance and decrement the counter.
    ///
    /// Only the Publisher's authority may revoke. A subscriber with zero
    /// balance fails with `NotLicensed`.
    pub fn revoke_license(
        &self,
        publisher_ref: &Address,
        entitlement_class: &EntitlementClass,
        authority: &Signer,
        subscriber: &Address,
    ) -> Result<RevocationReceipt, LicenseError> {
        let authority = *authority.address();
        let record = self.publisher(publisher_ref)?;
        if record.authority != authority {
            tracing::warn!(
                publisher = %publisher_ref,
                signer = %authority,
                "revocation refused: signer is not the publisher authority"
            );
            return Err(LicenseError::Unauthorized(authority));
        }
        if &record.entitlement_class != entitlement_class {
            return Err(LicenseError::EntitlementClassMismatch {
                expected: record.entitlement_class,
                actual: *entitlement_class,
            });
        }
        let class = record.entitlement_class;
        let holding = self.holding_address(subscriber, &class)?;
        let ix = Instruction::RevokeLicense {
            publisher: *publisher_ref,
            authority,
            entitlement_class: class,
            subscriber: *subscriber,
        };
        let accounts = ix.accounts(&self.config.program_id)?;

        let receipt = self
            .ledger
            .transact(&accounts, |tx| -> Result<RevocationReceipt, LicenseError> {
                let mut publisher = load_publisher(&*tx, publisher_ref)?;
                ensure_unchanged(&record, &publisher)?;

                let burned = tx.balance_of(&holding, &class);
                if burned == 0 {
                    return Err(LicenseError::NotLicensed(*subscriber));
                }
                tx.burn_from(&holding, &class, burned, publisher_ref)?;
                publisher.release_subscription()?;
                tx.write_record(publisher_ref, publisher.to_bytes())?;

                let sequence = self
                    .audit
                    .lock()
                    .append(LicenseTransition {
                        action: LicenseAction::Revoke,
                        publisher: *publisher_ref,
                        subject: *subscriber,
                        from_state: Some(LicenseState::Licensed),
                        to_state: Some(LicenseState::Unlicensed),
                        subscribers_after: publisher.total_subscribers,
                    })?
                    .sequence;

                Ok(RevocationReceipt {
                    publisher: *publisher_ref,
                    subscriber: *subscriber,
                    holding,
                    entitlement_class: class,
                    burned,
                    total_subscribers: publisher.total_subscribers,
                    sequence,
                })
            })
            .map_err(|e| log_failure(ix.name(), e))?;

        tracing::info!(
            publisher = %publisher_ref,
            subscriber = %subscriber,
            burned = receipt.burned,
            total_subscribers = receipt.total_subscribers,
            "license revoked"
        );
        Ok(receipt)
    }
}

fn load_publisher<R: LedgerRead + ?Sized>(ledger: &R, address: &Address) -> Result<Publisher, LicenseError> {
    let data = ledger
        .record(address)
        .ok_or(LicenseError::PublisherNotFound(*address))?;
    Ok(Publisher::from_bytes(&data)?)
}

/// The immutable fields the account list was built from must still hold.
fn ensure_unchanged(expected: &Publisher, actual: &Publisher) -> Result<(), LicenseError> {
    if expected.authority != actual.authority
        || expected.entitlement_class != actual.entitlement_class
    {
        return Err(LicenseError::InvariantViolation(
            "publisher authority or class changed".to_string(),
        ));
    }
    Ok(())
}

fn log_failure(operation: &'static str, err: LicenseError) -> LicenseError {
    tracing::debug!(operation, error = %err, "transaction aborted");
    err
}
