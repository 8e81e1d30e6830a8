//! # In-Memory Ledger
//!
//! A [`Ledger`] backed by hash maps behind a single `parking_lot::RwLock`.
//!
//! ## Transactions
//!
//! [`InMemoryLedger::transact`] takes the write lock for the whole
//! transaction, so transactions are serialized and read-modify-write
//! sequences (the Publisher counter) cannot lose updates. The closure sees
//! a [`StagedTx`]: reads fall through a private write-set to committed
//! state, and writes go only to the write-set. The write-set is applied in
//! one step after the closure returns `Ok`; on `Err` it is dropped and
//! committed state is untouched.
//!
//! [`InMemoryLedger::view`] takes the read lock, so any number of
//! verifications run in parallel and none of them can write.
//!
//! `parking_lot` locks do not poison, so a panicking transaction leaves the
//! last committed state readable.

use std::collections::HashMap;
use std::sync::Arc;

use licgate_core::{Address, EntitlementClass, Lamports};
use parking_lot::RwLock;

use crate::account::{holding_address, AccountMeta, EntitlementClassInfo, HoldingAccount};
use crate::capability::{Ledger, LedgerRead, LedgerWrite};
use crate::error::LedgerError;

#[derive(Debug, Clone, Default)]
struct LedgerState {
    lamports: HashMap<Address, u64>,
    classes: HashMap<EntitlementClass, EntitlementClassInfo>,
    holdings: HashMap<Address, HoldingAccount>,
    records: HashMap<Address, Vec<u8>>,
}

impl LedgerRead for LedgerState {
    fn lamports(&self, address: &Address) -> Lamports {
        Lamports(self.lamports.get(address).copied().unwrap_or(0))
    }

    fn class_info(&self, class: &EntitlementClass) -> Option<EntitlementClassInfo> {
        self.classes.get(class).copied()
    }

    fn holding(&self, address: &Address) -> Option<HoldingAccount> {
        self.holdings.get(address).copied()
    }

    fn record(&self, address: &Address) -> Option<Vec<u8>> {
        self.records.get(address).cloned()
    }
}

// ─── Staged Transaction ─────────────────────────────────────────────

#[derive(Debug, Default)]
struct WriteSet {
    lamports: HashMap<Address, u64>,
    classes: HashMap<EntitlementClass, EntitlementClassInfo>,
    holdings: HashMap<Address, HoldingAccount>,
    records: HashMap<Address, Vec<u8>>,
}

impl WriteSet {
    fn len(&self) -> usize {
        self.lamports.len() + self.classes.len() + self.holdings.len() + self.records.len()
    }

    fn apply(self, state: &mut LedgerState) {
        state.lamports.extend(self.lamports);
        state.classes.extend(self.classes);
        state.holdings.extend(self.holdings);
        state.records.extend(self.records);
    }
}

/// Transaction view over committed state plus a private write-set.
struct StagedTx<'a> {
    base: &'a LedgerState,
    accounts: &'a [AccountMeta],
    writes: WriteSet,
}

impl<'a> StagedTx<'a> {
    fn new(base: &'a LedgerState, accounts: &'a [AccountMeta]) -> Self {
        Self {
            base,
            accounts,
            writes: WriteSet::default(),
        }
    }

    fn require_writable(&self, address: &Address) -> Result<(), LedgerError> {
        if self
            .accounts
            .iter()
            .any(|m| &m.address == address && m.writable)
        {
            Ok(())
        } else {
            Err(LedgerError::UndeclaredWrite(*address))
        }
    }

    fn require_signer(&self, address: &Address) -> Result<(), LedgerError> {
        if self.accounts.iter().any(|m| &m.address == address && m.signer) {
            Ok(())
        } else {
            Err(LedgerError::MissingSignature(*address))
        }
    }

    fn class_or_err(&self, class: &EntitlementClass) -> Result<EntitlementClassInfo, LedgerError> {
        self.class_info(class)
            .ok_or(LedgerError::ClassNotFound(*class))
    }

    fn holding_of_class(
        &self,
        address: &Address,
        class: &EntitlementClass,
    ) -> Result<HoldingAccount, LedgerError> {
        let holding = self
            .holding(address)
            .ok_or(LedgerError::RecordNotFound(*address))?;
        if &holding.class != class {
            return Err(LedgerError::HoldingMismatch {
                address: *address,
                owner: holding.owner,
                class: *class,
            });
        }
        Ok(holding)
    }
}

impl LedgerRead for StagedTx<'_> {
    fn lamports(&self, address: &Address) -> Lamports {
        match self.writes.lamports.get(address) {
            Some(v) => Lamports(*v),
            None => self.base.lamports(address),
        }
    }

    fn class_info(&self, class: &EntitlementClass) -> Option<EntitlementClassInfo> {
        self.writes
            .classes
            .get(class)
            .copied()
            .or_else(|| self.base.class_info(class))
    }

    fn holding(&self, address: &Address) -> Option<HoldingAccount> {
        self.writes
            .holdings
            .get(address)
            .copied()
            .or_else(|| self.base.holding(address))
    }

    fn record(&self, address: &Address) -> Option<Vec<u8>> {
        self.writes
            .records
            .get(address)
            .cloned()
            .or_else(|| self.base.record(address))
    }
}

impl LedgerWrite for StagedTx<'_> {
    fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Lamports,
    ) -> Result<(), LedgerError> {
        self.require_signer(from)?;
        self.require_writable(from)?;
        self.require_writable(to)?;

        let have = self.lamports(from);
        let remaining = have
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientFunds {
                address: *from,
                have,
                need: amount,
            })?;
        if from == to {
            return Ok(());
        }
        let credited = self
            .lamports(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(*to))?;

        self.writes.lamports.insert(*from, remaining.get());
        self.writes.lamports.insert(*to, credited.get());
        Ok(())
    }

    fn ensure_holding(
        &mut self,
        holding: &Address,
        owner: &Address,
        class: &EntitlementClass,
    ) -> Result<(), LedgerError> {
        match self.holding(holding) {
            Some(existing) if &existing.owner == owner && &existing.class == class => Ok(()),
            Some(_) => Err(LedgerError::HoldingMismatch {
                address: *holding,
                owner: *owner,
                class: *class,
            }),
            None => {
                self.require_writable(holding)?;
                self.writes.holdings.insert(
                    *holding,
                    HoldingAccount {
                        owner: *owner,
                        class: *class,
                        amount: 0,
                    },
                );
                Ok(())
            }
        }
    }

    fn mint_to(
        &mut self,
        holding: &Address,
        class: &EntitlementClass,
        amount: u64,
        minter: &Address,
    ) -> Result<(), LedgerError> {
        let mut info = self.class_or_err(class)?;
        if &info.mint_authority != minter {
            return Err(LedgerError::MintAuthorityMismatch {
                class: *class,
                expected: info.mint_authority,
                actual: *minter,
            });
        }
        let mut account = self.holding_of_class(holding, class)?;
        self.require_writable(holding)?;
        self.require_writable(class.address())?;

        account.amount = account
            .amount
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(*holding))?;
        info.supply = info
            .supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(*class.address()))?;

        self.writes.holdings.insert(*holding, account);
        self.writes.classes.insert(*class, info);
        Ok(())
    }

    fn burn_from(
        &mut self,
        holding: &Address,
        class: &EntitlementClass,
        amount: u64,
        authority: &Address,
    ) -> Result<(), LedgerError> {
        let mut info = self.class_or_err(class)?;
        let mut account = self.holding_of_class(holding, class)?;
        if authority != &account.owner && authority != &info.mint_authority {
            return Err(LedgerError::BurnNotAuthorized {
                address: *holding,
                authority: *authority,
            });
        }
        if account.amount < amount {
            return Err(LedgerError::InsufficientEntitlement {
                address: *holding,
                have: account.amount,
                need: amount,
            });
        }
        self.require_writable(holding)?;
        self.require_writable(class.address())?;

        account.amount -= amount;
        info.supply = info
            .supply
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow(*class.address()))?;

        self.writes.holdings.insert(*holding, account);
        self.writes.classes.insert(*class, info);
        Ok(())
    }

    fn set_mint_authority(
        &mut self,
        class: &EntitlementClass,
        current: &Address,
        new_authority: Address,
    ) -> Result<(), LedgerError> {
        let mut info = self.class_or_err(class)?;
        if &info.mint_authority != current {
            return Err(LedgerError::MintAuthorityMismatch {
                class: *class,
                expected: info.mint_authority,
                actual: *current,
            });
        }
        self.require_writable(class.address())?;
        info.mint_authority = new_authority;
        self.writes.classes.insert(*class, info);
        Ok(())
    }

    fn create_record(&mut self, address: &Address, data: Vec<u8>) -> Result<(), LedgerError> {
        self.require_writable(address)?;
        if self.record(address).is_some() {
            return Err(LedgerError::RecordExists(*address));
        }
        self.writes.records.insert(*address, data);
        Ok(())
    }

    fn write_record(&mut self, address: &Address, data: Vec<u8>) -> Result<(), LedgerError> {
        self.require_writable(address)?;
        if self.record(address).is_none() {
            return Err(LedgerError::RecordNotFound(*address));
        }
        self.writes.records.insert(*address, data);
        Ok(())
    }
}

// ─── InMemoryLedger ─────────────────────────────────────────────────

/// Thread-safe, cloneable in-memory ledger. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` lamports to `address` outside any transaction.
    ///
    /// Genesis and test funding. Returns the new balance.
    pub fn airdrop(&self, address: &Address, amount: Lamports) -> Result<Lamports, LedgerError> {
        let mut state = self.state.write();
        let balance = state.lamports.entry(*address).or_insert(0);
        *balance = balance
            .checked_add(amount.get())
            .ok_or(LedgerError::Overflow(*address))?;
        tracing::debug!(address = %address, amount = amount.get(), "airdrop");
        Ok(Lamports(*balance))
    }

    /// Register a new entitlement class with zero supply.
    pub fn create_class(
        &self,
        class: EntitlementClass,
        mint_authority: Address,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        if state.classes.contains_key(&class) {
            return Err(LedgerError::ClassExists(class));
        }
        state.classes.insert(
            class,
            EntitlementClassInfo {
                mint_authority,
                supply: 0,
            },
        );
        tracing::debug!(class = %class, mint_authority = %mint_authority, "entitlement class created");
        Ok(())
    }

    /// Committed lamport balance of `address`.
    pub fn lamports(&self, address: &Address) -> Lamports {
        self.view(|l| l.lamports(address))
    }

    /// Committed balance of `class` held by `owner` in its canonical holding account.
    pub fn entitlement_balance(
        &self,
        owner: &Address,
        class: &EntitlementClass,
    ) -> Result<u64, LedgerError> {
        let holding = holding_address(owner, class)?;
        Ok(self.view(|l| l.balance_of(&holding, class)))
    }
}

impl Ledger for InMemoryLedger {
    fn transact<R, E>(
        &self,
        accounts: &[AccountMeta],
        f: impl FnOnce(&mut dyn LedgerWrite) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<LedgerError>,
    {
        let mut guard = self.state.write();
        let (out, writes) = {
            let mut tx = StagedTx::new(&guard, accounts);
            match f(&mut tx) {
                Ok(out) => (out, tx.writes),
                Err(e) => {
                    tracing::debug!(accounts = accounts.len(), "transaction aborted");
                    return Err(e);
                }
            }
        };
        let staged = writes.len();
        writes.apply(&mut guard);
        tracing::debug!(accounts = accounts.len(), writes = staged, "transaction committed");
        Ok(out)
    }

    fn view<R>(&self, f: impl FnOnce(&dyn LedgerRead) -> R) -> R {
        let guard = self.state.read();
        f(&*guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::new([b; 32])
    }

    #[test]
    fn airdrop_accumulates() {
        let ledger = InMemoryLedger::new();
        ledger.airdrop(&addr(1), Lamports(5)).unwrap();
        assert_eq!(ledger.airdrop(&addr(1), Lamports(7)).unwrap(), Lamports(12));
        assert_eq!(ledger.lamports(&addr(1)), Lamports(12));
        assert_eq!(ledger.lamports(&addr(2)), Lamports::ZERO);
    }

    #[test]
    fn airdrop_overflow_is_rejected() {
        let ledger = InMemoryLedger::new();
        ledger.airdrop(&addr(1), Lamports(u64::MAX)).unwrap();
        assert!(matches!(
            ledger.airdrop(&addr(1), Lamports(1)),
            Err(LedgerError::Overflow(_))
        ));
    }

    #[test]
    fn duplicate_class_is_rejected() {
        let ledger = InMemoryLedger::new();
        let class = EntitlementClass::new(addr(3));
        ledger.create_class(class, addr(4)).unwrap();
        assert!(matches!(
            ledger.create_class(class, addr(4)),
            Err(LedgerError::ClassExists(_))
        ));
    }

    #[test]
    fn staged_reads_see_own_writes() {
        let ledger = InMemoryLedger::new();
        ledger.airdrop(&addr(1), Lamports(10)).unwrap();
        let metas = [
            AccountMeta::writable(addr(1), true),
            AccountMeta::writable(addr(2), false),
        ];
        let seen = ledger
            .transact::<_, LedgerError>(&metas, |tx| {
                tx.transfer(&addr(1), &addr(2), Lamports(4))?;
                Ok((tx.lamports(&addr(1)), tx.lamports(&addr(2))))
            })
            .unwrap();
        assert_eq!(seen, (Lamports(6), Lamports(4)));
        assert_eq!(ledger.lamports(&addr(2)), Lamports(4));
    }

    #[test]
    fn view_cannot_observe_uncommitted_state() {
        let ledger = InMemoryLedger::new();
        ledger.airdrop(&addr(1), Lamports(10)).unwrap();
        let metas = [
            AccountMeta::writable(addr(1), true),
            AccountMeta::writable(addr(2), false),
        ];
        let result: Result<(), LedgerError> = ledger.transact(&metas, |tx| {
            tx.transfer(&addr(1), &addr(2), Lamports(4))?;
            Err(LedgerError::RecordNotFound(addr(9)))
        });
        assert!(result.is_err());
        assert_eq!(ledger.lamports(&addr(1)), Lamports(10));
        assert_eq!(ledger.lamports(&addr(2)), Lamports::ZERO);
    }

    #[test]
    fn self_transfer_checks_funds_but_changes_nothing() {
        let ledger = InMemoryLedger::new();
        ledger.airdrop(&addr(1), Lamports(3)).unwrap();
        let metas = [AccountMeta::writable(addr(1), true)];
        ledger
            .transact::<_, LedgerError>(&metas, |tx| tx.transfer(&addr(1), &addr(1), Lamports(3)))
            .unwrap();
        assert_eq!(ledger.lamports(&addr(1)), Lamports(3));
        let err = ledger
            .transact::<_, LedgerError>(&metas, |tx| tx.transfer(&addr(1), &addr(1), Lamports(4)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    }
}
