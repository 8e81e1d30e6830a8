//! # Signed-Request Replay Guard
//!
//! Every signed payload carries a signer-chosen `nonce` and an `expires_at`
//! deadline. The guard refuses payloads past their deadline, payloads whose
//! deadline lies further ahead than the configured window, and any
//! `(signer, nonce)` pair it has already accepted.
//!
//! An accepted pair is remembered until its deadline passes. After that the
//! deadline check alone refuses the payload, so memory is bounded by the
//! requests accepted within one window.
//!
//! A nonce is consumed before the operation runs. A request that then fails
//! has still used its nonce; clients retry with a fresh one.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use licgate_core::{Address, Timestamp};
use parking_lot::Mutex;

use crate::error::AppError;

/// Replay guard configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Longest accepted distance from now to `expires_at`, in seconds.
    pub max_ttl_secs: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { max_ttl_secs: 300 }
    }
}

#[derive(Debug, Default)]
struct Seen {
    pairs: HashSet<(Address, u64)>,
    deadlines: BTreeSet<(Timestamp, Address, u64)>,
}

impl Seen {
    fn prune(&mut self, now: Timestamp) {
        while let Some(&(deadline, signer, nonce)) = self.deadlines.first() {
            if deadline >= now {
                break;
            }
            self.deadlines.pop_first();
            self.pairs.remove(&(signer, nonce));
        }
    }
}

/// Shared record of accepted nonces. Clones share state.
#[derive(Debug, Clone)]
pub struct ReplayGuard {
    config: ReplayConfig,
    seen: Arc<Mutex<Seen>>,
}

impl ReplayGuard {
    pub fn new(config: ReplayConfig) -> Self {
        Self {
            config,
            seen: Arc::new(Mutex::new(Seen::default())),
        }
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Accept `nonce` for every signer in `signers`, or for none of them.
    pub fn consume(
        &self,
        signers: &[Address],
        nonce: u64,
        expires_at: Timestamp,
    ) -> Result<(), AppError> {
        self.consume_at(Timestamp::now(), signers, nonce, expires_at)
    }

    fn consume_at(
        &self,
        now: Timestamp,
        signers: &[Address],
        nonce: u64,
        expires_at: Timestamp,
    ) -> Result<(), AppError> {
        if expires_at < now {
            return Err(AppError::Unauthorized(format!(
                "signed request expired at {expires_at}"
            )));
        }
        let ttl = self.config.max_ttl_secs;
        if now.checked_add_secs(ttl).is_some_and(|latest| expires_at > latest) {
            return Err(AppError::Validation(format!(
                "expires_at {expires_at} is more than {ttl} seconds ahead"
            )));
        }

        let mut seen = self.seen.lock();
        seen.prune(now);
        if let Some(signer) = signers.iter().find(|s| seen.pairs.contains(&(**s, nonce))) {
            tracing::warn!(signer = %signer, nonce, "replayed signed request refused");
            return Err(AppError::Conflict(format!(
                "nonce {nonce} already used by {signer}"
            )));
        }
        for signer in signers {
            if seen.pairs.insert((*signer, nonce)) {
                seen.deadlines.insert((expires_at, *signer, nonce));
            }
        }
        Ok(())
    }

    /// Pairs currently remembered.
    pub fn tracked(&self) -> usize {
        self.seen.lock().pairs.len()
    }
}

impl Default for ReplayGuard {
    fn default() -> Self {
        Self::new(ReplayConfig::default())
    }
}
