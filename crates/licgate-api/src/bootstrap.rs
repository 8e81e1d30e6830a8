//! # Genesis Bootstrap
//!
//! Seeds the in-memory ledger at startup from a YAML genesis file: funded
//! accounts and entitlement classes with their initial mint authorities.
//!
//! ```yaml
//! accounts:
//!   - address: "<64 hex chars>"
//!     lamports: 5000000000
//! entitlement_classes:
//!   - class: "<64 hex chars>"
//!     mint_authority: "<64 hex chars>"
//! ```
//!
//! Without a genesis file the ledger starts empty.

use std::path::Path;

use licgate_core::{Address, EntitlementClass, Lamports};
use licgate_ledger::{InMemoryLedger, LedgerError};
use serde::Deserialize;

use crate::state::{AppConfig, AppState};

/// Errors during bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Genesis file not found at the given path.
    #[error("genesis file not found: {path}")]
    GenesisNotFound { path: String },

    /// Genesis file is not valid YAML for the expected shape.
    #[error("invalid genesis file: {0}")]
    InvalidGenesis(#[from] serde_yaml::Error),

    /// The ledger refused a genesis entry.
    #[error("genesis rejected by ledger: {0}")]
    Ledger(#[from] LedgerError),

    /// IO error during bootstrap.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One funded account.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenesisAccount {
    pub address: Address,
    pub lamports: Lamports,
}

/// One entitlement class.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenesisClass {
    pub class: EntitlementClass,
    pub mint_authority: Address,
}

/// Initial ledger contents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Genesis {
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
    #[serde(default)]
    pub entitlement_classes: Vec<GenesisClass>,
}

/// Read and parse a genesis file.
pub fn load_genesis(path: &Path) -> Result<Genesis, BootstrapError> {
    if !path.exists() {
        return Err(BootstrapError::GenesisNotFound {
            path: path.display().to_string(),
        });
    }
    let text = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&text)?)
}

/// Credit accounts and create classes on `ledger`.
pub fn apply_genesis(genesis: &Genesis, ledger: &InMemoryLedger) -> Result<(), BootstrapError> {
    for account in &genesis.accounts {
        ledger.airdrop(&account.address, account.lamports)?;
    }
    for class in &genesis.entitlement_classes {
        ledger.create_class(class.class, class.mint_authority)?;
    }
    Ok(())
}

/// Build the application state, seeding the ledger from `genesis` if given.
pub fn bootstrap(config: AppConfig, genesis: Option<&Path>) -> Result<AppState, BootstrapError> {
    let ledger = InMemoryLedger::new();
    match genesis {
        Some(path) => {
            let genesis = load_genesis(path)?;
            apply_genesis(&genesis, &ledger)?;
            tracing::info!(
                path = %path.display(),
                accounts = genesis.accounts.len(),
                classes = genesis.entitlement_classes.len(),
                "genesis loaded"
            );
        }
        None => tracing::info!("no genesis file; ledger starts empty"),
    }
    tracing::info!(
        program_id = %config.engine.program_id,
        repurchase = %config.engine.repurchase,
        max_request_ttl_secs = config.replay.max_ttl_secs,
        "license engine configured"
    );
    Ok(AppState::with_ledger(ledger, config))
}
