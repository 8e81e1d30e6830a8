//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! The engine and the ledger are synchronous and guarded by `parking_lot`
//! locks that are never held across `.await` points, so handlers call them
//! directly.

use std::sync::Arc;

use licgate_ledger::InMemoryLedger;
use licgate_state::{EngineConfig, LicenseEngine};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::replay::{ReplayConfig, ReplayGuard};

/// Server configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppConfig {
    /// Listen port.
    pub port: u16,
    /// Program id and re-purchase policy.
    pub engine: EngineConfig,
    /// Signed-request freshness window.
    pub replay: ReplayConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            engine: EngineConfig::default(),
            replay: ReplayConfig::default(),
        }
    }
}

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// The license engine.
    pub engine: Arc<LicenseEngine<InMemoryLedger>>,
    /// The ledger the engine runs on; clones share state.
    pub ledger: InMemoryLedger,
    pub config: AppConfig,
    /// Nonces already accepted on signed requests.
    pub replay: ReplayGuard,
    /// Prometheus render handle, present when the recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Default configuration over an empty ledger.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// `config` over an empty ledger.
    pub fn with_config(config: AppConfig) -> Self {
        Self::with_ledger(InMemoryLedger::new(), config)
    }

    /// `config` over an existing ledger.
    pub fn with_ledger(ledger: InMemoryLedger, config: AppConfig) -> Self {
        Self {
            engine: Arc::new(LicenseEngine::new(ledger.clone(), config.engine)),
            ledger,
            replay: ReplayGuard::new(config.replay),
            config,
            metrics: None,
        }
    }

    /// Serve `/metrics` from `handle`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
