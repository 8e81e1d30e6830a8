//! # licgate-api — Binary Entry Point
//!
//! Parses configuration from flags and environment, initializes tracing and
//! optional Prometheus metrics, seeds the ledger from genesis, and serves.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use licgate_core::Address;
use licgate_state::{EngineConfig, RepurchasePolicy, DEFAULT_PROGRAM_ID};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

use licgate_api::replay::ReplayConfig;
use licgate_api::state::AppConfig;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// licgate license gate server.
#[derive(Debug, Parser)]
#[command(name = "licgate-api", version, about)]
struct Cli {
    /// Listen port.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Program id mixed into Publisher addresses (hex).
    #[arg(long, env = "LICGATE_PROGRAM_ID")]
    program_id: Option<Address>,

    /// YAML genesis file of funded accounts and entitlement classes.
    #[arg(long, env = "LICGATE_GENESIS")]
    genesis: Option<PathBuf>,

    /// Behaviour when a licensed subscriber buys again: reject or accumulate.
    #[arg(long, env = "LICGATE_REPURCHASE", default_value = "reject")]
    repurchase: RepurchasePolicy,

    /// Log output format.
    #[arg(long, env = "LICGATE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Longest accepted validity of a signed request, in seconds.
    #[arg(long, env = "LICGATE_MAX_REQUEST_TTL", default_value_t = 300)]
    max_request_ttl: u64,

    /// Install the Prometheus recorder and serve /metrics.
    #[arg(long, env = "LICGATE_METRICS")]
    metrics: bool,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = AppConfig {
        port: cli.port,
        engine: EngineConfig {
            program_id: cli.program_id.unwrap_or(DEFAULT_PROGRAM_ID),
            repurchase: cli.repurchase,
        },
        replay: ReplayConfig {
            max_ttl_secs: cli.max_request_ttl,
        },
    };

    let mut state = licgate_api::bootstrap::bootstrap(config, cli.genesis.as_deref())
        .context("bootstrap failed")?;

    if cli.metrics {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("failed to install Prometheus recorder")?;
        state = state.with_metrics(handle);
        tracing::info!("Prometheus metrics enabled at /metrics");
    }

    let app = licgate_api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("licgate API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
