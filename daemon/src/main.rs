//! Rent reclaim daemon: serves the HTTP API used by the front-end.

mod config;
mod shutdown;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use reclaim_ledger::FeeLedger;
use reclaim_network::{redact, Cooldowns, EndpointResolver, EndpointSet, HttpTransport, Upstream};
use reclaim_rpc::{AppState, RpcServer};
use reclaim_store_lmdb::environment::DEFAULT_MAP_SIZE;
use reclaim_store_lmdb::LmdbEnvironment;
use reclaim_types::{Clock, SystemClock};
use reclaim_utils::{init_logging, LogFormat};

use crate::config::ServiceConfig;
use crate::shutdown::ShutdownController;

#[derive(Parser, Debug)]
#[command(name = "reclaim-daemon", about = "Solana rent reclaim service")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// flags and env vars override them.
    #[arg(long, env = "RECLAIM_CONFIG")]
    config: Option<PathBuf>,

    /// Address the HTTP API listens on.
    #[arg(long, env = "RECLAIM_LISTEN_ADDR")]
    listen_addr: Option<SocketAddr>,

    /// Data directory for the referral ledger.
    #[arg(long, env = "RECLAIM_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "RECLAIM_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "RECLAIM_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Primary Solana RPC URL (usually a keyed provider).
    #[arg(long, env = "RECLAIM_RPC_URL")]
    rpc_url: Option<String>,

    /// Fallback RPC URLs, comma-separated.
    #[arg(long, env = "RECLAIM_RPC_FALLBACKS", value_delimiter = ',')]
    rpc_fallbacks: Vec<String>,

    /// Primary DAS URL for token metadata.
    #[arg(long, env = "RECLAIM_DAS_URL")]
    das_url: Option<String>,

    /// Fallback DAS URLs, comma-separated.
    #[arg(long, env = "RECLAIM_DAS_FALLBACKS", value_delimiter = ',')]
    das_fallbacks: Vec<String>,
}

impl Cli {
    /// Overlay flags and env vars on top of `config`.
    fn apply(self, mut config: ServiceConfig) -> ServiceConfig {
        if let Some(addr) = self.listen_addr {
            config.listen_addr = addr;
        }
        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        overlay_endpoints(&mut config.rpc, self.rpc_url, self.rpc_fallbacks);
        overlay_endpoints(&mut config.das, self.das_url, self.das_fallbacks);
        config
    }
}

fn overlay_endpoints(set: &mut EndpointSet, primary: Option<String>, fallbacks: Vec<String>) {
    if primary.is_some() {
        set.primary = primary;
    }
    if !fallbacks.is_empty() {
        set.fallbacks = fallbacks;
    }
}

fn load_config(cli: Cli) -> anyhow::Result<ServiceConfig> {
    let base = match &cli.config {
        Some(path) => ServiceConfig::from_toml_file(path)?,
        None => ServiceConfig::default(),
    };
    Ok(cli.apply(base))
}

fn build_state(
    config: &ServiceConfig,
    env: &LmdbEnvironment,
) -> anyhow::Result<AppState<HttpTransport>> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cooldowns = Cooldowns::from(&config.failover);

    let rpc = EndpointResolver::new("rpc", &config.rpc, cooldowns, clock.clone())?;
    let das = EndpointResolver::new("das", &config.das, cooldowns, clock.clone())
        .context("token metadata needs at least one DAS endpoint ([das] or RECLAIM_DAS_URL)")?;
    let transport = HttpTransport::new(Duration::from_secs(config.failover.request_timeout_secs))?;
    let upstream = Upstream::new(
        transport,
        Arc::new(rpc),
        Arc::new(das),
        config.failover.max_attempts,
    );

    let ledger = FeeLedger::new(
        Arc::new(env.referral_store()),
        clock,
        config.fees.clone(),
    );
    Ok(AppState::new(upstream, Arc::new(ledger)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config(Cli::parse())?;
    init_logging(config.log_format, &config.log_level)?;

    tracing::info!(
        listen = %config.listen_addr,
        rpc_primary = %config.rpc.primary.as_deref().map(redact).unwrap_or_default(),
        rpc_fallbacks = config.rpc.fallbacks.len(),
        das_primary = %config.das.primary.as_deref().map(redact).unwrap_or_default(),
        service_fee = config.fees.service_fee_lamports,
        "starting rent reclaim daemon"
    );

    let env = LmdbEnvironment::open(&config.data_dir, DEFAULT_MAP_SIZE)
        .with_context(|| format!("opening ledger at {}", config.data_dir.display()))?;
    let state = Arc::new(build_state(&config, &env)?);

    let shutdown = ShutdownController::new();
    let server = RpcServer::new(config.listen_addr, state);
    let signal_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { shutdown.wait_for_signal().await })
    };

    let served = server.start(shutdown.signalled()).await;
    signal_task.abort();
    served.context("HTTP server failed")?;

    tracing::info!("rent reclaim daemon exited cleanly");
    Ok(())
}
