//! Service configuration with TOML file support.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use reclaim_ledger::FeeConfig;
use reclaim_network::{EndpointSet, FailoverConfig};
use reclaim_utils::LogFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Public Solana RPC used when no fallbacks are configured.
pub const PUBLIC_MAINNET_RPC: &str = "https://api.mainnet-beta.solana.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for the rent reclaim daemon.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Address the HTTP API binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Directory holding the LMDB referral ledger.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// Log level filter, e.g. `"info"` or `"info,reclaim_network=debug"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Solana JSON-RPC endpoints.
    #[serde(default = "default_rpc")]
    pub rpc: EndpointSet,

    /// DAS (Digital Asset Standard) endpoints for token metadata.
    #[serde(default)]
    pub das: EndpointSet,

    #[serde(default)]
    pub failover: FailoverConfig,

    #[serde(default)]
    pub fees: FeeConfig,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./reclaim_data")
}

fn default_log_format() -> LogFormat {
    LogFormat::Human
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_rpc() -> EndpointSet {
    EndpointSet::new(None, &[PUBLIC_MAINNET_RPC])
}

impl ServiceConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            data_dir: default_data_dir(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            rpc: default_rpc(),
            das: EndpointSet::default(),
            failover: FailoverConfig::default(),
            fees: FeeConfig::default(),
        }
    }
}
