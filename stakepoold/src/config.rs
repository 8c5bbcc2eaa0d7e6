//! Daemon configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use stakepool_types::{NetworkId, StakeAddress};
use stakepool_utils::LogFormat;

use crate::StakepooldError;

/// Where and how to reach one RPC server.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RpcEndpointConfig {
    /// `host:port`. Empty means localhost on the network's default port.
    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// PEM certificate the server presents.
    #[serde(default)]
    pub cert: PathBuf,
}

impl RpcEndpointConfig {
    pub fn host_or_default(&self, default_port: u16) -> String {
        if self.host.is_empty() {
            format!("127.0.0.1:{default_port}")
        } else {
            self.host.clone()
        }
    }
}

impl fmt::Debug for RpcEndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcEndpointConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("cert", &self.cert)
            .finish()
    }
}

/// Configuration for the stake pool daemon.
///
/// Can be loaded from a TOML file via [`StakepooldConfig::from_toml_file`]
/// or built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StakepooldConfig {
    /// Which network the node and wallet serve.
    #[serde(default = "default_network")]
    pub network: NetworkId,

    /// Connect without TLS. Only sensible for local development.
    #[serde(default)]
    pub disable_tls: bool,

    /// Deadline for a single RPC request. Unset waits indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_timeout_secs: Option<u64>,

    /// Seconds between reconciliation passes when no block arrives.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds between attempts to (re)establish RPC sessions.
    #[serde(default = "default_reconnect_interval_secs")]
    pub reconnect_interval_secs: u64,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// JSON file mapping multisig voting address to user voting settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voting_config_file: Option<PathBuf>,

    /// JSON file listing tickets already flagged as low fee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_low_fee_file: Option<PathBuf>,

    /// Pool fee in percent of the vote reward.
    #[serde(default = "default_pool_fees")]
    pub pool_fees: f64,

    /// Addresses a ticket's pool fee commitment may pay.
    #[serde(default)]
    pub pool_fee_addresses: Vec<String>,

    #[serde(default)]
    pub node: RpcEndpointConfig,

    #[serde(default)]
    pub wallet: RpcEndpointConfig,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_network() -> NetworkId {
    NetworkId::Mainnet
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_reconnect_interval_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_pool_fees() -> f64 {
    7.5
}

// ── Impl ───────────────────────────────────────────────────────────────

impl StakepooldConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, StakepooldError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| StakepooldError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, StakepooldError> {
        toml::from_str(s).map_err(|e| StakepooldError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, StakepooldError> {
        toml::to_string_pretty(self).map_err(|e| StakepooldError::Config(e.to_string()))
    }

    pub fn rpc_timeout(&self) -> Option<Duration> {
        self.rpc_timeout_secs.map(Duration::from_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.reconnect_interval_secs.max(1))
    }

    /// Decode `pool_fee_addresses` for the configured network.
    pub fn fee_addresses(&self) -> Result<Vec<StakeAddress>, StakepooldError> {
        self.pool_fee_addresses
            .iter()
            .map(|a| {
                StakeAddress::decode(a, self.network)
                    .map_err(|e| StakepooldError::Config(format!("pool fee address {a}: {e}")))
            })
            .collect()
    }

    /// Reject settings the daemon cannot run with.
    pub fn validate(&self) -> Result<(), StakepooldError> {
        if !(0.0..=100.0).contains(&self.pool_fees) {
            return Err(StakepooldError::Config(format!(
                "pool_fees must be between 0 and 100, got {}",
                self.pool_fees
            )));
        }
        if self.pool_fee_addresses.is_empty() {
            return Err(StakepooldError::Config(
                "at least one pool fee address is required".into(),
            ));
        }
        self.fee_addresses()?;
        Ok(())
    }
}

impl Default for StakepooldConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            disable_tls: false,
            rpc_timeout_secs: None,
            poll_interval_secs: default_poll_interval_secs(),
            reconnect_interval_secs: default_reconnect_interval_secs(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            voting_config_file: None,
            added_low_fee_file: None,
            pool_fees: default_pool_fees(),
            pool_fee_addresses: Vec::new(),
            node: RpcEndpointConfig::default(),
            wallet: RpcEndpointConfig::default(),
        }
    }
}
