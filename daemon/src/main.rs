//! Stake pool daemon: entry point for running ticket reconciliation.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use stakepool_rpc::WsSessionFactory;
use stakepool_transactions::CommitmentFeePolicy;
use stakepool_types::NetworkId;
use stakepool_utils::{init_logging, LogFormat};
use stakepoold::{
    load_added_low_fee_tickets, load_user_voting_config, PoolState, ShutdownController,
    StakepooldConfig, Supervisor,
};

#[derive(Parser)]
#[command(name = "stakepoold", about = "Stake pool ticket reconciliation daemon")]
struct Cli {
    /// Network: "mainnet", "testnet" or "simnet".
    /// When a config file is provided, defaults to the file's network value.
    #[arg(long, env = "STAKEPOOLD_NETWORK")]
    network: Option<NetworkId>,

    /// Node RPC address (host:port). Defaults to localhost on the network's port.
    #[arg(long, env = "STAKEPOOLD_NODE_HOST")]
    node_host: Option<String>,

    #[arg(long, env = "STAKEPOOLD_NODE_USER")]
    node_user: Option<String>,

    #[arg(long, env = "STAKEPOOLD_NODE_PASS", hide_env_values = true)]
    node_pass: Option<String>,

    /// Node RPC certificate.
    #[arg(long, env = "STAKEPOOLD_NODE_CERT")]
    node_cert: Option<PathBuf>,

    /// Wallet RPC address (host:port). Defaults to localhost on the network's port.
    #[arg(long, env = "STAKEPOOLD_WALLET_HOST")]
    wallet_host: Option<String>,

    #[arg(long, env = "STAKEPOOLD_WALLET_USER")]
    wallet_user: Option<String>,

    #[arg(long, env = "STAKEPOOLD_WALLET_PASS", hide_env_values = true)]
    wallet_pass: Option<String>,

    /// Wallet RPC certificate.
    #[arg(long, env = "STAKEPOOLD_WALLET_CERT")]
    wallet_cert: Option<PathBuf>,

    /// Connect to both servers without TLS.
    #[arg(long, env = "STAKEPOOLD_DISABLE_TLS")]
    disable_tls: bool,

    /// Per-request RPC deadline in seconds.
    #[arg(long, env = "STAKEPOOLD_RPC_TIMEOUT")]
    rpc_timeout: Option<u64>,

    /// Seconds between reconciliation passes when no block arrives.
    #[arg(long, env = "STAKEPOOLD_POLL_INTERVAL")]
    poll_interval: Option<u64>,

    /// Pool fee in percent.
    #[arg(long, env = "STAKEPOOLD_POOL_FEES")]
    pool_fees: Option<f64>,

    /// Pool fee addresses (comma-separated).
    #[arg(long, env = "STAKEPOOLD_POOL_FEE_ADDRESSES", value_delimiter = ',')]
    pool_fee_addresses: Vec<String>,

    /// JSON file with the pool users' voting settings.
    #[arg(long, env = "STAKEPOOLD_VOTING_CONFIG")]
    voting_config: Option<PathBuf>,

    /// JSON file with tickets already flagged as low fee.
    #[arg(long, env = "STAKEPOOLD_ADDED_LOW_FEE")]
    added_low_fee: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "STAKEPOOLD_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "STAKEPOOLD_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Lay the flags that were given over `base`.
    fn apply(self, mut config: StakepooldConfig) -> StakepooldConfig {
        if let Some(network) = self.network {
            config.network = network;
        }
        if let Some(host) = self.node_host {
            config.node.host = host;
        }
        if let Some(user) = self.node_user {
            config.node.user = user;
        }
        if let Some(pass) = self.node_pass {
            config.node.password = pass;
        }
        if let Some(cert) = self.node_cert {
            config.node.cert = cert;
        }
        if let Some(host) = self.wallet_host {
            config.wallet.host = host;
        }
        if let Some(user) = self.wallet_user {
            config.wallet.user = user;
        }
        if let Some(pass) = self.wallet_pass {
            config.wallet.password = pass;
        }
        if let Some(cert) = self.wallet_cert {
            config.wallet.cert = cert;
        }
        config.disable_tls |= self.disable_tls;
        if self.rpc_timeout.is_some() {
            config.rpc_timeout_secs = self.rpc_timeout;
        }
        if let Some(secs) = self.poll_interval {
            config.poll_interval_secs = secs;
        }
        if let Some(fees) = self.pool_fees {
            config.pool_fees = fees;
        }
        if !self.pool_fee_addresses.is_empty() {
            config.pool_fee_addresses = self.pool_fee_addresses;
        }
        if self.voting_config.is_some() {
            config.voting_config_file = self.voting_config;
        }
        if self.added_low_fee.is_some() {
            config.added_low_fee_file = self.added_low_fee;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base = match cli.config.as_deref() {
        Some(path) => {
            let path_str = path.to_str().context("config path is not valid UTF-8")?;
            StakepooldConfig::from_toml_file(path_str)
                .with_context(|| format!("failed to load config file {}", path.display()))?
        }
        None => StakepooldConfig::default(),
    };
    let config_path = cli.config.clone();
    let config = cli.apply(base);

    init_logging(config.log_format, &config.log_level)
        .context("failed to initialise logging")?;
    if let Some(path) = config_path {
        tracing::info!(path = %path.display(), "loaded config file");
    }

    config.validate()?;
    let fee_addresses = config.fee_addresses()?;

    let user_voting_config = match config.voting_config_file.as_deref() {
        Some(path) => load_user_voting_config(path)?,
        None => Default::default(),
    };
    let added_low_fee = match config.added_low_fee_file.as_deref() {
        Some(path) => load_added_low_fee_tickets(path)?,
        None => Default::default(),
    };
    tracing::info!(
        network = %config.network,
        users = user_voting_config.len(),
        added_low_fee = added_low_fee.len(),
        pool_fees = config.pool_fees,
        "starting stake pool daemon"
    );

    let fee_policy = Arc::new(CommitmentFeePolicy::new(
        config.network,
        config.pool_fees,
        &fee_addresses,
    ));
    let state = Arc::new(PoolState::new(user_voting_config, added_low_fee));

    let controller = Arc::new(ShutdownController::new());
    let mut shutdown = controller.subscribe();
    let signals = controller.clone();
    tokio::spawn(async move { signals.wait_for_signal().await });

    let supervisor = Supervisor {
        node_factory: WsSessionFactory,
        wallet_factory: WsSessionFactory,
        config,
        fee_policy,
        state,
    };
    supervisor.run(&mut shutdown).await;

    tracing::info!("stake pool daemon exited cleanly");
    Ok(())
}
