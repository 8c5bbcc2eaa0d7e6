//! Stake pool daemon core.
//!
//! The daemon keeps authenticated sessions with a node and a wallet and
//! periodically reconciles the wallet's tickets:
//! - Establishes and version-checks the node and wallet RPC sessions
//! - Resolves ticket purchase heights through a per-pass cache
//! - Assigns each ticket to the pool user it belongs to
//! - Splits tickets into live and ignored-low-fee sets using the fee policy
//! - Reruns the reconciliation on new blocks and on a timer

pub mod config;
pub mod connect;
pub mod context;
pub mod data_files;
pub mod error;
pub mod height_cache;
pub mod notifications;
pub mod poller;
pub mod shutdown;
pub mod supervisor;
pub mod tickets;
pub mod tracing_spans;

pub use config::{RpcEndpointConfig, StakepooldConfig};
pub use connect::{
    connect_node_rpc, connect_wallet_rpc, SessionOptions, REQUIRED_CHAIN_SERVER_API,
    REQUIRED_WALLET_API,
};
pub use context::{AppContext, PoolState, TicketOwners, TicketSnapshot};
pub use data_files::{load_added_low_fee_tickets, load_user_voting_config};
pub use error::{ConnectError, StakepooldError};
pub use height_cache::BlockHeightCache;
pub use notifications::{node_notification_handlers, wallet_notification_handlers, NodeEvent};
pub use poller::{PollerExit, TicketPoller};
pub use shutdown::{ShutdownController, ShutdownSignal};
pub use supervisor::Supervisor;
pub use tickets::{wallet_get_tickets, WalletTickets};
