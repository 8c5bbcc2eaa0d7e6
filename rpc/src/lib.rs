//! JSON-RPC over websocket for the node and wallet services.

pub mod client;
pub mod conn;
pub mod error;
pub mod node;
pub mod notifications;
pub mod pending;
pub mod session;
pub mod types;
pub mod wallet;

pub use client::RpcClient;
pub use conn::ConnConfig;
pub use error::RpcError;
pub use node::NodeRpc;
pub use notifications::{BlockConnected, NotificationHandlers, WinningTickets};
pub use pending::PendingResponse;
pub use session::{RpcSession, SessionFactory, WsSessionFactory};
pub use types::{
    BestBlock, BlockHeaderVerbose, GetTicketsResult, GetTransactionResult, TransactionDetail,
    VersionMap, VersionResult, NODE_API_COMPONENT, WALLET_API_COMPONENT,
};
pub use wallet::WalletRpc;
