use std::path::PathBuf;
use thiserror::Error;

use stakepool_rpc::RpcError;
use stakepool_types::SemVer;

/// Why a node or wallet session could not be established.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("unable to read RPC certificate {path}: {source}")]
    CertRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to connect to {host}: {source}")]
    Open {
        host: String,
        #[source]
        source: RpcError,
    },

    #[error("unable to obtain {component} API version: {source}")]
    Version {
        component: &'static str,
        #[source]
        source: RpcError,
    },

    #[error("node JSON-RPC server does not have a compatible API version: advertises {advertised}, but requires {required}")]
    IncompatibleNode { advertised: SemVer, required: SemVer },
}

#[derive(Debug, Error)]
pub enum StakepooldError {
    #[error("config error: {0}")]
    Config(String),

    #[error("connect error: {0}")]
    Connect(#[from] ConnectError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("invalid {what} file {path}: {reason}")]
    DataFile {
        what: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
