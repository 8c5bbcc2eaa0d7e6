//! Result types of the node and wallet JSON-RPC methods this daemon calls.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use stakepool_types::{ChainHash, SemVer};

/// Version map key advertised by the node.
pub const NODE_API_COMPONENT: &str = "dcrdjsonrpcapi";
/// Version map key advertised by the wallet.
pub const WALLET_API_COMPONENT: &str = "dcrwalletjsonrpcapi";

/// One entry of the `version` result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResult {
    #[serde(rename = "versionstring", default)]
    pub version_string: String,
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    #[serde(default)]
    pub prerelease: String,
    #[serde(rename = "buildmetadata", default)]
    pub build_metadata: String,
}

impl VersionResult {
    pub fn new(version: SemVer) -> Self {
        Self {
            version_string: version.to_string(),
            major: version.major,
            minor: version.minor,
            patch: version.patch,
            prerelease: String::new(),
            build_metadata: String::new(),
        }
    }

    pub fn semver(&self) -> SemVer {
        SemVer::new(self.major, self.minor, self.patch)
    }
}

/// `version` result: component name → version.
pub type VersionMap = HashMap<String, VersionResult>;

/// Verbose `getblockheader` result, reduced to the fields the pool reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeaderVerbose {
    pub hash: String,
    #[serde(default)]
    pub confirmations: i64,
    pub height: u32,
    #[serde(default)]
    pub time: i64,
    #[serde(rename = "previousblockhash", default, skip_serializing_if = "Option::is_none")]
    pub previous_block_hash: Option<String>,
}

/// `getbestblock` result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestBlock {
    pub hash: ChainHash,
    pub height: i64,
}

/// `gettickets` result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTicketsResult {
    #[serde(default)]
    pub hashes: Vec<ChainHash>,
}

/// One wallet-relevant output or input of a transaction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetail {
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<f64>,
    #[serde(default)]
    pub vout: u32,
}

/// `gettransaction` result. Hashes stay in string form; callers decode
/// them and treat failures per transaction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GetTransactionResult {
    #[serde(default)]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<f64>,
    #[serde(default)]
    pub confirmations: i64,
    #[serde(rename = "blockhash", default)]
    pub block_hash: String,
    #[serde(rename = "blockindex", default)]
    pub block_index: i64,
    #[serde(rename = "blocktime", default)]
    pub block_time: i64,
    pub txid: String,
    #[serde(default)]
    pub time: i64,
    #[serde(rename = "timereceived", default)]
    pub time_received: i64,
    #[serde(default)]
    pub details: Vec<TransactionDetail>,
    #[serde(default)]
    pub hex: String,
}
