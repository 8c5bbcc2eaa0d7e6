//! Node (chain server) RPC calls.

use async_trait::async_trait;
use serde_json::json;

use stakepool_types::ChainHash;

use crate::{BestBlock, BlockHeaderVerbose, RpcClient, RpcError};

#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// `getblockheader <hash> true`
    async fn get_block_header(&self, hash: &ChainHash) -> Result<BlockHeaderVerbose, RpcError>;

    /// `getbestblock`
    async fn get_best_block(&self) -> Result<BestBlock, RpcError>;
}

#[async_trait]
impl NodeRpc for RpcClient {
    async fn get_block_header(&self, hash: &ChainHash) -> Result<BlockHeaderVerbose, RpcError> {
        self.call("getblockheader", vec![json!(hash.to_string()), json!(true)])
            .await
    }

    async fn get_best_block(&self) -> Result<BestBlock, RpcError> {
        self.call("getbestblock", Vec::new()).await
    }
}
