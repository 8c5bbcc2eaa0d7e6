//! Block hash to height lookups, memoised for one reconciliation pass.

use std::collections::HashMap;
use tracing::trace;

use stakepool_rpc::{NodeRpc, RpcError};
use stakepool_types::ChainHash;

/// Resolves block heights through the node, asking at most once per hash
/// while a lookup keeps succeeding. Failures are not remembered.
pub struct BlockHeightCache<'a> {
    node: &'a dyn NodeRpc,
    heights: HashMap<ChainHash, i32>,
}

impl<'a> BlockHeightCache<'a> {
    pub fn new(node: &'a dyn NodeRpc) -> Self {
        Self {
            node,
            heights: HashMap::new(),
        }
    }

    pub async fn resolve(&mut self, hash: &ChainHash) -> Result<i32, RpcError> {
        if let Some(height) = self.heights.get(hash) {
            return Ok(*height);
        }

        let header = self.node.get_block_header(hash).await?;
        let height = i32::try_from(header.height)
            .map_err(|_| RpcError::Decode(format!("block height {} out of range", header.height)))?;
        trace!(block_hash = %hash, height, "resolved block height");
        self.heights.insert(*hash, height);
        Ok(height)
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }
}
