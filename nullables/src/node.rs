//! Nullable node serving block headers from memory.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use stakepool_rpc::{BestBlock, BlockHeaderVerbose, NodeRpc, RpcError};
use stakepool_types::ChainHash;

/// A test node that knows a fixed set of blocks.
///
/// Every header lookup is counted per hash so tests can assert how often
/// the node was asked.
#[derive(Debug, Default)]
pub struct NullNode {
    heights: Mutex<HashMap<ChainHash, u32>>,
    failing: Mutex<HashSet<ChainHash>>,
    lookups: Mutex<HashMap<ChainHash, usize>>,
}

impl NullNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block the node can describe.
    pub fn with_block(self, hash: ChainHash, height: u32) -> Self {
        self.add_block(hash, height);
        self
    }

    pub fn add_block(&self, hash: ChainHash, height: u32) {
        self.heights.lock().unwrap().insert(hash, height);
    }

    /// Make lookups of `hash` fail until [`NullNode::heal`] is called.
    pub fn fail_header(&self, hash: ChainHash) {
        self.failing.lock().unwrap().insert(hash);
    }

    pub fn heal(&self, hash: &ChainHash) {
        self.failing.lock().unwrap().remove(hash);
    }

    /// Number of `getblockheader` calls made for `hash`.
    pub fn header_lookups(&self, hash: &ChainHash) -> usize {
        self.lookups.lock().unwrap().get(hash).copied().unwrap_or(0)
    }

    pub fn total_header_lookups(&self) -> usize {
        self.lookups.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl NodeRpc for NullNode {
    async fn get_block_header(&self, hash: &ChainHash) -> Result<BlockHeaderVerbose, RpcError> {
        *self.lookups.lock().unwrap().entry(*hash).or_insert(0) += 1;

        if self.failing.lock().unwrap().contains(hash) {
            return Err(RpcError::Disconnected);
        }
        let height = self.heights.lock().unwrap().get(hash).copied();
        match height {
            Some(height) => Ok(BlockHeaderVerbose {
                hash: hash.to_string(),
                confirmations: 1,
                height,
                time: 0,
                previous_block_hash: None,
            }),
            None => Err(RpcError::Server {
                code: -5,
                message: "Block not found".into(),
            }),
        }
    }

    async fn get_best_block(&self) -> Result<BestBlock, RpcError> {
        self.heights
            .lock()
            .unwrap()
            .iter()
            .max_by_key(|(_, height)| **height)
            .map(|(hash, height)| BestBlock {
                hash: *hash,
                height: *height as i64,
            })
            .ok_or(RpcError::Server {
                code: -1,
                message: "no blocks".into(),
            })
    }
}

/// Hex of a serialized block header carrying `height`, shaped like a
/// `blockconnected` payload.
pub fn block_header_hex(height: u32) -> String {
    let mut header = vec![0u8; 180];
    header[128..132].copy_from_slice(&height.to_le_bytes());
    hex::encode(header)
}
