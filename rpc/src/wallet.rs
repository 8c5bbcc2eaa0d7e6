//! Wallet RPC calls.

use async_trait::async_trait;
use serde_json::json;

use stakepool_types::ChainHash;

use crate::{GetTicketsResult, GetTransactionResult, PendingResponse, RpcClient, RpcError};

#[async_trait]
pub trait WalletRpc: Send + Sync {
    /// `gettickets <include_immature>`
    async fn get_tickets(&self, include_immature: bool) -> Result<Vec<ChainHash>, RpcError>;

    /// `gettransaction <txid>`, dispatched now and received later.
    fn get_transaction_async(&self, txid: &ChainHash) -> PendingResponse<GetTransactionResult>;
}

#[async_trait]
impl WalletRpc for RpcClient {
    async fn get_tickets(&self, include_immature: bool) -> Result<Vec<ChainHash>, RpcError> {
        let result: GetTicketsResult = self
            .call("gettickets", vec![json!(include_immature)])
            .await?;
        Ok(result.hashes)
    }

    fn get_transaction_async(&self, txid: &ChainHash) -> PendingResponse<GetTransactionResult> {
        self.send_request("gettransaction", vec![json!(txid.to_string())])
    }
}
