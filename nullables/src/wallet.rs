//! Nullable wallet with a scripted ticket list and transactions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use stakepool_rpc::{
    GetTransactionResult, PendingResponse, RpcError, TransactionDetail, WalletRpc,
};
use stakepool_types::ChainHash;

/// A test wallet.
///
/// Tickets are listed in the order they were added. `gettransaction` for a
/// hash without a scripted answer fails the way a real wallet does.
#[derive(Debug, Default)]
pub struct NullWallet {
    tickets: Mutex<Vec<ChainHash>>,
    list_error: Mutex<Option<RpcError>>,
    transactions: Mutex<HashMap<ChainHash, Result<GetTransactionResult, RpcError>>>,
    requested: Mutex<Vec<ChainHash>>,
    list_calls: Mutex<Vec<bool>>,
}

impl NullWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// List `hash` as a ticket and answer `gettransaction` with `tx`.
    pub fn with_ticket(self, hash: ChainHash, tx: GetTransactionResult) -> Self {
        self.tickets.lock().unwrap().push(hash);
        self.transactions.lock().unwrap().insert(hash, Ok(tx));
        self
    }

    /// List `hash` as a ticket whose `gettransaction` fails with `err`.
    pub fn with_failing_ticket(self, hash: ChainHash, err: RpcError) -> Self {
        self.tickets.lock().unwrap().push(hash);
        self.transactions.lock().unwrap().insert(hash, Err(err));
        self
    }

    /// Make `gettickets` fail.
    pub fn fail_ticket_list(&self, err: RpcError) {
        *self.list_error.lock().unwrap() = Some(err);
    }

    /// Hashes passed to `gettransaction`, in dispatch order.
    pub fn requested_transactions(&self) -> Vec<ChainHash> {
        self.requested.lock().unwrap().clone()
    }

    /// `include_immature` argument of every `gettickets` call.
    pub fn ticket_list_calls(&self) -> Vec<bool> {
        self.list_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletRpc for NullWallet {
    async fn get_tickets(&self, include_immature: bool) -> Result<Vec<ChainHash>, RpcError> {
        self.list_calls.lock().unwrap().push(include_immature);
        if let Some(err) = self.list_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.tickets.lock().unwrap().clone())
    }

    fn get_transaction_async(&self, txid: &ChainHash) -> PendingResponse<GetTransactionResult> {
        self.requested.lock().unwrap().push(*txid);
        let scripted = self.transactions.lock().unwrap().get(txid).cloned();
        PendingResponse::from_result(scripted.unwrap_or(Err(RpcError::Server {
            code: -5,
            message: "No information for transaction".into(),
        })))
    }
}

/// A `gettransaction` answer for a mined ticket with one detail per owner
/// address, in order.
pub fn ticket_transaction(
    txid: &ChainHash,
    block_hash: &ChainHash,
    tx_hex: impl Into<String>,
    owners: &[&str],
) -> GetTransactionResult {
    GetTransactionResult {
        txid: txid.to_string(),
        block_hash: block_hash.to_string(),
        hex: tx_hex.into(),
        confirmations: 1,
        details: owners
            .iter()
            .map(|address| TransactionDetail {
                address: address.to_string(),
                category: "ticket".into(),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_transaction_fails() {
        let wallet = NullWallet::new();
        let txid = ChainHash::new([3u8; 32]);
        assert!(matches!(
            wallet.get_transaction_async(&txid).receive().await,
            Err(RpcError::Server { code: -5, .. })
        ));
        assert_eq!(wallet.requested_transactions(), vec![txid]);
    }

    #[tokio::test]
    async fn lists_tickets_in_order() {
        let a = ChainHash::new([1u8; 32]);
        let b = ChainHash::new([2u8; 32]);
        let wallet = NullWallet::new()
            .with_ticket(a, ticket_transaction(&a, &a, "", &[]))
            .with_ticket(b, ticket_transaction(&b, &b, "", &[]));
        assert_eq!(wallet.get_tickets(false).await.unwrap(), vec![a, b]);
        assert_eq!(wallet.ticket_list_calls(), vec![false]);
    }

    #[tokio::test]
    async fn scripted_list_failure() {
        let wallet = NullWallet::new();
        wallet.fail_ticket_list(RpcError::Disconnected);
        assert_eq!(wallet.get_tickets(false).await, Err(RpcError::Disconnected));
    }
}
