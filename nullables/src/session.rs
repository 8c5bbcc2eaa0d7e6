//! Nullable session factory with scripted `version` answers.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use stakepool_rpc::{
    BestBlock, BlockHeaderVerbose, ConnConfig, GetTransactionResult, NodeRpc,
    NotificationHandlers, PendingResponse, RpcError, RpcSession, SessionFactory, VersionMap,
    VersionResult, WalletRpc,
};
use stakepool_types::{ChainHash, SemVer};

use crate::{NullNode, NullWallet};

/// A session that answers `version` from a script and serves node and
/// wallet calls from a shared [`NullNode`] and [`NullWallet`].
#[derive(Debug)]
pub struct NullSession {
    host: String,
    version: Result<VersionMap, RpcError>,
    shut_down: Arc<AtomicBool>,
    node: Arc<NullNode>,
    wallet: Arc<NullWallet>,
}

impl NullSession {
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RpcSession for NullSession {
    fn host(&self) -> &str {
        &self.host
    }

    async fn version(&self) -> Result<VersionMap, RpcError> {
        self.version.clone()
    }

    fn is_disconnected(&self) -> bool {
        self.is_shut_down()
    }

    fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl NodeRpc for NullSession {
    async fn get_block_header(&self, hash: &ChainHash) -> Result<BlockHeaderVerbose, RpcError> {
        self.node.get_block_header(hash).await
    }

    async fn get_best_block(&self) -> Result<BestBlock, RpcError> {
        self.node.get_best_block().await
    }
}

#[async_trait]
impl WalletRpc for NullSession {
    async fn get_tickets(&self, include_immature: bool) -> Result<Vec<ChainHash>, RpcError> {
        self.wallet.get_tickets(include_immature).await
    }

    fn get_transaction_async(&self, txid: &ChainHash) -> PendingResponse<GetTransactionResult> {
        self.wallet.get_transaction_async(txid)
    }
}

/// Opens [`NullSession`]s.
///
/// Keeps the handlers of the last opened session so tests can push
/// notifications with [`NullSessionFactory::notify`], and a shutdown flag
/// that outlives the session.
pub struct NullSessionFactory {
    version: Result<VersionMap, RpcError>,
    failing_opens: AtomicUsize,
    opens: AtomicUsize,
    configs: Mutex<Vec<ConnConfig>>,
    handlers: Mutex<Option<NotificationHandlers>>,
    shut_down: Arc<AtomicBool>,
    node: Arc<NullNode>,
    wallet: Arc<NullWallet>,
}

impl NullSessionFactory {
    fn with_version(version: Result<VersionMap, RpcError>) -> Self {
        Self {
            version,
            failing_opens: AtomicUsize::new(0),
            opens: AtomicUsize::new(0),
            configs: Mutex::new(Vec::new()),
            handlers: Mutex::new(None),
            shut_down: Arc::new(AtomicBool::new(false)),
            node: Arc::new(NullNode::new()),
            wallet: Arc::new(NullWallet::new()),
        }
    }

    /// Sessions advertise `component` at `version`.
    pub fn advertising(component: &str, version: SemVer) -> Self {
        let mut map = VersionMap::new();
        map.insert(component.to_string(), VersionResult::new(version));
        Self::with_version(Ok(map))
    }

    /// Sessions advertise an empty version map.
    pub fn advertising_nothing() -> Self {
        Self::with_version(Ok(VersionMap::new()))
    }

    /// Sessions open but `version` fails.
    pub fn version_fails(err: RpcError) -> Self {
        Self::with_version(Err(err))
    }

    /// The next `n` opens fail before any succeeds.
    pub fn failing_first(self, n: usize) -> Self {
        self.failing_opens.store(n, Ordering::SeqCst);
        self
    }

    /// Sessions serve node calls from `node`.
    pub fn serving_node(mut self, node: Arc<NullNode>) -> Self {
        self.node = node;
        self
    }

    /// Sessions serve wallet calls from `wallet`.
    pub fn serving_wallet(mut self, wallet: Arc<NullWallet>) -> Self {
        self.wallet = wallet;
        self
    }

    /// Mark the last session as dropped by the server.
    pub fn disconnect(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Configurations passed to `open`, in order.
    pub fn opened_configs(&self) -> Vec<ConnConfig> {
        self.configs.lock().unwrap().clone()
    }

    /// Whether the last session handed out was shut down.
    pub fn session_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Deliver a notification to the last opened session's handlers.
    pub fn notify(&self, method: &str, params: &[Value]) -> Result<(), RpcError> {
        match self.handlers.lock().unwrap().as_ref() {
            Some(handlers) => handlers.dispatch(method, params),
            None => Err(RpcError::Disconnected),
        }
    }
}

#[async_trait]
impl SessionFactory for NullSessionFactory {
    type Session = NullSession;

    async fn open(
        &self,
        config: &ConnConfig,
        handlers: NotificationHandlers,
    ) -> Result<NullSession, RpcError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.configs.lock().unwrap().push(config.clone());

        let failing = self.failing_opens.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_opens.store(failing - 1, Ordering::SeqCst);
            return Err(RpcError::WebSocket("connection refused".into()));
        }

        handlers.client_connected();
        *self.handlers.lock().unwrap() = Some(handlers);
        self.shut_down.store(false, Ordering::SeqCst);
        Ok(NullSession {
            host: config.host.clone(),
            version: self.version.clone(),
            shut_down: self.shut_down.clone(),
            node: self.node.clone(),
            wallet: self.wallet.clone(),
        })
    }
}
