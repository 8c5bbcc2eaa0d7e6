//! Keeps node and wallet sessions up and the poller running over them.
//!
//! Each round connects the node, then the wallet, then runs the
//! [`TicketPoller`] until shutdown or until either session drops. Failed
//! connects and dropped sessions are retried after the reconnect interval.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use stakepool_rpc::{NodeRpc, RpcSession, SessionFactory, WalletRpc};
use stakepool_transactions::FeePolicy;

use crate::connect::{connect_node_rpc, connect_wallet_rpc, SessionOptions};
use crate::context::{AppContext, PoolState};
use crate::notifications::{node_notification_handlers, wallet_notification_handlers};
use crate::poller::{PollerExit, TicketPoller};
use crate::shutdown::ShutdownSignal;
use crate::StakepooldConfig;

/// How often a running round checks its sessions are still connected.
const LIVENESS_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// The two session factories plus what a round needs besides sessions.
pub struct Supervisor<NF, WF> {
    pub node_factory: NF,
    pub wallet_factory: WF,
    pub config: StakepooldConfig,
    pub fee_policy: Arc<dyn FeePolicy>,
    pub state: Arc<PoolState>,
}

impl<NF, WF> Supervisor<NF, WF>
where
    NF: SessionFactory,
    NF::Session: NodeRpc,
    WF: SessionFactory,
    WF::Session: WalletRpc,
{
    /// Run rounds until `shutdown` fires.
    pub async fn run(&self, shutdown: &mut ShutdownSignal) {
        let options = SessionOptions::from_config(&self.config);
        while !shutdown.is_requested() {
            match self.round(options, shutdown).await {
                Some(PollerExit::Shutdown) => break,
                Some(PollerExit::EventsClosed) | None => {
                    if wait_or_shutdown(self.config.reconnect_interval(), shutdown).await {
                        break;
                    }
                    info!("reconnecting RPC sessions");
                }
            }
        }
        info!("supervisor stopped");
    }

    /// One connect-and-poll round. `None` when a connect failed.
    async fn round(
        &self,
        options: SessionOptions,
        shutdown: &mut ShutdownSignal,
    ) -> Option<PollerExit> {
        let network = self.config.network;
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let node = match connect_node_rpc(
            &self.node_factory,
            &self.config.node,
            network,
            options,
            node_notification_handlers(events_tx),
        )
        .await
        {
            Ok((session, _)) => Arc::new(session),
            Err(e) => {
                error!(error = %e, "unable to establish node RPC session");
                return None;
            }
        };

        let wallet = match connect_wallet_rpc(
            &self.wallet_factory,
            &self.config.wallet,
            network,
            options,
            wallet_notification_handlers(),
        )
        .await
        {
            Ok((session, _)) => Arc::new(session),
            Err(e) => {
                error!(error = %e, "unable to establish wallet RPC session");
                node.shutdown();
                return None;
            }
        };

        let ctx = AppContext::new(
            node.clone(),
            wallet.clone(),
            self.fee_policy.clone(),
            network,
            self.state.clone(),
        );
        let poller = TicketPoller::new(ctx, self.config.poll_interval());

        let exit = tokio::select! {
            exit = poller.run(events_rx, shutdown) => exit,
            _ = wait_for_disconnect(node.as_ref(), wallet.as_ref()) => {
                warn!("RPC session lost");
                PollerExit::EventsClosed
            }
        };

        node.shutdown();
        wallet.shutdown();
        Some(exit)
    }
}

async fn wait_for_disconnect(node: &dyn RpcSession, wallet: &dyn RpcSession) {
    let mut check = tokio::time::interval(LIVENESS_CHECK_INTERVAL);
    loop {
        check.tick().await;
        if node.is_disconnected() || wallet.is_disconnected() {
            return;
        }
    }
}

/// Sleep for `delay`. Returns true if shutdown fired first.
async fn wait_or_shutdown(delay: Duration, shutdown: &mut ShutdownSignal) -> bool {
    tokio::select! {
        _ = shutdown.recv() => true,
        _ = tokio::time::sleep(delay) => false,
    }
}
