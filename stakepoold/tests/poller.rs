//! Pass scheduling and session supervision.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use stakepool_nullables::{NullFeePolicy, NullNode, NullSessionFactory, NullWallet};
use stakepool_rpc::{NODE_API_COMPONENT, WALLET_API_COMPONENT};
use stakepool_types::{ChainHash, NetworkId, SemVer};
use stakepoold::{
    AppContext, NodeEvent, PollerExit, PoolState, RpcEndpointConfig, ShutdownController,
    StakepooldConfig, Supervisor, TicketPoller, TicketSnapshot,
};

const WAIT: Duration = Duration::from_secs(10);

fn tip() -> ChainHash {
    ChainHash::new([0x77; 32])
}

fn context(node: Arc<NullNode>, wallet: Arc<NullWallet>, state: Arc<PoolState>) -> AppContext {
    AppContext::new(
        node,
        wallet,
        Arc::new(NullFeePolicy::accepting()),
        NetworkId::Simnet,
        state,
    )
}

/// Poll `state` until a snapshot satisfying `accept` is published.
async fn published(state: &PoolState, accept: impl Fn(&TicketSnapshot) -> bool) -> TicketSnapshot {
    tokio::time::timeout(WAIT, async {
        loop {
            if let Some(snapshot) = state.latest().filter(|s| accept(s)) {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("no matching snapshot published")
}

// ---------------------------------------------------------------------------
// TicketPoller
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_pass_runs_at_best_height() {
    let node = Arc::new(NullNode::new().with_block(tip(), 1_200));
    let wallet = Arc::new(NullWallet::new());
    let state = Arc::new(PoolState::default());
    let poller = TicketPoller::new(
        context(node, wallet.clone(), state.clone()),
        Duration::from_secs(3600),
    );
    let (_events_tx, events_rx) = mpsc::unbounded_channel();
    let controller = ShutdownController::new();
    let mut shutdown_rx = controller.subscribe();

    let task = tokio::spawn(async move { poller.run(events_rx, &mut shutdown_rx).await });

    let snapshot = published(&state, |_| true).await;
    assert_eq!(snapshot.height, 1_200);
    assert!(snapshot.tickets.live.is_empty());
    assert_eq!(wallet.ticket_list_calls(), vec![false]);

    controller.shutdown();
    assert_eq!(task.await.unwrap(), PollerExit::Shutdown);
}

#[tokio::test]
async fn connected_block_triggers_pass() {
    let node = Arc::new(NullNode::new().with_block(tip(), 10));
    let wallet = Arc::new(NullWallet::new());
    let state = Arc::new(PoolState::default());
    let poller = TicketPoller::new(
        context(node, wallet.clone(), state.clone()),
        Duration::from_secs(3600),
    );
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let _controller = ShutdownController::new();
    let mut shutdown_rx = _controller.subscribe();

    let task = tokio::spawn(async move { poller.run(events_rx, &mut shutdown_rx).await });
    published(&state, |s| s.height == 10).await;

    events_tx
        .send(NodeEvent::BlockConnected { height: 11 })
        .unwrap();
    published(&state, |s| s.height == 11).await;
    assert_eq!(wallet.ticket_list_calls().len(), 2);

    drop(events_tx);
    assert_eq!(task.await.unwrap(), PollerExit::EventsClosed);
}

#[tokio::test]
async fn interval_pass_refreshes_height() {
    let node = Arc::new(NullNode::new().with_block(tip(), 50));
    let wallet = Arc::new(NullWallet::new());
    let state = Arc::new(PoolState::default());
    let poller = TicketPoller::new(
        context(node.clone(), wallet.clone(), state.clone()),
        Duration::from_secs(1),
    );
    let (_events_tx, events_rx) = mpsc::unbounded_channel();
    let controller = ShutdownController::new();
    let mut shutdown_rx = controller.subscribe();

    let task = tokio::spawn(async move { poller.run(events_rx, &mut shutdown_rx).await });
    published(&state, |s| s.height == 50).await;

    node.add_block(ChainHash::new([0x78; 32]), 51);
    published(&state, |s| s.height == 51).await;
    assert!(wallet.ticket_list_calls().len() >= 2);

    controller.shutdown();
    assert_eq!(task.await.unwrap(), PollerExit::Shutdown);
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

struct Rig {
    _cert: tempfile::NamedTempFile,
    config: StakepooldConfig,
    node: Arc<NullNode>,
    wallet: Arc<NullWallet>,
}

fn rig() -> Rig {
    let mut cert = tempfile::NamedTempFile::new().unwrap();
    cert.write_all(b"cert").unwrap();
    let endpoint = RpcEndpointConfig {
        host: String::new(),
        user: "pool".into(),
        password: "secret".into(),
        cert: cert.path().to_path_buf(),
    };
    let config = StakepooldConfig {
        network: NetworkId::Simnet,
        poll_interval_secs: 3600,
        reconnect_interval_secs: 1,
        node: endpoint.clone(),
        wallet: endpoint,
        ..StakepooldConfig::default()
    };
    Rig {
        _cert: cert,
        config,
        node: Arc::new(NullNode::new().with_block(tip(), 900)),
        wallet: Arc::new(NullWallet::new()),
    }
}

fn node_factory(rig: &Rig) -> NullSessionFactory {
    NullSessionFactory::advertising(NODE_API_COMPONENT, SemVer::new(5, 0, 0))
        .serving_node(rig.node.clone())
}

fn wallet_factory(rig: &Rig) -> NullSessionFactory {
    NullSessionFactory::advertising(WALLET_API_COMPONENT, SemVer::new(5, 0, 0))
        .serving_wallet(rig.wallet.clone())
}

#[tokio::test]
async fn supervisor_retries_failed_connect() {
    let rig = rig();
    let state = Arc::new(PoolState::default());
    let supervisor = Supervisor {
        node_factory: node_factory(&rig).failing_first(1),
        wallet_factory: wallet_factory(&rig),
        config: rig.config.clone(),
        fee_policy: Arc::new(NullFeePolicy::accepting()),
        state: state.clone(),
    };
    let controller = ShutdownController::new();
    let mut shutdown = controller.subscribe();

    let task = tokio::spawn(async move {
        supervisor.run(&mut shutdown).await;
        supervisor
    });

    let snapshot = published(&state, |_| true).await;
    assert_eq!(snapshot.height, 900);

    controller.shutdown();
    let supervisor = task.await.unwrap();
    assert_eq!(supervisor.node_factory.opens(), 2);
    assert_eq!(supervisor.wallet_factory.opens(), 1);
    assert!(supervisor.node_factory.session_shut_down());
    assert!(supervisor.wallet_factory.session_shut_down());
}

#[tokio::test]
async fn supervisor_shuts_node_down_when_wallet_fails() {
    let rig = rig();
    let state = Arc::new(PoolState::default());
    let supervisor = Supervisor {
        node_factory: node_factory(&rig),
        wallet_factory: wallet_factory(&rig).failing_first(1),
        config: rig.config.clone(),
        fee_policy: Arc::new(NullFeePolicy::accepting()),
        state: state.clone(),
    };
    let controller = ShutdownController::new();
    let mut shutdown = controller.subscribe();

    let task = tokio::spawn(async move {
        supervisor.run(&mut shutdown).await;
        supervisor
    });

    published(&state, |_| true).await;
    controller.shutdown();
    let supervisor = task.await.unwrap();
    assert_eq!(supervisor.node_factory.opens(), 2);
    assert_eq!(supervisor.wallet_factory.opens(), 2);
}

#[tokio::test]
async fn supervisor_reconnects_after_session_loss() {
    let rig = rig();
    let state = Arc::new(PoolState::default());
    let supervisor = Arc::new(Supervisor {
        node_factory: node_factory(&rig),
        wallet_factory: wallet_factory(&rig),
        config: rig.config.clone(),
        fee_policy: Arc::new(NullFeePolicy::accepting()),
        state: state.clone(),
    });
    let controller = ShutdownController::new();
    let mut shutdown = controller.subscribe();

    let running = supervisor.clone();
    let task = tokio::spawn(async move { running.run(&mut shutdown).await });

    published(&state, |s| s.height == 900).await;
    rig.node.add_block(ChainHash::new([0x79; 32]), 901);
    supervisor.node_factory.disconnect();

    // Only a fresh round queries the best block again.
    published(&state, |s| s.height == 901).await;
    assert_eq!(supervisor.node_factory.opens(), 2);

    controller.shutdown();
    task.await.unwrap();
}

#[tokio::test]
async fn supervisor_does_not_start_after_shutdown() {
    let rig = rig();
    let supervisor = Supervisor {
        node_factory: node_factory(&rig),
        wallet_factory: wallet_factory(&rig),
        config: rig.config.clone(),
        fee_policy: Arc::new(NullFeePolicy::accepting()),
        state: Arc::new(PoolState::default()),
    };
    let controller = ShutdownController::new();
    controller.shutdown();
    let mut shutdown = controller.subscribe();

    tokio::time::timeout(WAIT, supervisor.run(&mut shutdown))
        .await
        .expect("supervisor did not stop");
    assert_eq!(supervisor.node_factory.opens(), 0);
    assert_eq!(supervisor.wallet_factory.opens(), 0);
}

#[tokio::test]
async fn supervisor_stops_on_shutdown_while_waiting() {
    let rig = rig();
    let supervisor = Arc::new(Supervisor {
        node_factory: NullSessionFactory::advertising(NODE_API_COMPONENT, SemVer::new(4, 0, 0)),
        wallet_factory: wallet_factory(&rig),
        config: StakepooldConfig {
            reconnect_interval_secs: 3600,
            ..rig.config.clone()
        },
        fee_policy: Arc::new(NullFeePolicy::accepting()),
        state: Arc::new(PoolState::default()),
    });
    let controller = ShutdownController::new();
    let mut shutdown = controller.subscribe();

    let running = supervisor.clone();
    let task = tokio::spawn(async move { running.run(&mut shutdown).await });

    // The refused node puts the supervisor into its reconnect wait.
    tokio::time::timeout(WAIT, async {
        while supervisor.node_factory.opens() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("node was never dialled");

    controller.shutdown();
    tokio::time::timeout(WAIT, task)
        .await
        .expect("supervisor did not stop")
        .unwrap();
    assert_eq!(supervisor.node_factory.opens(), 1);
    assert_eq!(supervisor.wallet_factory.opens(), 0);
}
