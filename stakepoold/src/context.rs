//! Shared application state.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use stakepool_rpc::{NodeRpc, WalletRpc};
use stakepool_transactions::FeePolicy;
use stakepool_types::{ChainHash, NetworkId, UserVotingConfigMap};

use crate::tickets::WalletTickets;

/// Ticket hash → multisig voting address of the owning user.
pub type TicketOwners = HashMap<ChainHash, String>;

/// The result of the most recent reconciliation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketSnapshot {
    pub height: i64,
    pub tickets: WalletTickets,
}

/// Pool state that outlives any one pair of RPC sessions.
///
/// Locks are held only for copies and swaps; nothing awaits while holding
/// one.
#[derive(Debug, Default)]
pub struct PoolState {
    user_voting_config: RwLock<UserVotingConfigMap>,
    added_low_fee_tickets: RwLock<TicketOwners>,
    latest: RwLock<Option<TicketSnapshot>>,
}

impl PoolState {
    pub fn new(user_voting_config: UserVotingConfigMap, added_low_fee_tickets: TicketOwners) -> Self {
        Self {
            user_voting_config: RwLock::new(user_voting_config),
            added_low_fee_tickets: RwLock::new(added_low_fee_tickets),
            latest: RwLock::new(None),
        }
    }

    /// Copy of the voting configuration, taken under the read lock.
    pub fn user_voting_config_snapshot(&self) -> UserVotingConfigMap {
        self.user_voting_config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Hashes of the tickets already flagged as low fee.
    pub fn added_low_fee_snapshot(&self) -> HashSet<ChainHash> {
        self.added_low_fee_tickets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    pub fn replace_user_voting_config(&self, config: UserVotingConfigMap) {
        *self
            .user_voting_config
            .write()
            .unwrap_or_else(PoisonError::into_inner) = config;
    }

    pub fn replace_added_low_fee_tickets(&self, tickets: TicketOwners) {
        *self
            .added_low_fee_tickets
            .write()
            .unwrap_or_else(PoisonError::into_inner) = tickets;
    }

    pub fn publish(&self, snapshot: TicketSnapshot) {
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }

    pub fn latest(&self) -> Option<TicketSnapshot> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Everything a reconciliation pass needs: the live sessions, the fee
/// policy and the shared pool state.
#[derive(Clone)]
pub struct AppContext {
    pub node: Arc<dyn NodeRpc>,
    pub wallet: Arc<dyn WalletRpc>,
    pub fee_policy: Arc<dyn FeePolicy>,
    pub network: NetworkId,
    pub state: Arc<PoolState>,
}

impl AppContext {
    pub fn new(
        node: Arc<dyn NodeRpc>,
        wallet: Arc<dyn WalletRpc>,
        fee_policy: Arc<dyn FeePolicy>,
        network: NetworkId,
        state: Arc<PoolState>,
    ) -> Self {
        Self {
            node,
            wallet,
            fee_policy,
            network,
            state,
        }
    }
}
