//! Ticket reconciliation.
//!
//! One pass lists the wallet's tickets, fetches every ticket transaction
//! (all requests go out before the first answer is read), finds the pool
//! user each ticket belongs to and decides whether it may vote.
//!
//! Both maps are keyed by ticket hash and hold the owning user's multisig
//! voting address. A ticket ends up in exactly one of two maps, or in neither:
//! - `live`: already flagged as low fee by an operator, or paid the pool fee;
//! - `ignored_low_fee`: did not pay the pool fee.
//!
//! Tickets no pool user owns and tickets that fail any per-ticket step are
//! left out and logged. A failure to list tickets yields two empty maps.

use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn, Instrument};

use stakepool_rpc::{GetTransactionResult, PendingResponse, RpcError};
use stakepool_transactions::{MsgTx, TxDecodeError};
use stakepool_types::{ChainHash, StakeAddress, TypesError, UserVotingConfigMap};

use crate::context::{AppContext, TicketOwners};
use crate::height_cache::BlockHeightCache;
use crate::tracing_spans::reconcile_span;

/// Output of one reconciliation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WalletTickets {
    pub ignored_low_fee: TicketOwners,
    pub live: TicketOwners,
}

impl WalletTickets {
    fn insert(&mut self, ticket: ChainHash, owner: String, live: bool) {
        let (target, other) = if live {
            (&mut self.live, &mut self.ignored_low_fee)
        } else {
            (&mut self.ignored_low_fee, &mut self.live)
        };
        other.remove(&ticket);
        target.insert(ticket, owner);
    }
}

/// Why a single ticket was left out of the pass.
#[derive(Debug, Error)]
enum TicketSkip {
    #[error("unable to fetch ticket transaction: {0}")]
    Fetch(RpcError),

    #[error("no output pays a known pool user")]
    NoOwner,

    #[error("invalid owner address {address}: {source}")]
    OwnerAddress { address: String, source: TypesError },

    #[error("invalid ticket hash {txid}: {source}")]
    TicketHash { txid: String, source: TypesError },

    #[error("unable to decode ticket transaction: {0}")]
    Transaction(TxDecodeError),

    #[error("invalid purchase block hash {hash}: {source}")]
    BlockHash { hash: String, source: TypesError },

    #[error("unable to resolve purchase block height: {0}")]
    Height(RpcError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Route {
    AlreadyFlagged,
    NormalFee,
    LowFee,
}

struct Classified {
    ticket: ChainHash,
    owner: String,
    route: Route,
}

/// Figures for the end-of-pass summary line.
#[derive(Debug, Default, PartialEq, Eq)]
struct PassCounts {
    /// Size of the whole already-flagged set.
    added_low_fee: usize,
    /// Already-flagged tickets this pass found in the wallet.
    already_flagged_seen: usize,
    ignored_low_fee: usize,
    normal_fee: usize,
    total: usize,
}

/// Reconcile the wallet's tickets against the pool's users and fee rules.
///
/// `current_height` only labels the pass in logs.
pub async fn wallet_get_tickets(ctx: &AppContext, current_height: i64) -> WalletTickets {
    let (tickets, _) = reconcile(ctx)
        .instrument(reconcile_span(current_height))
        .await;
    tickets
}

async fn reconcile(ctx: &AppContext) -> (WalletTickets, PassCounts) {
    let voting = ctx.state.user_voting_config_snapshot();
    let already_flagged = ctx.state.added_low_fee_snapshot();
    let mut counts = PassCounts {
        added_low_fee: already_flagged.len(),
        ..PassCounts::default()
    };

    let listed = match ctx.wallet.get_tickets(false).await {
        Ok(hashes) => hashes,
        Err(e) => {
            warn!(error = %e, "unable to list wallet tickets");
            return (WalletTickets::default(), counts);
        }
    };

    let responses: Vec<PendingResponse<GetTransactionResult>> = listed
        .iter()
        .map(|hash| ctx.wallet.get_transaction_async(hash))
        .collect();

    let total = listed.len();
    counts.total = total;
    let mut heights = BlockHeightCache::new(ctx.node.as_ref());
    let mut tickets = WalletTickets::default();

    for (i, (hash, response)) in listed.iter().zip(responses).enumerate() {
        debug!(ticket = %hash, "receiving result for ticket {}/{}", i + 1, total);

        let classified = match response.receive().await {
            Ok(tx) => classify(ctx, &voting, &already_flagged, &mut heights, tx).await,
            Err(e) => Err(TicketSkip::Fetch(e)),
        };
        let Classified {
            ticket,
            owner,
            route,
        } = match classified {
            Ok(classified) => classified,
            Err(TicketSkip::NoOwner) => {
                debug!(ticket = %hash, "ticket not owned by a pool user");
                continue;
            }
            Err(reason) => {
                warn!(ticket = %hash, reason = %reason, "skipping ticket");
                continue;
            }
        };

        match route {
            Route::AlreadyFlagged => counts.already_flagged_seen += 1,
            Route::NormalFee => counts.normal_fee += 1,
            Route::LowFee => {
                info!(ticket = %ticket, owner = %owner, "ignoring ticket with insufficient pool fee");
                counts.ignored_low_fee += 1;
            }
        }
        tickets.insert(ticket, owner, route != Route::LowFee);
    }

    info!(
        added_low_fee = counts.added_low_fee,
        already_flagged_seen = counts.already_flagged_seen,
        ignored_low_fee = counts.ignored_low_fee,
        normal_fee = counts.normal_fee,
        live = tickets.live.len(),
        total,
        "tickets loaded"
    );
    (tickets, counts)
}

async fn classify(
    ctx: &AppContext,
    voting: &UserVotingConfigMap,
    already_flagged: &HashSet<ChainHash>,
    heights: &mut BlockHeightCache<'_>,
    tx: GetTransactionResult,
) -> Result<Classified, TicketSkip> {
    // Only the first detail naming a pool user counts. If its address does
    // not decode, later details are not consulted.
    let (address, user) = tx
        .details
        .iter()
        .find_map(|detail| {
            voting
                .get(&detail.address)
                .map(|user| (detail.address.as_str(), user))
        })
        .ok_or(TicketSkip::NoOwner)?;
    let owner = user.multisig_address.clone();

    let owner_address = StakeAddress::decode(address, ctx.network).map_err(|source| {
        TicketSkip::OwnerAddress {
            address: address.to_string(),
            source,
        }
    })?;
    let ticket: ChainHash = tx.txid.parse().map_err(|source| TicketSkip::TicketHash {
        txid: tx.txid.clone(),
        source,
    })?;

    if already_flagged.contains(&ticket) {
        return Ok(Classified {
            ticket,
            owner,
            route: Route::AlreadyFlagged,
        });
    }

    let msg_tx = MsgTx::from_hex(&tx.hex).map_err(TicketSkip::Transaction)?;
    let block_hash: ChainHash = tx.block_hash.parse().map_err(|source| TicketSkip::BlockHash {
        hash: tx.block_hash.clone(),
        source,
    })?;
    let purchase_height = heights
        .resolve(&block_hash)
        .await
        .map_err(TicketSkip::Height)?;

    let evaluation = ctx
        .fee_policy
        .evaluate(&msg_tx, purchase_height, &owner_address);
    match (&evaluation.diagnostic, evaluation.valid) {
        (Some(reason), true) => {
            warn!(ticket = %ticket, reason = %reason, "fee policy accepted ticket despite a diagnostic")
        }
        (Some(reason), false) => debug!(ticket = %ticket, reason = %reason, "fee policy rejected ticket"),
        (None, _) => {}
    }

    Ok(Classified {
        ticket,
        owner,
        route: if evaluation.valid {
            Route::NormalFee
        } else {
            Route::LowFee
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use stakepool_nullables::{ticket_transaction, NullFeePolicy, NullNode, NullWallet};
    use stakepool_types::{AddressKind, NetworkId, UserVotingConfig};

    use crate::context::PoolState;

    fn address(n: u8) -> String {
        StakeAddress::from_hash160([n; 20], AddressKind::ScriptHash, NetworkId::Simnet).to_string()
    }

    #[tokio::test]
    async fn summary_counts_whole_flagged_set() {
        let owner = address(1);
        let seen = ChainHash::new([0xa1; 32]);
        let absent = ChainHash::new([0xa2; 32]);
        let block = ChainHash::new([0xb0; 32]);

        let wallet = NullWallet::new().with_ticket(
            seen,
            ticket_transaction(&seen, &block, String::new(), &[owner.as_str()]),
        );
        let voting: UserVotingConfigMap = [(
            owner.clone(),
            UserVotingConfig {
                user_id: 1,
                multisig_address: owner.clone(),
                vote_bits: 1,
                vote_bits_version: 0,
            },
        )]
        .into_iter()
        .collect();
        let flagged: TicketOwners = [(seen, owner.clone()), (absent, owner.clone())]
            .into_iter()
            .collect();
        let ctx = AppContext::new(
            Arc::new(NullNode::new()),
            Arc::new(wallet),
            Arc::new(NullFeePolicy::accepting()),
            NetworkId::Simnet,
            Arc::new(PoolState::new(voting, flagged)),
        );

        let (tickets, counts) = reconcile(&ctx).await;

        assert_eq!(tickets.live.len(), 1);
        assert_eq!(
            counts,
            PassCounts {
                added_low_fee: 2,
                already_flagged_seen: 1,
                ignored_low_fee: 0,
                normal_fee: 0,
                total: 1,
            }
        );
    }

    #[test]
    fn insert_keeps_maps_disjoint() {
        let hash = ChainHash::new([1u8; 32]);
        let mut tickets = WalletTickets::default();
        tickets.insert(hash, "a".into(), false);
        tickets.insert(hash, "a".into(), true);
        assert!(tickets.ignored_low_fee.is_empty());
        assert_eq!(tickets.live.get(&hash).map(String::as_str), Some("a"));
    }
}
