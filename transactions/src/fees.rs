//! Pool fee policy for tickets.

use std::collections::HashSet;

use stakepool_types::{NetworkId, StakeAddress};

use crate::{FeeError, MsgTx};

/// Outcome of a fee evaluation.
///
/// `valid` decides the routing of the ticket. `diagnostic` explains a
/// rejection and may in principle accompany a `true` result; callers log it
/// without letting it override `valid`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeeEvaluation {
    pub valid: bool,
    pub diagnostic: Option<FeeError>,
}

impl FeeEvaluation {
    pub fn valid() -> Self {
        Self {
            valid: true,
            diagnostic: None,
        }
    }

    pub fn invalid(reason: FeeError) -> Self {
        Self {
            valid: false,
            diagnostic: Some(reason),
        }
    }
}

/// Decides whether a ticket paid the pool its fee.
pub trait FeePolicy: Send + Sync {
    fn evaluate(&self, tx: &MsgTx, purchase_height: i32, owner: &StakeAddress) -> FeeEvaluation;
}

/// Fee the pool requires for a ticket bought at `height`, in atoms.
///
/// `pool_fee` is a percentage (7.5 means 7.5%). The fee is that share of the
/// vote subsidy, weighted by how much of the ticket's return the subsidy
/// represents: `p * s * (v + z) / (s + v)` with `s` the vote subsidy, `v`
/// the ticket price and `z` the relay fee the ticket paid.
pub fn stake_pool_ticket_fee(
    stake_diff: i64,
    relay_fee: i64,
    height: i32,
    pool_fee: f64,
    network: NetworkId,
) -> i64 {
    let pool_fee_hundredths = (pool_fee * 100.0).floor() as i128;
    let subsidy = network.vote_subsidy(height as i64) as i128;
    let v = stake_diff as i128;
    let z = relay_fee as i128;

    let den = 10_000 * (subsidy + v);
    if den == 0 {
        return 0;
    }
    let fee = pool_fee_hundredths * subsidy * (v + z) / den;
    i64::try_from(fee).unwrap_or(if fee < 0 { i64::MIN } else { i64::MAX })
}

/// Checks the ticket's first commitment against the pool fee addresses.
///
/// The first commitment must pay one of the configured fee addresses and
/// commit at least [`stake_pool_ticket_fee`] for the purchase height.
pub struct CommitmentFeePolicy {
    network: NetworkId,
    pool_fee: f64,
    fee_hashes: HashSet<[u8; 20]>,
}

impl CommitmentFeePolicy {
    pub fn new(network: NetworkId, pool_fee: f64, fee_addresses: &[StakeAddress]) -> Self {
        Self {
            network,
            pool_fee,
            fee_hashes: fee_addresses.iter().map(|a| *a.hash160()).collect(),
        }
    }
}

impl FeePolicy for CommitmentFeePolicy {
    fn evaluate(&self, tx: &MsgTx, purchase_height: i32, owner: &StakeAddress) -> FeeEvaluation {
        let Some(price) = tx.ticket_price() else {
            return FeeEvaluation::invalid(FeeError::NotATicket);
        };

        let mut commitments = Vec::new();
        for entry in tx.ticket_commitments() {
            match entry {
                Ok((_, c)) => commitments.push(c),
                Err(index) => return FeeEvaluation::invalid(FeeError::MalformedCommitment(index)),
            }
        }
        let Some(pool_commitment) = commitments.first() else {
            return FeeEvaluation::invalid(FeeError::MalformedCommitment(1));
        };
        if !self.fee_hashes.contains(&pool_commitment.hash160) {
            return FeeEvaluation::invalid(FeeError::UnknownFeeAddress(hex::encode(
                pool_commitment.hash160,
            )));
        }

        let Some(committed) = commitments
            .iter()
            .try_fold(0i64, |acc, c| acc.checked_add(c.amount))
        else {
            return FeeEvaluation::invalid(FeeError::AmountOverflow("commitment amounts"));
        };
        let Some(paid_out) = tx
            .outputs
            .iter()
            .try_fold(0i64, |acc, o| acc.checked_add(o.value))
        else {
            return FeeEvaluation::invalid(FeeError::AmountOverflow("output values"));
        };
        let Some(relay_fee) = committed.checked_sub(paid_out) else {
            return FeeEvaluation::invalid(FeeError::AmountOverflow("relay fee"));
        };
        let relay_fee = relay_fee.max(0);

        let need =
            stake_pool_ticket_fee(price, relay_fee, purchase_height, self.pool_fee, self.network);
        if pool_commitment.amount < need {
            return FeeEvaluation::invalid(FeeError::InsufficientFee {
                user: owner.to_string(),
                have: pool_commitment.amount,
                need,
            });
        }

        tracing::debug!(
            user = %owner,
            committed = pool_commitment.amount,
            required = need,
            "accepted pool fee commitment"
        );
        FeeEvaluation::valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{commitment_script, Commitment, TxOut, OP_SSTX};
    use stakepool_types::AddressKind;

    const NET: NetworkId = NetworkId::Simnet;
    const PRICE: i64 = 200_000_000;
    const RELAY: i64 = 100_000;

    fn fee_address() -> StakeAddress {
        StakeAddress::from_hash160([0xfe; 20], AddressKind::PubKeyHash, NET)
    }

    fn user_address() -> StakeAddress {
        StakeAddress::from_hash160([0x11; 20], AddressKind::PubKeyHash, NET)
    }

    fn ticket(fee_hash: [u8; 20], fee_amount: i64) -> MsgTx {
        let commit = |hash160, amount| TxOut {
            value: 0,
            version: 0,
            pk_script: commitment_script(
                &Commitment {
                    hash160,
                    kind: AddressKind::PubKeyHash,
                    amount,
                },
                0,
            ),
        };
        let change = TxOut {
            value: 0,
            version: 0,
            pk_script: vec![0xbd],
        };
        MsgTx {
            version: 1,
            inputs: vec![],
            outputs: vec![
                TxOut {
                    value: PRICE,
                    version: 0,
                    pk_script: vec![OP_SSTX, 0x76],
                },
                commit(fee_hash, fee_amount),
                change.clone(),
                commit([0x11; 20], PRICE + RELAY - fee_amount),
                change,
            ],
            lock_time: 0,
            expiry: 0,
        }
    }

    fn policy() -> CommitmentFeePolicy {
        CommitmentFeePolicy::new(NET, 7.5, &[fee_address()])
    }

    #[test]
    fn required_fee_matches_formula() {
        // 750 * 3e9 * (2e8 + 1e5) / (10000 * (3e9 + 2e8))
        assert_eq!(stake_pool_ticket_fee(PRICE, RELAY, 100, 7.5, NET), 14_069_531);
    }

    #[test]
    fn sufficient_commitment_is_valid() {
        let eval = policy().evaluate(&ticket([0xfe; 20], 15_000_000), 100, &user_address());
        assert_eq!(eval, FeeEvaluation::valid());
    }

    #[test]
    fn short_commitment_is_invalid() {
        let eval = policy().evaluate(&ticket([0xfe; 20], 10_000_000), 100, &user_address());
        assert!(!eval.valid);
        assert!(matches!(
            eval.diagnostic,
            Some(FeeError::InsufficientFee { have: 10_000_000, need: 14_069_531, .. })
        ));
    }

    #[test]
    fn unknown_fee_address_is_invalid() {
        let eval = policy().evaluate(&ticket([0xaa; 20], 15_000_000), 100, &user_address());
        assert!(!eval.valid);
        assert!(matches!(eval.diagnostic, Some(FeeError::UnknownFeeAddress(_))));
    }

    #[test]
    fn overflowing_commitments_are_invalid() {
        let mut tx = ticket([0xfe; 20], 1 << 62);
        tx.outputs[3].pk_script = commitment_script(
            &Commitment {
                hash160: [0x11; 20],
                kind: AddressKind::PubKeyHash,
                amount: 1 << 62,
            },
            0,
        );
        let eval = policy().evaluate(&tx, 100, &user_address());
        assert_eq!(
            eval,
            FeeEvaluation::invalid(FeeError::AmountOverflow("commitment amounts"))
        );
    }

    #[test]
    fn overflowing_output_values_are_invalid() {
        let mut tx = ticket([0xfe; 20], 15_000_000);
        tx.outputs[2].value = i64::MAX;
        tx.outputs[4].value = i64::MAX;
        let eval = policy().evaluate(&tx, 100, &user_address());
        assert_eq!(
            eval,
            FeeEvaluation::invalid(FeeError::AmountOverflow("output values"))
        );
    }

    #[test]
    fn extreme_ticket_price_does_not_panic() {
        let fee = stake_pool_ticket_fee(i64::MAX, i64::MAX, 100, 100.0, NET);
        assert!(fee > 0);
    }

    #[test]
    fn non_ticket_is_invalid() {
        let mut tx = ticket([0xfe; 20], 15_000_000);
        tx.outputs[0].pk_script = vec![0x76];
        let eval = policy().evaluate(&tx, 100, &user_address());
        assert_eq!(eval, FeeEvaluation::invalid(FeeError::NotATicket));
    }
}
