//! Per-user voting configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Voting preferences of one pool user.
///
/// The pool keys these by the address the wallet reports in a ticket's
/// transaction details. Reconciliation records `multisig_address`, the
/// address the pool votes from, as the ticket's owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserVotingConfig {
    pub user_id: i64,
    pub multisig_address: String,
    #[serde(default = "default_vote_bits")]
    pub vote_bits: u16,
    #[serde(default)]
    pub vote_bits_version: u32,
}

fn default_vote_bits() -> u16 {
    1
}

/// Map from the address a ticket pays to, to the owning user's voting
/// configuration.
pub type UserVotingConfigMap = HashMap<String, UserVotingConfig>;
