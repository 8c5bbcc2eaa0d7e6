//! Network identifier and per-network chain parameters.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::TypesError;

/// Identifies which network the node and wallet serve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// The production network.
    Mainnet,
    /// The public test network.
    Testnet,
    /// Local simulation network.
    Simnet,
}

/// Parameters of the block subsidy schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubsidyParams {
    pub base_subsidy: i64,
    pub mul_subsidy: i64,
    pub div_subsidy: i64,
    pub reduction_interval: i64,
    /// Share of the block subsidy paid to voters, in tenths.
    pub stake_reward_proportion: i64,
    pub tickets_per_block: i64,
}

impl NetworkId {
    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Simnet => "simnet",
        }
    }

    /// Two-byte prefix of pay-to-pubkey-hash addresses.
    pub fn pubkey_hash_addr_id(&self) -> [u8; 2] {
        match self {
            Self::Mainnet => [0x07, 0x3f],
            Self::Testnet => [0x0f, 0x21],
            Self::Simnet => [0x0e, 0x91],
        }
    }

    /// Two-byte prefix of pay-to-script-hash addresses.
    pub fn script_hash_addr_id(&self) -> [u8; 2] {
        match self {
            Self::Mainnet => [0x07, 0x1a],
            Self::Testnet => [0x0e, 0xfc],
            Self::Simnet => [0x0e, 0x6c],
        }
    }

    /// Default node RPC port.
    pub fn default_node_rpc_port(&self) -> u16 {
        match self {
            Self::Mainnet => 9109,
            Self::Testnet => 19109,
            Self::Simnet => 19556,
        }
    }

    /// Default wallet RPC port.
    pub fn default_wallet_rpc_port(&self) -> u16 {
        match self {
            Self::Mainnet => 9110,
            Self::Testnet => 19110,
            Self::Simnet => 19557,
        }
    }

    pub fn subsidy_params(&self) -> SubsidyParams {
        match self {
            Self::Mainnet => SubsidyParams {
                base_subsidy: 3_119_582_664,
                mul_subsidy: 100,
                div_subsidy: 101,
                reduction_interval: 6144,
                stake_reward_proportion: 3,
                tickets_per_block: 5,
            },
            Self::Testnet => SubsidyParams {
                base_subsidy: 2_500_000_000,
                mul_subsidy: 100,
                div_subsidy: 101,
                reduction_interval: 2048,
                stake_reward_proportion: 3,
                tickets_per_block: 5,
            },
            Self::Simnet => SubsidyParams {
                base_subsidy: 50_000_000_000,
                mul_subsidy: 100,
                div_subsidy: 101,
                reduction_interval: 128,
                stake_reward_proportion: 3,
                tickets_per_block: 5,
            },
        }
    }

    /// Subsidy paid to a single vote in a block at `height`, in atoms.
    pub fn vote_subsidy(&self, height: i64) -> i64 {
        let p = self.subsidy_params();
        if height <= 0 {
            return 0;
        }
        let mut subsidy = p.base_subsidy;
        for _ in 0..height / p.reduction_interval {
            subsidy = subsidy * p.mul_subsidy / p.div_subsidy;
            if subsidy == 0 {
                break;
            }
        }
        subsidy * p.stake_reward_proportion / 10 / p.tickets_per_block
    }
}

impl std::fmt::Display for NetworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" | "testnet3" => Ok(Self::Testnet),
            "simnet" => Ok(Self::Simnet),
            other => Err(TypesError::UnknownNetwork(other.to_string())),
        }
    }
}
