//! Fundamental types for the stake pool daemon.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! chain hashes, stake addresses, network parameters, advertised API versions and the
//! per-user voting configuration.

pub mod address;
pub mod error;
pub mod hash;
pub mod network;
pub mod semver;
pub mod voting;

pub use address::{AddressKind, StakeAddress};
pub use error::TypesError;
pub use hash::ChainHash;
pub use network::{NetworkId, SubsidyParams};
pub use semver::{semver_compatible, SemVer};
pub use voting::{UserVotingConfig, UserVotingConfigMap};
