//! Decode errors shared across crates.

use thiserror::Error;

/// Errors produced when parsing the string forms of chain types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("invalid hash length: expected 64 hex characters, got {0}")]
    HashLength(usize),

    #[error("invalid hash hex: {0}")]
    HashHex(String),

    #[error("invalid address encoding: {0}")]
    AddressEncoding(String),

    #[error("invalid address length: expected {expected} bytes, got {got}")]
    AddressLength { expected: usize, got: usize },

    #[error("address {address} is not for the {network} network")]
    WrongNetwork { address: String, network: &'static str },

    #[error("unknown network {0:?}, expected mainnet, testnet or simnet")]
    UnknownNetwork(String),

    #[error("invalid version string: {0}")]
    Version(String),
}
