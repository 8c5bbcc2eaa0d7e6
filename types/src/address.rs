//! Base58 stake addresses.

use std::fmt;

use crate::{NetworkId, TypesError};

/// Decoded payload length: network id (2) + hash160 (20) + checksum (4).
const DECODED_LEN: usize = 26;

/// The kind of script an address pays to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressKind {
    PubKeyHash,
    ScriptHash,
}

/// A decoded address, keeping its original string form.
///
/// Decoding checks the base58 alphabet, the payload length and that the
/// network id belongs to the expected network. Checksum verification is
/// left to the wallet, which only ever hands out addresses it produced.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StakeAddress {
    encoded: String,
    kind: AddressKind,
    hash160: [u8; 20],
}

impl StakeAddress {
    /// Decode an address string for `network`.
    pub fn decode(s: &str, network: NetworkId) -> Result<Self, TypesError> {
        let raw = bs58::decode(s)
            .into_vec()
            .map_err(|e| TypesError::AddressEncoding(e.to_string()))?;
        if raw.len() != DECODED_LEN {
            return Err(TypesError::AddressLength {
                expected: DECODED_LEN,
                got: raw.len(),
            });
        }

        let net_id = [raw[0], raw[1]];
        let kind = if net_id == network.pubkey_hash_addr_id() {
            AddressKind::PubKeyHash
        } else if net_id == network.script_hash_addr_id() {
            AddressKind::ScriptHash
        } else {
            return Err(TypesError::WrongNetwork {
                address: s.to_string(),
                network: network.as_str(),
            });
        };

        let mut hash160 = [0u8; 20];
        hash160.copy_from_slice(&raw[2..22]);
        Ok(Self {
            encoded: s.to_string(),
            kind,
            hash160,
        })
    }

    /// Encode a hash160 as an address on `network`. The checksum bytes are
    /// zero-filled, which is enough for round-tripping through [`decode`].
    ///
    /// [`decode`]: StakeAddress::decode
    pub fn from_hash160(hash160: [u8; 20], kind: AddressKind, network: NetworkId) -> Self {
        let net_id = match kind {
            AddressKind::PubKeyHash => network.pubkey_hash_addr_id(),
            AddressKind::ScriptHash => network.script_hash_addr_id(),
        };
        let mut raw = Vec::with_capacity(DECODED_LEN);
        raw.extend_from_slice(&net_id);
        raw.extend_from_slice(&hash160);
        raw.extend_from_slice(&[0u8; 4]);
        Self {
            encoded: bs58::encode(raw).into_string(),
            kind,
            hash160,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    pub fn hash160(&self) -> &[u8; 20] {
        &self.hash160
    }
}

impl fmt::Display for StakeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}
