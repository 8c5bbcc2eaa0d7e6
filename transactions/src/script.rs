//! Ticket output scripts.
//!
//! A ticket pays its stake to output 0 (tagged `OP_SSTX`) and records one
//! commitment per contributor in the odd outputs. A commitment is an
//! `OP_RETURN` carrying 30 bytes: the reward hash160, an 8-byte amount whose
//! top bit marks a script-hash address, and two bytes of fee limits.

use stakepool_types::AddressKind;

use crate::MsgTx;

pub const OP_RETURN: u8 = 0x6a;
pub const OP_DATA_30: u8 = 0x1e;
pub const OP_SSTX: u8 = 0xba;

const COMMITMENT_SCRIPT_LEN: usize = 32;
const P2SH_FLAG: u64 = 1 << 63;

/// A decoded ticket commitment output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Commitment {
    pub hash160: [u8; 20],
    pub kind: AddressKind,
    pub amount: i64,
}

/// Parse a commitment script. Returns `None` if `script` is not one.
pub fn parse_commitment(script: &[u8]) -> Option<Commitment> {
    if script.len() != COMMITMENT_SCRIPT_LEN || script[0] != OP_RETURN || script[1] != OP_DATA_30
    {
        return None;
    }
    let mut hash160 = [0u8; 20];
    hash160.copy_from_slice(&script[2..22]);
    let mut raw_amount = [0u8; 8];
    raw_amount.copy_from_slice(&script[22..30]);
    let raw_amount = u64::from_le_bytes(raw_amount);

    let kind = if raw_amount & P2SH_FLAG != 0 {
        AddressKind::ScriptHash
    } else {
        AddressKind::PubKeyHash
    };
    Some(Commitment {
        hash160,
        kind,
        amount: (raw_amount & !P2SH_FLAG) as i64,
    })
}

/// Build a commitment script.
pub fn commitment_script(commitment: &Commitment, fee_limits: u16) -> Vec<u8> {
    let mut raw_amount = commitment.amount as u64 & !P2SH_FLAG;
    if commitment.kind == AddressKind::ScriptHash {
        raw_amount |= P2SH_FLAG;
    }
    let mut script = Vec::with_capacity(COMMITMENT_SCRIPT_LEN);
    script.push(OP_RETURN);
    script.push(OP_DATA_30);
    script.extend_from_slice(&commitment.hash160);
    script.extend_from_slice(&raw_amount.to_le_bytes());
    script.extend_from_slice(&fee_limits.to_le_bytes());
    script
}

impl MsgTx {
    /// Whether output 0 is a stake submission.
    pub fn is_ticket(&self) -> bool {
        self.outputs
            .first()
            .and_then(|out| out.pk_script.first())
            .is_some_and(|op| *op == OP_SSTX)
    }

    /// Ticket price, i.e. the value of the stake submission output.
    pub fn ticket_price(&self) -> Option<i64> {
        self.is_ticket().then(|| self.outputs[0].value)
    }

    /// Commitments in output order, paired with their output index.
    /// A malformed odd output yields `Err(index)`.
    pub fn ticket_commitments(&self) -> Vec<Result<(usize, Commitment), usize>> {
        self.outputs
            .iter()
            .enumerate()
            .filter(|(i, _)| i % 2 == 1)
            .map(|(i, out)| parse_commitment(&out.pk_script).map(|c| (i, c)).ok_or(i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_script_round_trip() {
        let c = Commitment {
            hash160: [4u8; 20],
            kind: AddressKind::ScriptHash,
            amount: 12_345,
        };
        let script = commitment_script(&c, 0x5800);
        assert_eq!(script.len(), 32);
        assert_eq!(parse_commitment(&script), Some(c));
    }

    #[test]
    fn non_commitment_scripts_are_rejected() {
        assert_eq!(parse_commitment(&[OP_RETURN, OP_DATA_30]), None);
        let mut script = commitment_script(
            &Commitment {
                hash160: [0u8; 20],
                kind: AddressKind::PubKeyHash,
                amount: 1,
            },
            0,
        );
        script[0] = 0x76;
        assert_eq!(parse_commitment(&script), None);
    }
}
