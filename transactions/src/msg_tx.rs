//! Raw transaction codec.
//!
//! Wallet RPC returns transactions in their full serialisation: a prefix
//! (inputs, outputs, lock time, expiry) followed by a witness section with
//! one entry per input. Only that serialisation type is accepted here.

use stakepool_types::ChainHash;

use crate::TxDecodeError;

/// Serialisation type carried in the upper 16 bits of the version field.
pub const TX_SER_FULL: u16 = 0;

const MIN_TX_IN_PREFIX_SIZE: usize = 32 + 4 + 1 + 4;
const MIN_TX_OUT_SIZE: usize = 8 + 2 + 1;
const MIN_TX_IN_WITNESS_SIZE: usize = 8 + 4 + 4 + 1;

/// Reference to a previous output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutPoint {
    pub hash: ChainHash,
    pub index: u32,
    pub tree: i8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxIn {
    pub previous_out_point: OutPoint,
    pub sequence: u32,
    pub value_in: i64,
    pub block_height: u32,
    pub block_index: u32,
    pub signature_script: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOut {
    pub value: i64,
    pub version: u16,
    pub pk_script: Vec<u8>,
}

/// A decoded transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgTx {
    pub version: u16,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
    pub expiry: u32,
}

impl MsgTx {
    /// Decode the hex string returned by `gettransaction`.
    pub fn from_hex(s: &str) -> Result<Self, TxDecodeError> {
        let bytes = hex::decode(s.trim()).map_err(|e| TxDecodeError::Hex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TxDecodeError> {
        let mut r = Reader::new(bytes);

        let raw_version = r.u32()?;
        let version = (raw_version & 0xffff) as u16;
        let ser_type = (raw_version >> 16) as u16;
        if ser_type != TX_SER_FULL {
            return Err(TxDecodeError::UnsupportedSerType(ser_type));
        }

        let in_count = r.count("input", MIN_TX_IN_PREFIX_SIZE)?;
        let mut prefixes = Vec::with_capacity(in_count);
        for _ in 0..in_count {
            let mut hash = [0u8; 32];
            hash.copy_from_slice(r.take(32)?);
            let index = r.u32()?;
            let tree = r.u8()? as i8;
            let sequence = r.u32()?;
            prefixes.push((
                OutPoint {
                    hash: ChainHash::new(hash),
                    index,
                    tree,
                },
                sequence,
            ));
        }

        let out_count = r.count("output", MIN_TX_OUT_SIZE)?;
        let mut outputs = Vec::with_capacity(out_count);
        for _ in 0..out_count {
            let value = r.i64()?;
            let version = r.u16()?;
            let pk_script = r.var_bytes()?;
            outputs.push(TxOut {
                value,
                version,
                pk_script,
            });
        }

        let lock_time = r.u32()?;
        let expiry = r.u32()?;

        let witness_count = r.count("witness", MIN_TX_IN_WITNESS_SIZE)?;
        if witness_count != in_count {
            return Err(TxDecodeError::WitnessMismatch {
                prefix: in_count,
                witness: witness_count,
            });
        }
        let mut inputs = Vec::with_capacity(in_count);
        for (previous_out_point, sequence) in prefixes {
            let value_in = r.i64()?;
            let block_height = r.u32()?;
            let block_index = r.u32()?;
            let signature_script = r.var_bytes()?;
            inputs.push(TxIn {
                previous_out_point,
                sequence,
                value_in,
                block_height,
                block_index,
                signature_script,
            });
        }

        if r.remaining() != 0 {
            return Err(TxDecodeError::TrailingBytes(r.remaining()));
        }

        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time,
            expiry,
        })
    }

    /// Encode in the full serialisation.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(self.version as u32 | (TX_SER_FULL as u32) << 16).to_le_bytes());

        write_var_int(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            out.extend_from_slice(input.previous_out_point.hash.as_bytes());
            out.extend_from_slice(&input.previous_out_point.index.to_le_bytes());
            out.push(input.previous_out_point.tree as u8);
            out.extend_from_slice(&input.sequence.to_le_bytes());
        }

        write_var_int(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            out.extend_from_slice(&output.value.to_le_bytes());
            out.extend_from_slice(&output.version.to_le_bytes());
            write_var_int(&mut out, output.pk_script.len() as u64);
            out.extend_from_slice(&output.pk_script);
        }

        out.extend_from_slice(&self.lock_time.to_le_bytes());
        out.extend_from_slice(&self.expiry.to_le_bytes());

        write_var_int(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            out.extend_from_slice(&input.value_in.to_le_bytes());
            out.extend_from_slice(&input.block_height.to_le_bytes());
            out.extend_from_slice(&input.block_index.to_le_bytes());
            write_var_int(&mut out, input.signature_script.len() as u64);
            out.extend_from_slice(&input.signature_script);
        }
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

fn write_var_int(out: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], TxDecodeError> {
        if self.remaining() < n {
            return Err(TxDecodeError::UnexpectedEof {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], TxDecodeError> {
        let mut arr = [0u8; N];
        arr.copy_from_slice(self.take(N)?);
        Ok(arr)
    }

    fn u8(&mut self) -> Result<u8, TxDecodeError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, TxDecodeError> {
        self.array().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Result<u32, TxDecodeError> {
        self.array().map(u32::from_le_bytes)
    }

    fn i64(&mut self) -> Result<i64, TxDecodeError> {
        self.array().map(i64::from_le_bytes)
    }

    fn var_int(&mut self) -> Result<u64, TxDecodeError> {
        let start = self.pos;
        let (value, min) = match self.u8()? {
            0xfd => (self.u16()? as u64, 0xfd),
            0xfe => (self.u32()? as u64, 0x1_0000),
            0xff => (self.array().map(u64::from_le_bytes)?, 0x1_0000_0000),
            b => return Ok(b as u64),
        };
        if value < min {
            return Err(TxDecodeError::NonCanonicalVarInt(start));
        }
        Ok(value)
    }

    /// Read an item count, rejecting counts the remaining bytes cannot hold.
    fn count(&mut self, what: &'static str, min_item_size: usize) -> Result<usize, TxDecodeError> {
        let count = self.var_int()?;
        let remaining = self.remaining();
        if count > (remaining / min_item_size) as u64 {
            return Err(TxDecodeError::TooManyItems {
                what,
                count,
                remaining,
            });
        }
        Ok(count as usize)
    }

    fn var_bytes(&mut self) -> Result<Vec<u8>, TxDecodeError> {
        let len = self.var_int()?;
        if len > self.remaining() as u64 {
            return Err(TxDecodeError::UnexpectedEof {
                offset: self.pos,
                needed: (len - self.remaining() as u64) as usize,
            });
        }
        Ok(self.take(len as usize)?.to_vec())
    }
}
