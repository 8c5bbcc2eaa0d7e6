use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxDecodeError {
    #[error("invalid transaction hex: {0}")]
    Hex(String),

    #[error("unexpected end of data at offset {offset}: need {needed} more bytes")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("non-canonical varint at offset {0}")]
    NonCanonicalVarInt(usize),

    #[error("unsupported serialization type {0}")]
    UnsupportedSerType(u16),

    #[error("{what} count {count} exceeds what {remaining} remaining bytes can hold")]
    TooManyItems {
        what: &'static str,
        count: u64,
        remaining: usize,
    },

    #[error("witness count {witness} does not match input count {prefix}")]
    WitnessMismatch { prefix: usize, witness: usize },

    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    #[error("transaction is not a ticket")]
    NotATicket,

    #[error("malformed commitment in output {0}")]
    MalformedCommitment(usize),

    #[error("commitment hash160 {0} is not a pool fee address")]
    UnknownFeeAddress(String),

    #[error("{0} overflow the atom range")]
    AmountOverflow(&'static str),

    #[error("ticket for {user} commits {have} atoms in pool fees, {need} required")]
    InsufficientFee { user: String, have: i64, need: i64 },
}
