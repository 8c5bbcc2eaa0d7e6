//! Raw transactions as the wallet returns them, ticket commitment scripts and
//! the pool fee policy evaluated against them.

pub mod error;
pub mod fees;
pub mod msg_tx;
pub mod script;

pub use error::{FeeError, TxDecodeError};
pub use fees::{stake_pool_ticket_fee, CommitmentFeePolicy, FeeEvaluation, FeePolicy};
pub use msg_tx::{MsgTx, OutPoint, TxIn, TxOut};
pub use script::{commitment_script, parse_commitment, Commitment, OP_SSTX};
