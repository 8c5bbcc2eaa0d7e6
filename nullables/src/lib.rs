//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator of the daemon (node RPC, wallet RPC, the
//! session factory and the fee policy) is abstracted behind a trait. This
//! crate provides in-memory implementations that:
//! - Return scripted values
//! - Record how they were called
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod fee_policy;
pub mod node;
pub mod session;
pub mod wallet;

pub use fee_policy::NullFeePolicy;
pub use node::{block_header_hex, NullNode};
pub use session::{NullSession, NullSessionFactory};
pub use wallet::{ticket_transaction, NullWallet};
