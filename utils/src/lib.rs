//! Shared utilities for the stake pool daemon.

pub mod logging;

pub use logging::{init_logging, LogFormat};
