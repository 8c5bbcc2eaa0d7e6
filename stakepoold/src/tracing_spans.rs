//! Pre-built [`tracing::Span`] constructors for daemon operations.
//!
//! Using consistent span names and field sets makes it easy to filter and
//! correlate log lines belonging to one connect attempt or one pass.

use tracing::{info_span, Span};

/// Span covering one node or wallet connect flow.
pub fn rpc_connect_span(service: &str, host: &str) -> Span {
    info_span!("rpc_connect", service = %service, host = %host)
}

/// Span covering a single ticket reconciliation pass.
pub fn reconcile_span(height: i64) -> Span {
    info_span!("reconcile", height = height)
}

/// Span covering the handling of one block-connected notification.
pub fn block_connected_span(height: u32) -> Span {
    info_span!("block_connected", height = height)
}
