//! RPC error types.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    #[error("invalid TLS certificate: {0}")]
    Certificate(String),

    #[error("invalid RPC endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("server error {code}: {message}")]
    Server { code: i64, message: String },

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("connection closed")]
    Disconnected,

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}
