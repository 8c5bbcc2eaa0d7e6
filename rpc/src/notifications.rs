//! Server-pushed notifications and the callbacks that receive them.

use serde_json::Value;
use std::fmt;

use stakepool_types::ChainHash;

use crate::RpcError;

/// Byte offset of the height field in a serialized block header.
const HEADER_HEIGHT_OFFSET: usize = 128;

/// `blockconnected` / `blockdisconnected` payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockConnected {
    pub header: Vec<u8>,
}

impl BlockConnected {
    /// Height encoded in the serialized header.
    pub fn height(&self) -> Option<u32> {
        let bytes = self
            .header
            .get(HEADER_HEIGHT_OFFSET..HEADER_HEIGHT_OFFSET + 4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        Some(u32::from_le_bytes(raw))
    }

    fn from_params(params: &[Value]) -> Result<Self, RpcError> {
        let header_hex = params
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::Decode("block notification without header".into()))?;
        let header = hex::decode(header_hex).map_err(|e| RpcError::Decode(e.to_string()))?;
        Ok(Self { header })
    }
}

/// `winningtickets` payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WinningTickets {
    pub block_hash: ChainHash,
    pub block_height: i64,
    pub tickets: Vec<ChainHash>,
}

impl WinningTickets {
    fn from_params(params: &[Value]) -> Result<Self, RpcError> {
        let decode = |v: &Value| -> Result<ChainHash, RpcError> {
            v.as_str()
                .ok_or_else(|| RpcError::Decode("expected hash string".into()))?
                .parse()
                .map_err(|e: stakepool_types::TypesError| RpcError::Decode(e.to_string()))
        };

        let block_hash = decode(params.first().unwrap_or(&Value::Null))?;
        let block_height = params
            .get(1)
            .and_then(Value::as_i64)
            .ok_or_else(|| RpcError::Decode("winningtickets without height".into()))?;
        // Tickets arrive keyed by their index in the lottery.
        let tickets = match params.get(2) {
            Some(Value::Object(map)) => map.values().map(decode).collect::<Result<_, _>>()?,
            Some(Value::Array(list)) => list.iter().map(decode).collect::<Result<_, _>>()?,
            _ => Vec::new(),
        };
        Ok(Self {
            block_hash,
            block_height,
            tickets,
        })
    }
}

type Callback<T> = Box<dyn Fn(T) + Send + Sync>;

/// Callbacks invoked by the client's reader task.
///
/// Registering a block or winning-ticket callback makes the client
/// subscribe to that notification stream when it connects.
#[derive(Default)]
pub struct NotificationHandlers {
    on_client_connected: Option<Box<dyn Fn() + Send + Sync>>,
    on_block_connected: Option<Callback<BlockConnected>>,
    on_block_disconnected: Option<Callback<BlockConnected>>,
    on_winning_tickets: Option<Callback<WinningTickets>>,
    on_unknown: Option<Box<dyn Fn(&str, &[Value]) + Send + Sync>>,
}

impl NotificationHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_client_connected(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_client_connected = Some(Box::new(f));
        self
    }

    pub fn on_block_connected(mut self, f: impl Fn(BlockConnected) + Send + Sync + 'static) -> Self {
        self.on_block_connected = Some(Box::new(f));
        self
    }

    pub fn on_block_disconnected(
        mut self,
        f: impl Fn(BlockConnected) + Send + Sync + 'static,
    ) -> Self {
        self.on_block_disconnected = Some(Box::new(f));
        self
    }

    pub fn on_winning_tickets(mut self, f: impl Fn(WinningTickets) + Send + Sync + 'static) -> Self {
        self.on_winning_tickets = Some(Box::new(f));
        self
    }

    pub fn on_unknown(mut self, f: impl Fn(&str, &[Value]) + Send + Sync + 'static) -> Self {
        self.on_unknown = Some(Box::new(f));
        self
    }

    pub fn wants_blocks(&self) -> bool {
        self.on_block_connected.is_some() || self.on_block_disconnected.is_some()
    }

    pub fn wants_winning_tickets(&self) -> bool {
        self.on_winning_tickets.is_some()
    }

    /// Fire the connected callback.
    pub fn client_connected(&self) {
        if let Some(f) = &self.on_client_connected {
            f();
        }
    }

    /// Route one notification to its callback.
    pub fn dispatch(&self, method: &str, params: &[Value]) -> Result<(), RpcError> {
        match method {
            "blockconnected" => {
                if let Some(f) = &self.on_block_connected {
                    f(BlockConnected::from_params(params)?);
                }
            }
            "blockdisconnected" => {
                if let Some(f) = &self.on_block_disconnected {
                    f(BlockConnected::from_params(params)?);
                }
            }
            "winningtickets" => {
                if let Some(f) = &self.on_winning_tickets {
                    f(WinningTickets::from_params(params)?);
                }
            }
            other => {
                if let Some(f) = &self.on_unknown {
                    f(other, params);
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for NotificationHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationHandlers")
            .field("client_connected", &self.on_client_connected.is_some())
            .field("block_connected", &self.on_block_connected.is_some())
            .field("block_disconnected", &self.on_block_disconnected.is_some())
            .field("winning_tickets", &self.on_winning_tickets.is_some())
            .field("unknown", &self.on_unknown.is_some())
            .finish()
    }
}
