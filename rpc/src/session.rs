//! Session abstraction shared by the node and wallet connections.

use async_trait::async_trait;

use crate::{ConnConfig, NotificationHandlers, RpcClient, RpcError, VersionMap};

/// An open RPC session.
#[async_trait]
pub trait RpcSession: Send + Sync {
    fn host(&self) -> &str;

    /// `version`: API versions keyed by component name.
    async fn version(&self) -> Result<VersionMap, RpcError>;

    /// Whether the connection is gone, locally or remotely.
    fn is_disconnected(&self) -> bool;

    /// Close the session. Idempotent.
    fn shutdown(&self);
}

/// Opens sessions. Production code uses [`WsSessionFactory`].
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: RpcSession + 'static;

    async fn open(
        &self,
        config: &ConnConfig,
        handlers: NotificationHandlers,
    ) -> Result<Self::Session, RpcError>;
}

/// Opens websocket sessions with [`RpcClient::connect`].
#[derive(Clone, Copy, Debug, Default)]
pub struct WsSessionFactory;

#[async_trait]
impl SessionFactory for WsSessionFactory {
    type Session = RpcClient;

    async fn open(
        &self,
        config: &ConnConfig,
        handlers: NotificationHandlers,
    ) -> Result<RpcClient, RpcError> {
        RpcClient::connect(config, handlers).await
    }
}

#[async_trait]
impl RpcSession for RpcClient {
    fn host(&self) -> &str {
        RpcClient::host(self)
    }

    async fn version(&self) -> Result<VersionMap, RpcError> {
        self.call("version", Vec::new()).await
    }

    fn is_disconnected(&self) -> bool {
        RpcClient::is_disconnected(self)
    }

    fn shutdown(&self) {
        RpcClient::shutdown(self)
    }
}
