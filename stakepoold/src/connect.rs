//! Establishing the node and wallet RPC sessions.
//!
//! Both flows read the server certificate, open a websocket session and
//! check the advertised API version. They differ only in what a version
//! mismatch means: an incompatible node is refused, an incompatible wallet
//! is used anyway with a warning.

use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn, Instrument};

use stakepool_rpc::{
    ConnConfig, NotificationHandlers, RpcSession, SessionFactory, NODE_API_COMPONENT,
    WALLET_API_COMPONENT,
};
use stakepool_types::{semver_compatible, NetworkId, SemVer};

use crate::config::RpcEndpointConfig;
use crate::tracing_spans::rpc_connect_span;
use crate::{ConnectError, StakepooldConfig};

/// Node JSON-RPC API version the pool is written against.
pub const REQUIRED_CHAIN_SERVER_API: SemVer = SemVer::new(5, 0, 0);
/// Wallet JSON-RPC API version the pool is written against.
pub const REQUIRED_WALLET_API: SemVer = SemVer::new(5, 0, 0);

/// Settings shared by both connect flows.
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionOptions {
    pub disable_tls: bool,
    pub request_timeout: Option<Duration>,
}

impl SessionOptions {
    pub fn from_config(config: &StakepooldConfig) -> Self {
        Self {
            disable_tls: config.disable_tls,
            request_timeout: config.rpc_timeout(),
        }
    }
}

/// Which server a connect flow talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Service {
    Node,
    Wallet,
}

impl Service {
    fn name(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Wallet => "wallet",
        }
    }

    fn component(self) -> &'static str {
        match self {
            Self::Node => NODE_API_COMPONENT,
            Self::Wallet => WALLET_API_COMPONENT,
        }
    }

    fn default_port(self, network: NetworkId) -> u16 {
        match self {
            Self::Node => network.default_node_rpc_port(),
            Self::Wallet => network.default_wallet_rpc_port(),
        }
    }
}

/// Connect to the node and require a compatible API version.
///
/// On a mismatch the session is shut down and
/// [`ConnectError::IncompatibleNode`] is returned.
pub async fn connect_node_rpc<F: SessionFactory>(
    factory: &F,
    endpoint: &RpcEndpointConfig,
    network: NetworkId,
    options: SessionOptions,
    handlers: NotificationHandlers,
) -> Result<(F::Session, SemVer), ConnectError> {
    let host = endpoint.host_or_default(Service::Node.default_port(network));
    let span = rpc_connect_span(Service::Node.name(), &host);
    async move {
        let (session, version) =
            open_session(factory, Service::Node, &host, endpoint, options, handlers).await?;

        if !semver_compatible(REQUIRED_CHAIN_SERVER_API, version) {
            error!(
                advertised = %version,
                required = %REQUIRED_CHAIN_SERVER_API,
                "node JSON-RPC server does not have a compatible API version"
            );
            session.shutdown();
            return Err(ConnectError::IncompatibleNode {
                advertised: version,
                required: REQUIRED_CHAIN_SERVER_API,
            });
        }
        Ok((session, version))
    }
    .instrument(span)
    .await
}

/// Connect to the wallet. An incompatible API version is only logged.
pub async fn connect_wallet_rpc<F: SessionFactory>(
    factory: &F,
    endpoint: &RpcEndpointConfig,
    network: NetworkId,
    options: SessionOptions,
    handlers: NotificationHandlers,
) -> Result<(F::Session, SemVer), ConnectError> {
    let host = endpoint.host_or_default(Service::Wallet.default_port(network));
    let span = rpc_connect_span(Service::Wallet.name(), &host);
    async move {
        let (session, version) =
            open_session(factory, Service::Wallet, &host, endpoint, options, handlers).await?;

        if !semver_compatible(REQUIRED_WALLET_API, version) {
            warn!(
                advertised = %version,
                required = %REQUIRED_WALLET_API,
                "wallet JSON-RPC server does not have a compatible API version"
            );
        }
        Ok((session, version))
    }
    .instrument(span)
    .await
}

async fn open_session<F: SessionFactory>(
    factory: &F,
    service: Service,
    host: &str,
    endpoint: &RpcEndpointConfig,
    options: SessionOptions,
    handlers: NotificationHandlers,
) -> Result<(F::Session, SemVer), ConnectError> {
    let certificates = read_certificate(&endpoint.cert).await?;

    info!(
        host = %host,
        user = %endpoint.user,
        cert = %endpoint.cert.display(),
        "attempting to connect to {} RPC",
        service.name()
    );

    let config = ConnConfig {
        host: host.to_string(),
        endpoint: "ws".to_string(),
        user: endpoint.user.clone(),
        pass: endpoint.password.clone(),
        certificates,
        disable_tls: options.disable_tls,
        request_timeout: options.request_timeout,
    };

    let session = factory.open(&config, handlers).await.map_err(|source| {
        match service {
            Service::Node => error!(error = %source, "failed to connect to node RPC"),
            Service::Wallet => error!(
                error = %source,
                "failed to connect to wallet RPC. Verify that the user and password are \
                 correct and that the certificate is the wallet's"
            ),
        }
        ConnectError::Open {
            host: host.to_string(),
            source,
        }
    })?;

    let versions = match session.version().await {
        Ok(versions) => versions,
        Err(source) => {
            error!(error = %source, "unable to get {} RPC version", service.name());
            session.shutdown();
            return Err(ConnectError::Version {
                component: service.component(),
                source,
            });
        }
    };

    // A server that omits its component is treated as version 0.0.0,
    // which no required version accepts.
    let version = versions
        .get(service.component())
        .map(|v| v.semver())
        .unwrap_or_default();
    info!(version = %version, "connected to {} RPC", service.name());
    Ok((session, version))
}

async fn read_certificate(path: &Path) -> Result<Vec<u8>, ConnectError> {
    tokio::fs::read(path).await.map_err(|source| {
        error!(path = %path.display(), error = %source, "unable to read RPC certificate");
        ConnectError::CertRead {
            path: path.to_path_buf(),
            source,
        }
    })
}
