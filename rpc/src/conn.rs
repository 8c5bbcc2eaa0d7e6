//! Connection parameters for one websocket RPC session.

use rustls::pki_types::CertificateDer;
use rustls::{ClientConfig, RootCertStore};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::RpcError;

/// Everything needed to open an authenticated websocket to a node or wallet.
#[derive(Clone)]
pub struct ConnConfig {
    /// `host:port` of the RPC server.
    pub host: String,
    /// Path component of the websocket URL.
    pub endpoint: String,
    pub user: String,
    pub pass: String,
    /// PEM bytes of the certificate(s) the server presents.
    pub certificates: Vec<u8>,
    pub disable_tls: bool,
    /// Per-request deadline. `None` waits for as long as the connection lives.
    pub request_timeout: Option<Duration>,
}

impl ConnConfig {
    pub fn new(host: impl Into<String>, user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            endpoint: "ws".to_string(),
            user: user.into(),
            pass: pass.into(),
            certificates: Vec::new(),
            disable_tls: false,
            request_timeout: None,
        }
    }

    pub fn url(&self) -> String {
        let scheme = if self.disable_tls { "ws" } else { "wss" };
        format!("{}://{}/{}", scheme, self.host, self.endpoint)
    }

    /// Value of the `Authorization` header.
    pub fn basic_auth(&self) -> String {
        let credentials = format!("{}:{}", self.user, self.pass);
        format!("Basic {}", base64::encode(credentials))
    }

    /// TLS configuration trusting exactly the configured certificates.
    pub fn tls_config(&self) -> Result<ClientConfig, RpcError> {
        let mut reader = self.certificates.as_slice();
        let certs = rustls_pemfile::certs(&mut reader)
            .collect::<Result<Vec<CertificateDer<'static>>, _>>()
            .map_err(|e| RpcError::Certificate(e.to_string()))?;
        if certs.is_empty() {
            return Err(RpcError::Certificate("no PEM certificate found".into()));
        }

        let mut roots = RootCertStore::empty();
        for cert in certs {
            roots
                .add(cert)
                .map_err(|e| RpcError::Certificate(e.to_string()))?;
        }

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| RpcError::Certificate(e.to_string()))?
            .with_root_certificates(roots)
            .with_no_client_auth();
        Ok(config)
    }
}

impl fmt::Debug for ConnConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnConfig")
            .field("host", &self.host)
            .field("endpoint", &self.endpoint)
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .field("certificates", &self.certificates.len())
            .field("disable_tls", &self.disable_tls)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
