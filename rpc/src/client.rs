//! Websocket JSON-RPC client.
//!
//! One socket carries every request. A writer task drains an outbound
//! queue; a reader task matches responses to waiters by id and hands
//! notifications (responses without an id) to the [`NotificationHandlers`].

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, AUTHORIZATION};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, Connector};
use tracing::{debug, trace, warn};

use crate::{ConnConfig, NotificationHandlers, PendingResponse, RpcError};

type Waiter = oneshot::Sender<Result<Value, RpcError>>;

#[derive(Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: &'a [Value],
    id: u64,
}

#[derive(Deserialize)]
struct Incoming {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Vec<Value>>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ServerError>,
}

#[derive(Deserialize)]
struct ServerError {
    code: i64,
    message: String,
}

struct Shared {
    pending: Mutex<HashMap<u64, Waiter>>,
    handlers: NotificationHandlers,
    disconnected: AtomicBool,
}

impl Shared {
    fn pending(&self) -> MutexGuard<'_, HashMap<u64, Waiter>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark the connection dead and fail every in-flight request.
    fn fail_all(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
        let waiters: Vec<Waiter> = self.pending().drain().map(|(_, w)| w).collect();
        for waiter in waiters {
            let _ = waiter.send(Err(RpcError::Disconnected));
        }
    }

    fn handle_text(&self, text: &str) {
        let incoming: Incoming = match serde_json::from_str(text) {
            Ok(incoming) => incoming,
            Err(e) => {
                warn!(error = %e, "unparseable message from server");
                return;
            }
        };

        match incoming.id {
            Some(id) => {
                let Some(waiter) = self.pending().remove(&id) else {
                    debug!(id, "response for unknown request");
                    return;
                };
                let result = match incoming.error {
                    Some(err) => Err(RpcError::Server {
                        code: err.code,
                        message: err.message,
                    }),
                    None => Ok(incoming.result.unwrap_or(Value::Null)),
                };
                let _ = waiter.send(result);
            }
            None => {
                let Some(method) = incoming.method else {
                    debug!("server message without id or method");
                    return;
                };
                let params = incoming.params.unwrap_or_default();
                if let Err(e) = self.handlers.dispatch(&method, &params) {
                    warn!(method = %method, error = %e, "bad notification");
                }
            }
        }
    }
}

/// A dispatched request's slot in the pending map, released when its
/// caller stops waiting.
pub(crate) struct InFlight {
    shared: Weak<Shared>,
    id: u64,
}

impl InFlight {
    pub(crate) fn forget(self) {
        if let Some(shared) = self.shared.upgrade() {
            if shared.pending().remove(&self.id).is_some() {
                debug!(id = self.id, "abandoned request after deadline");
            }
        }
    }
}

/// A connected websocket RPC session.
pub struct RpcClient {
    host: String,
    next_id: AtomicU64,
    outbound: mpsc::UnboundedSender<Message>,
    shared: Arc<Shared>,
    request_timeout: Option<Duration>,
    reader: JoinHandle<()>,
}

impl RpcClient {
    /// Open the socket, subscribe to the notifications `handlers` wants and
    /// fire its connected callback.
    pub async fn connect(
        config: &ConnConfig,
        handlers: NotificationHandlers,
    ) -> Result<Self, RpcError> {
        let url = config.url();
        let invalid = |reason: String| RpcError::InvalidEndpoint {
            url: url.clone(),
            reason,
        };

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| invalid(e.to_string()))?;
        let auth = HeaderValue::from_str(&config.basic_auth()).map_err(|e| invalid(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, auth);

        let connector = if config.disable_tls {
            Connector::Plain
        } else {
            Connector::Rustls(Arc::new(config.tls_config()?))
        };

        let (socket, _response) = connect_async_tls_with_config(request, None, false, Some(connector))
            .await
            .map_err(|e| RpcError::WebSocket(e.to_string()))?;
        debug!(host = %config.host, "websocket established");

        let (sink, stream) = socket.split();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            pending: Mutex::new(HashMap::new()),
            handlers,
            disconnected: AtomicBool::new(false),
        });

        tokio::spawn(write_loop(sink, outbound_rx, shared.clone()));
        let reader = tokio::spawn(read_loop(stream, shared.clone()));

        let client = Self {
            host: config.host.clone(),
            next_id: AtomicU64::new(1),
            outbound,
            shared,
            request_timeout: config.request_timeout,
            reader,
        };

        if client.shared.handlers.wants_blocks() {
            client.call::<()>("notifyblocks", Vec::new()).await?;
        }
        if client.shared.handlers.wants_winning_tickets() {
            client.call::<()>("notifywinningtickets", Vec::new()).await?;
        }
        client.shared.handlers.client_connected();
        Ok(client)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn is_disconnected(&self) -> bool {
        self.shared.disconnected.load(Ordering::SeqCst)
    }

    /// Put a request on the wire and return a handle to its response.
    pub fn send_request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> PendingResponse<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = match serde_json::to_string(&Request {
            jsonrpc: "1.0",
            method,
            params: &params,
            id,
        }) {
            Ok(body) => body,
            Err(e) => return PendingResponse::failed(RpcError::Decode(e.to_string())),
        };

        let (tx, rx) = oneshot::channel();
        self.shared.pending().insert(id, tx);
        // A disconnect may have drained the map between the insert and here.
        if self.is_disconnected() || self.outbound.send(Message::Text(body)).is_err() {
            self.shared.pending().remove(&id);
            return PendingResponse::failed(RpcError::Disconnected);
        }
        trace!(method, id, "request dispatched");
        let in_flight = InFlight {
            shared: Arc::downgrade(&self.shared),
            id,
        };
        PendingResponse::waiting(rx, self.request_timeout, Some(in_flight))
    }

    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, RpcError> {
        self.send_request(method, params).receive().await
    }

    /// Close the socket. Outstanding requests fail with
    /// [`RpcError::Disconnected`].
    pub fn shutdown(&self) {
        let _ = self.outbound.send(Message::Close(None));
        self.shared.fail_all();
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        // The writer exits on its own once the outbound sender is gone.
        self.reader.abort();
    }
}

async fn write_loop<S>(mut sink: S, mut rx: mpsc::UnboundedReceiver<Message>, shared: Arc<Shared>)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    while let Some(message) = rx.recv().await {
        let closing = matches!(message, Message::Close(_));
        if let Err(e) = sink.send(message).await {
            warn!(error = %e, "websocket send failed");
            break;
        }
        if closing {
            break;
        }
    }
    shared.fail_all();
}

async fn read_loop<S, E>(mut stream: S, shared: Arc<Shared>)
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => shared.handle_text(&text),
            Ok(Message::Close(frame)) => {
                debug!(?frame, "server closed the connection");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "websocket receive failed");
                break;
            }
        }
    }
    shared.fail_all();
}
