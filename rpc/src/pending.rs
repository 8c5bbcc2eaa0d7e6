//! Responses to requests that were dispatched but not yet awaited.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::client::InFlight;
use crate::RpcError;

enum PendingState {
    Waiting {
        rx: oneshot::Receiver<Result<Value, RpcError>>,
        deadline: Option<(Instant, Duration)>,
        in_flight: Option<InFlight>,
    },
    Ready(Result<Value, RpcError>),
}

/// The eventual result of a dispatched request.
///
/// The request is already on the wire when this is created; [`receive`]
/// only waits for the answer. Creating many of these before receiving any
/// pipelines the requests over one connection.
///
/// [`receive`]: PendingResponse::receive
pub struct PendingResponse<T> {
    state: PendingState,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> PendingResponse<T> {
    pub(crate) fn waiting(
        rx: oneshot::Receiver<Result<Value, RpcError>>,
        timeout: Option<Duration>,
        in_flight: Option<InFlight>,
    ) -> Self {
        Self {
            state: PendingState::Waiting {
                rx,
                deadline: timeout.map(|d| (Instant::now() + d, d)),
                in_flight,
            },
            _marker: PhantomData,
        }
    }

    /// A response that is already known, as raw JSON.
    pub fn ready(value: Value) -> Self {
        Self {
            state: PendingState::Ready(Ok(value)),
            _marker: PhantomData,
        }
    }

    /// A request that failed before reaching the server.
    pub fn failed(err: RpcError) -> Self {
        Self {
            state: PendingState::Ready(Err(err)),
            _marker: PhantomData,
        }
    }

    /// Wait for the response and decode it.
    ///
    /// A request whose deadline passes is dropped from the client's pending
    /// map; a late answer is then discarded as unknown.
    pub async fn receive(self) -> Result<T, RpcError> {
        let value = match self.state {
            PendingState::Ready(result) => result?,
            PendingState::Waiting {
                rx,
                deadline,
                in_flight,
            } => {
                let received = match deadline {
                    Some((at, after)) => match tokio::time::timeout_at(at, rx).await {
                        Ok(received) => received,
                        Err(_) => {
                            if let Some(in_flight) = in_flight {
                                in_flight.forget();
                            }
                            return Err(RpcError::Timeout(after));
                        }
                    },
                    None => rx.await,
                };
                received.map_err(|_| RpcError::Disconnected)??
            }
        };
        serde_json::from_value(value).map_err(|e| RpcError::Decode(e.to_string()))
    }
}

impl<T: Serialize + DeserializeOwned> PendingResponse<T> {
    /// A response built from a typed result.
    pub fn from_result(result: Result<T, RpcError>) -> Self {
        match result.and_then(|v| {
            serde_json::to_value(v).map_err(|e| RpcError::Decode(e.to_string()))
        }) {
            Ok(value) => Self::ready(value),
            Err(err) => Self::failed(err),
        }
    }
}
