//! JSON-RPC client: envelopes, correlation, and the polled client loop.

mod correlator;
mod envelope;
mod error;

pub use correlator::{classify, classify_response, Correlator, PendingCall, DEFAULT_TIMEOUT};
pub use envelope::{RpcRequest, RpcResponse, JSONRPC_VERSION};
pub use error::{
    ErrorKind, RpcError, RpcResult, ServerErrorCode, INTERNAL_ERROR, INVALID_PARAMS,
    INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR, TRANSPORT_FAILURE,
};

pub(crate) use correlator::Instant;

use crate::error::InputError;
use crate::transport::Transport;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// A JSON-RPC client over a polled transport.
///
/// `call` never blocks. Responses are applied when the owner calls
/// [`pump`](Self::pump) from its event loop.
pub struct RpcClient<T: Transport> {
    correlator: Correlator,
    transport: T,
}

impl<T: Transport> RpcClient<T> {
    pub fn new(transport: T, timeout: Option<Duration>) -> Self {
        Self { correlator: Correlator::new(timeout), transport }
    }

    /// Issue a call. Input errors are raised before anything is sent.
    pub fn call(&mut self, method: &str, params: Value) -> Result<PendingCall, InputError> {
        let (request, call) = self.correlator.begin(method, params)?;
        log::debug!("jsonrpc[{}]: request to {}: {}", request.id, request.method, request.body);
        self.transport.send(request);
        Ok(call)
    }

    /// Issue a call whose result decodes into `R`.
    pub fn call_typed<R: DeserializeOwned>(
        &mut self,
        method: &str,
        params: Value,
    ) -> Result<TypedCall<R>, InputError> {
        self.call(method, params).map(TypedCall::new)
    }

    /// Apply every completion the transport has collected, then expire
    /// overdue calls. Returns the number of calls resolved.
    pub fn pump(&mut self) -> usize {
        let mut resolved = 0;
        for completion in self.transport.poll_completions() {
            if self.correlator.complete(&completion.request_id, completion.outcome) {
                resolved += 1;
            }
        }
        resolved + self.correlator.expire_overdue(Instant::now())
    }

    /// Route a response body received out of band.
    pub fn dispatch(&mut self, body: &str) -> Result<(), RpcError> {
        self.correlator.dispatch(body)
    }

    pub fn outstanding(&self) -> usize {
        self.correlator.outstanding()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

/// A [`PendingCall`] whose result decodes into `R`.
///
/// A result that does not decode is reported as a malformed response.
pub struct TypedCall<R> {
    inner: PendingCall,
    _result: PhantomData<fn() -> R>,
}

impl<R: DeserializeOwned> TypedCall<R> {
    pub fn new(inner: PendingCall) -> Self {
        Self { inner, _result: PhantomData }
    }

    pub fn id(&self) -> &str {
        self.inner.id()
    }

    pub fn method(&self) -> &str {
        self.inner.method()
    }

    pub fn try_take(&mut self) -> Option<RpcResult<R>> {
        self.inner.try_take().map(decode)
    }

    pub fn into_inner(self) -> PendingCall {
        self.inner
    }
}

impl<R> std::fmt::Debug for TypedCall<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedCall")
            .field("result", &std::any::type_name::<R>())
            .field("inner", &self.inner)
            .finish()
    }
}

impl<R: DeserializeOwned> Future for TypedCall<R> {
    type Output = RpcResult<R>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().inner).poll(cx).map(decode)
    }
}

fn decode<R: DeserializeOwned>(result: RpcResult<Value>) -> RpcResult<R> {
    let value = result?;
    serde_json::from_value(value)
        .map_err(|e| RpcError::malformed_response().with_data(e.to_string()))
}
