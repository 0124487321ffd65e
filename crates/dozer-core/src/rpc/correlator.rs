//! Request/response correlation.
//!
//! Every call registers a pending request under a session-unique id. The
//! resolver for that request is a oneshot sender, consumed by the first
//! matching response, so a request resolves at most once. Dropping the
//! correlator drops every sender, which resolves the outstanding calls as
//! abandoned, so a request also resolves at least once.

use super::envelope::{RpcRequest, RpcResponse};
use super::error::{RpcError, RpcResult};
use crate::error::InputError;
use crate::transport::{OutgoingRequest, TransportOutcome};
use futures::channel::oneshot;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
pub(crate) use std::time::Instant;
#[cfg(target_arch = "wasm32")]
pub(crate) use web_time::Instant;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

struct PendingRequest {
    method: String,
    issued_at: Instant,
    resolver: oneshot::Sender<RpcResult<Value>>,
}

impl PendingRequest {
    fn resolve(self, id: &str, result: RpcResult<Value>) {
        match &result {
            Ok(value) => log::debug!("jsonrpc[{}]: result from {}: {}", id, self.method, value),
            Err(error) => log::debug!("jsonrpc[{}]: error from {}: {}", id, self.method, error),
        }
        // The caller may have dropped its handle; nothing is waiting then.
        let _ = self.resolver.send(result);
    }
}

/// Tracks outstanding requests and routes responses to them.
pub struct Correlator {
    next_id: u64,
    pending: HashMap<String, PendingRequest>,
    timeout: Option<Duration>,
}

impl Correlator {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { next_id: 0, pending: HashMap::new(), timeout }
    }

    /// Register a new request and serialize its envelope.
    ///
    /// Fails synchronously, registering nothing, if the method is empty or
    /// the params are not a JSON object.
    pub fn begin(
        &mut self,
        method: &str,
        params: Value,
    ) -> Result<(OutgoingRequest, PendingCall), InputError> {
        if method.is_empty() {
            return Err(InputError::EmptyMethod);
        }
        if !params.is_object() {
            return Err(InputError::ParamsNotObject { method: method.to_string() });
        }

        let id = format!("{}_{}", method, self.next_id);
        let request = RpcRequest::new(method, params, id.clone());
        let body = serde_json::to_string(&request).map_err(|e| InputError::Encode {
            method: method.to_string(),
            reason: e.to_string(),
        })?;
        self.next_id += 1;

        let (resolver, rx) = oneshot::channel();
        self.pending.insert(
            id.clone(),
            PendingRequest { method: method.to_string(), issued_at: Instant::now(), resolver },
        );

        let outgoing = OutgoingRequest { id: id.clone(), method: method.to_string(), body };
        Ok((outgoing, PendingCall::new(id, method.to_string(), rx)))
    }

    /// Resolve the request sent under `request_id` with a transport outcome.
    ///
    /// Returns `false` if no such request is pending (already resolved,
    /// expired, or never issued).
    pub fn complete(&mut self, request_id: &str, outcome: TransportOutcome) -> bool {
        let Some(pending) = self.pending.remove(request_id) else {
            log::warn!("jsonrpc[{}]: completion for unknown request dropped", request_id);
            return false;
        };
        let result = classify(request_id, outcome);
        pending.resolve(request_id, result);
        true
    }

    /// Route a raw response body by its echoed id.
    ///
    /// A response that matches no pending request is reported back as a
    /// protocol error and leaves every pending request untouched.
    pub fn dispatch(&mut self, body: &str) -> Result<(), RpcError> {
        let response: RpcResponse = serde_json::from_str(body).map_err(|e| {
            log::warn!("jsonrpc: undecodable response dropped: {}", e);
            RpcError::transport(e.to_string())
        })?;

        let Some(id) = response.echoed_id().map(str::to_string) else {
            return Err(RpcError::id_mismatch(None, response.id.as_ref()));
        };
        let Some(pending) = self.pending.remove(&id) else {
            log::warn!("jsonrpc[{}]: response matches no pending request", id);
            return Err(RpcError::id_mismatch(None, response.id.as_ref()));
        };

        pending.resolve(&id, classify_response(&id, response));
        Ok(())
    }

    /// Resolve every request issued at least `timeout` before `now` with a
    /// timeout error. Returns how many expired.
    pub fn expire_overdue(&mut self, now: Instant) -> usize {
        let Some(timeout) = self.timeout else {
            return 0;
        };

        let overdue: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, p)| now.saturating_duration_since(p.issued_at) >= timeout)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &overdue {
            if let Some(pending) = self.pending.remove(id) {
                log::warn!("jsonrpc[{}]: {} timed out after {:?}", id, pending.method, timeout);
                pending.resolve(id, Err(RpcError::timeout()));
            }
        }
        overdue.len()
    }

    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new(Some(DEFAULT_TIMEOUT))
    }
}

/// Classify a transport outcome for the request sent under `expected_id`.
pub fn classify(expected_id: &str, outcome: TransportOutcome) -> RpcResult<Value> {
    match outcome {
        TransportOutcome::Failed { status: Some(status), .. } => Err(RpcError::transport(status)),
        TransportOutcome::Failed { status: None, reason } => Err(RpcError::transport(reason)),
        TransportOutcome::Delivered { status, .. } if !(200..300).contains(&status) => {
            Err(RpcError::transport(status))
        }
        TransportOutcome::Delivered { status, body } => match serde_json::from_str(&body) {
            Ok(response) => classify_response(expected_id, response),
            Err(e) => {
                log::debug!("jsonrpc[{}]: malformed body: {}", expected_id, e);
                Err(RpcError::transport(status))
            }
        },
    }
}

/// Classify a decoded envelope for the request sent under `expected_id`.
pub fn classify_response(expected_id: &str, response: RpcResponse) -> RpcResult<Value> {
    if response.echoed_id() != Some(expected_id) {
        return Err(RpcError::id_mismatch(Some(expected_id), response.id.as_ref()));
    }
    match (response.result, response.error) {
        (Some(result), _) => Ok(result),
        (None, Some(error)) => Err(RpcError::from_error_member(error)),
        (None, None) => Err(RpcError::malformed_response()),
    }
}

/// Handle to one outstanding call.
///
/// Either poll it with [`try_take`](Self::try_take) from an event loop, or
/// `.await` it.
pub struct PendingCall {
    id: String,
    method: String,
    rx: oneshot::Receiver<RpcResult<Value>>,
    settled: bool,
}

impl PendingCall {
    fn new(id: String, method: String, rx: oneshot::Receiver<RpcResult<Value>>) -> Self {
        Self { id, method, rx, settled: false }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Take the result if the call has resolved. Yields `Some` exactly once.
    pub fn try_take(&mut self) -> Option<RpcResult<Value>> {
        if self.settled {
            return None;
        }
        let result = match self.rx.try_recv() {
            Ok(Some(result)) => result,
            Ok(None) => return None,
            Err(oneshot::Canceled) => Err(RpcError::abandoned()),
        };
        self.settled = true;
        Some(result)
    }
}

impl Future for PendingCall {
    type Output = RpcResult<Value>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(result) => {
                this.settled = true;
                Poll::Ready(result.unwrap_or_else(|oneshot::Canceled| Err(RpcError::abandoned())))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl std::fmt::Debug for PendingCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCall")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("settled", &self.settled)
            .finish()
    }
}
