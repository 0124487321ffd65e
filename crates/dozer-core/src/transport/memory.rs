//! In-memory transport for testing and headless use.

use super::{Completion, OutgoingRequest, Transport, TransportOutcome};
use crate::rpc::{RpcError, RpcRequest, RpcResponse};
use serde_json::Value;
use std::fmt;

type Handler = Box<dyn FnMut(&RpcRequest) -> Result<Value, RpcError>>;

/// A transport that never touches the network.
///
/// Every request is recorded. Without a handler, responses are scripted by
/// the test through [`respond`](Self::respond) and friends and delivered on
/// the next poll, in whatever order they were scripted. With a handler, each
/// request is answered immediately, acting as a fake server.
#[derive(Default)]
pub struct LoopbackTransport {
    sent: Vec<OutgoingRequest>,
    ready: Vec<Completion>,
    handler: Option<Handler>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request with `handler`.
    pub fn with_handler(
        handler: impl FnMut(&RpcRequest) -> Result<Value, RpcError> + 'static,
    ) -> Self {
        Self { handler: Some(Box::new(handler)), ..Self::default() }
    }

    /// All requests sent so far, oldest first.
    pub fn sent(&self) -> &[OutgoingRequest] {
        &self.sent
    }

    /// Decode the most recent request envelope.
    pub fn last_request(&self) -> Option<RpcRequest> {
        self.sent.last().and_then(|r| serde_json::from_str(&r.body).ok())
    }

    /// Decode every request envelope sent for `method`.
    pub fn requests_for(&self, method: &str) -> Vec<RpcRequest> {
        self.sent
            .iter()
            .filter(|r| r.method == method)
            .filter_map(|r| serde_json::from_str(&r.body).ok())
            .collect()
    }

    /// Queue a raw HTTP 200 body for `request_id`.
    pub fn respond(&mut self, request_id: &str, body: impl Into<String>) {
        self.ready.push(Completion {
            request_id: request_id.to_string(),
            outcome: TransportOutcome::Delivered { status: 200, body: body.into() },
        });
    }

    /// Queue a well-formed success envelope for `request_id`.
    pub fn respond_result(&mut self, request_id: &str, result: Value) {
        let body = envelope(&RpcResponse::success(request_id, result));
        self.respond(request_id, body);
    }

    /// Queue a well-formed error envelope for `request_id`.
    pub fn respond_error(&mut self, request_id: &str, error: &RpcError) {
        let body = envelope(&RpcResponse::failure(request_id, error));
        self.respond(request_id, body);
    }

    /// Queue a transport failure for `request_id`.
    pub fn fail(&mut self, request_id: &str, status: Option<u16>, reason: &str) {
        self.ready.push(Completion {
            request_id: request_id.to_string(),
            outcome: TransportOutcome::Failed { status, reason: reason.to_string() },
        });
    }

    /// Completions queued but not yet polled.
    pub fn queued(&self) -> usize {
        self.ready.len()
    }
}

fn envelope(response: &RpcResponse) -> String {
    serde_json::to_string(response).unwrap_or_default()
}

impl Transport for LoopbackTransport {
    fn send(&mut self, request: OutgoingRequest) {
        if let Some(handler) = self.handler.as_mut() {
            let completion = match serde_json::from_str::<RpcRequest>(&request.body) {
                Ok(decoded) => {
                    let response = match handler(&decoded) {
                        Ok(result) => RpcResponse::success(&request.id, result),
                        Err(error) => RpcResponse::failure(&request.id, &error),
                    };
                    Completion {
                        request_id: request.id.clone(),
                        outcome: TransportOutcome::Delivered {
                            status: 200,
                            body: envelope(&response),
                        },
                    }
                }
                Err(e) => Completion {
                    request_id: request.id.clone(),
                    outcome: TransportOutcome::Delivered { status: 400, body: e.to_string() },
                },
            };
            self.ready.push(completion);
        }
        self.sent.push(request);
    }

    fn poll_completions(&mut self) -> Vec<Completion> {
        std::mem::take(&mut self.ready)
    }
}

impl fmt::Debug for LoopbackTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopbackTransport")
            .field("sent", &self.sent.len())
            .field("ready", &self.ready.len())
            .field("scripted", &self.handler.is_some())
            .finish()
    }
}
