//! Transports carry serialized requests to the server and report completions.
//!
//! A transport never resolves requests itself. It is polled from the single
//! control-flow thread and hands back raw [`Completion`]s, which the
//! correlator classifies and routes.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod http;

#[cfg(target_arch = "wasm32")]
mod fetch;

pub use memory::LoopbackTransport;

#[cfg(not(target_arch = "wasm32"))]
pub use http::HttpTransport;

#[cfg(target_arch = "wasm32")]
pub use fetch::FetchTransport;

use thiserror::Error;

/// Platform-specific transport type alias.
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformTransport = HttpTransport;

/// Platform-specific transport type alias.
#[cfg(target_arch = "wasm32")]
pub type PlatformTransport = FetchTransport;

/// A serialized request ready to be posted.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    pub id: String,
    pub method: String,
    pub body: String,
}

/// What happened to one posted request.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportOutcome {
    /// An HTTP response arrived. The body has not been inspected yet.
    Delivered { status: u16, body: String },
    /// No response arrived.
    Failed { status: Option<u16>, reason: String },
}

/// A finished request, tagged with the id it was sent under.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub request_id: String,
    pub outcome: TransportOutcome,
}

/// Something that can post requests and report their completions.
pub trait Transport {
    /// Post a request. Must not block the caller.
    fn send(&mut self, request: OutgoingRequest);

    /// Drain completions that arrived since the last poll (non-blocking).
    fn poll_completions(&mut self) -> Vec<Completion>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, request: OutgoingRequest) {
        (**self).send(request)
    }

    fn poll_completions(&mut self) -> Vec<Completion> {
        (**self).poll_completions()
    }
}

/// Transport construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportSetupError {
    #[error("Invalid endpoint URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Unsupported endpoint scheme: {0}")]
    UnsupportedScheme(String),
}
