//! Error types shared across the client.
//!
//! Remote failures (transport, protocol, application) are all normalized into
//! [`RpcError`](crate::rpc::RpcError). The types here cover failures that are
//! raised synchronously, before anything reaches the network.

use crate::config::ConfigError;
use crate::transform::{CalibrationError, MicronVec};
use thiserror::Error;

/// A caller passed a malformed argument.
///
/// Input errors are raised immediately and never reach the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Method name must not be empty")]
    EmptyMethod,
    #[error("Params for {method} must be a JSON object")]
    ParamsNotObject { method: String },
    #[error("Could not encode request for {method}: {reason}")]
    Encode { method: String, reason: String },
    #[error("{what} must name a node below the root folder")]
    RootPath { what: &'static str },
    #[error("Path contains illegal path element {element:?}: {path:?}")]
    IllegalPathElement { element: String, path: String },
    #[error("Note size must be positive, got ({}, {})", .size.x, .size.y)]
    NonPositiveSize { size: MicronVec },
    #[error("An update batch must contain at least one operation")]
    EmptyBatch,
}

/// Errors raised while opening a notepage session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Calibration failed: {0}")]
    Calibration(#[from] CalibrationError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Input(#[from] InputError),
}
