//! The normalized remote error shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Network or HTTP failure, including timeouts and malformed bodies.
pub const TRANSPORT_FAILURE: i64 = -32000;
pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// Result of a remote call.
pub type RpcResult<T> = Result<T, RpcError>;

/// Where an [`RpcError`] came from, derived from its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a usable HTTP response.
    Transport,
    /// The response envelope was malformed or mismatched.
    Protocol,
    /// The server reported a business error.
    Application,
}

/// Application error codes reported by the Dozer server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerErrorCode {
    Generic,
    LoginDenied,
    Filesystem,
    PermissionDenied,
    FileNotFound,
    InvalidPathName,
    FilesystemConsistency,
    InvalidParameter,
}

impl ServerErrorCode {
    pub fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            1 => Self::Generic,
            2 => Self::LoginDenied,
            3 => Self::Filesystem,
            4 => Self::PermissionDenied,
            5 => Self::FileNotFound,
            6 => Self::InvalidPathName,
            7 => Self::FilesystemConsistency,
            8 => Self::InvalidParameter,
            _ => return None,
        })
    }
}

/// A JSON-RPC error object.
///
/// Transport and protocol failures detected locally use the same shape as
/// errors reported by the server, so callers handle one error path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("JSON-RPC error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }

    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// No usable response: network error, bad status or unparseable body.
    pub fn transport(data: impl Into<Value>) -> Self {
        Self::new(TRANSPORT_FAILURE, "transport failure").with_data(data)
    }

    pub fn timeout() -> Self {
        Self::transport("timeout")
    }

    /// The request was dropped before any response was applied.
    pub fn abandoned() -> Self {
        Self::transport("abandoned")
    }

    pub fn id_mismatch(expected: Option<&str>, echoed: Option<&Value>) -> Self {
        Self::new(INTERNAL_ERROR, "id mismatch").with_data(serde_json::json!({
            "expected": expected,
            "echoed": echoed,
        }))
    }

    pub fn malformed_response() -> Self {
        Self::new(INTERNAL_ERROR, "malformed response")
    }

    /// Interpret an `error` member of a response envelope.
    ///
    /// An object that does not carry `code` and `message` is kept as the
    /// data of a malformed-response error.
    pub fn from_error_member(member: Value) -> Self {
        match serde_json::from_value::<RpcError>(member.clone()) {
            Ok(error) => error,
            Err(_) => Self::malformed_response().with_data(member),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.code {
            TRANSPORT_FAILURE => ErrorKind::Transport,
            -32768..=-32000 => ErrorKind::Protocol,
            _ => ErrorKind::Application,
        }
    }

    pub fn server_code(&self) -> Option<ServerErrorCode> {
        ServerErrorCode::from_code(self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kinds() {
        assert_eq!(RpcError::transport(502).kind(), ErrorKind::Transport);
        assert_eq!(RpcError::malformed_response().kind(), ErrorKind::Protocol);
        assert_eq!(RpcError::new(METHOD_NOT_FOUND, "nope").kind(), ErrorKind::Protocol);
        assert_eq!(RpcError::new(6, "Invalid path name").kind(), ErrorKind::Application);
    }

    #[test]
    fn test_server_codes() {
        let error = RpcError::new(5, "File not found");
        assert_eq!(error.server_code(), Some(ServerErrorCode::FileNotFound));
        assert_eq!(RpcError::timeout().server_code(), None);
    }

    #[test]
    fn test_error_member_verbatim() {
        let member = json!({"code": 4, "message": "Permission denied", "data": {"node": "/a"}});
        let error = RpcError::from_error_member(member);
        assert_eq!(error.code, 4);
        assert_eq!(error.message, "Permission denied");
        assert_eq!(error.data, Some(json!({"node": "/a"})));
    }

    #[test]
    fn test_error_member_without_shape() {
        let error = RpcError::from_error_member(json!("boom"));
        assert_eq!(error.code, INTERNAL_ERROR);
        assert_eq!(error.data, Some(json!("boom")));
    }

    #[test]
    fn test_serialize_omits_missing_data() {
        let text = serde_json::to_string(&RpcError::new(1, "x")).unwrap();
        assert_eq!(text, r#"{"code":1,"message":"x"}"#);
    }
}
