//! JSON-RPC 2.0 request and response envelopes.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// An outgoing request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
    pub id: String,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Value, id: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: id.into(),
        }
    }
}

/// An incoming response envelope.
///
/// `result` distinguishes an absent member from an explicit `null`: a null
/// result is still a successful response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl RpcResponse {
    pub fn success(id: &str, result: Value) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id: Some(Value::String(id.to_string())),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: &str, error: &crate::rpc::RpcError) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id: Some(Value::String(id.to_string())),
            result: None,
            error: serde_json::to_value(error).ok(),
        }
    }

    /// The echoed id, when it is a string.
    pub fn echoed_id(&self) -> Option<&str> {
        self.id.as_ref().and_then(Value::as_str)
    }
}

fn deserialize_present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(d).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let request = RpcRequest::new("dozer.create_note", json!({"notepage_name": "/page1"}), "dozer.create_note_0");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "method": "dozer.create_note",
                "params": {"notepage_name": "/page1"},
                "id": "dozer.create_note_0",
            })
        );
    }

    #[test]
    fn test_null_result_is_present() {
        let response: RpcResponse = serde_json::from_str(r#"{"id":"a_0","result":null}"#).unwrap();
        assert_eq!(response.result, Some(Value::Null));
        assert_eq!(response.echoed_id(), Some("a_0"));

        let response: RpcResponse = serde_json::from_str(r#"{"id":"a_0"}"#).unwrap();
        assert_eq!(response.result, None);
        assert_eq!(response.error, None);
    }

    #[test]
    fn test_numeric_id_is_not_a_string_id() {
        let response: RpcResponse = serde_json::from_str(r#"{"id":3,"result":1}"#).unwrap();
        assert_eq!(response.echoed_id(), None);
    }
}
