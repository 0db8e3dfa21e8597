//! JSON-RPC 2.0 message types

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::tools::ToolError;

pub const JSONRPC_VERSION: &str = "2.0";

/// Code for errors raised by a tool
pub const TOOL_ERROR: i32 = -32000;

/// JSON-RPC request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,

    pub method: String,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,

    /// Absent ids are treated as null
    #[serde(default)]
    pub id: Value,
}

impl RpcRequest {
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: id.into(),
        }
    }
}

/// JSON-RPC response; exactly one of `result` and `error` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,

    pub id: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Parse error (-32700)
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(-32700, message)
    }

    /// Invalid request (-32600)
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(-32600, message)
    }

    /// Method not found (-32601)
    pub fn method_not_found(method: &str) -> Self {
        Self::new(-32601, format!("Method not found: {}", method))
    }

    /// Invalid params (-32602)
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(-32602, message)
    }

    /// Tool failure (-32000), message verbatim, kind in `data`
    pub fn tool_error(tool: &str, err: &ToolError) -> Self {
        Self {
            code: TOOL_ERROR,
            message: err.to_string(),
            data: Some(json!({ "kind": err.kind(), "tool": tool })),
        }
    }

    /// The `data.kind` of a tool error
    pub fn kind(&self) -> Option<&str> {
        self.data.as_ref()?.get("kind")?.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionError;

    #[test]
    fn test_request_without_id_or_params() {
        let req: RpcRequest = serde_json::from_str(r#"{"jsonrpc":"2.0","method":"tools/list"}"#).unwrap();
        assert_eq!(req.id, Value::Null);
        assert_eq!(req.params, Value::Null);
    }

    #[test]
    fn test_success_omits_error() {
        let resp = RpcResponse::success(json!(7), json!({"ok": true}));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "id": 7, "result": {"ok": true}}));
    }

    #[test]
    fn test_error_keeps_null_id() {
        let resp = RpcResponse::error(Value::Null, RpcError::parse_error("Parse error"));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": "Parse error"}})
        );
    }

    #[test]
    fn test_tool_error_carries_kind() {
        let err: ToolError = SessionError::NotFound("ghost".into()).into();
        let rpc = RpcError::tool_error("get_next_step", &err);
        assert_eq!(rpc.code, TOOL_ERROR);
        assert_eq!(rpc.message, "Plan not found: ghost");
        assert_eq!(rpc.kind(), Some("not_found"));
        assert_eq!(rpc.data.unwrap()["tool"], "get_next_step");
    }

    #[test]
    fn test_method_not_found_message() {
        let err = RpcError::method_not_found("resources/list");
        assert_eq!(err.code, -32601);
        assert_eq!(err.message, "Method not found: resources/list");
        assert_eq!(err.kind(), None);
    }
}
