//! Dispatcher - routes JSON-RPC methods to the tool registry

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::messages::{JSONRPC_VERSION, RpcError, RpcRequest, RpcResponse};
use crate::tools::{ToolContext, ToolRegistry};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "stepdaemon";

/// Turns request bodies into responses; cheap to clone per connection
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    ctx: ToolContext,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry, ctx: ToolContext) -> Self {
        Self {
            registry: Arc::new(registry),
            ctx,
        }
    }

    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }

    /// Handle a raw request body
    ///
    /// Bytes that are not JSON get a parse error; JSON that is not a request
    /// object gets an invalid-request error carrying its id when it has one.
    pub async fn handle_body(&self, body: &[u8]) -> RpcResponse {
        let value: Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "handle_body: body is not JSON");
                return RpcResponse::error(Value::Null, RpcError::parse_error(format!("Parse error: {}", e)));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<RpcRequest>(value) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => {
                warn!(error = %e, "handle_body: body is not a JSON-RPC request");
                RpcResponse::error(id, RpcError::invalid_request(format!("Invalid request: {}", e)))
            }
        }
    }

    /// Route a parsed request by method name
    pub async fn dispatch(&self, request: RpcRequest) -> RpcResponse {
        debug!(method = %request.method, id = %request.id, "dispatch: called");
        if request.jsonrpc != JSONRPC_VERSION {
            return RpcResponse::error(
                request.id,
                RpcError::invalid_request(format!("Unsupported jsonrpc version: {}", request.jsonrpc)),
            );
        }

        match request.method.as_str() {
            "initialize" => RpcResponse::success(request.id, self.initialize()),
            "tools/list" => RpcResponse::success(request.id, json!({ "tools": self.registry.definitions() })),
            "tools/call" => self.call_tool(request.id, &request.params).await,
            other => {
                debug!(method = %other, "dispatch: unknown method");
                RpcResponse::error(request.id, RpcError::method_not_found(other))
            }
        }
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {
                "tools": { "listChanged": true }
            }
        })
    }

    async fn call_tool(&self, id: Value, params: &Value) -> RpcResponse {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return RpcResponse::error(id, RpcError::invalid_params("Missing tool name"));
        };

        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => json!({}),
            Some(args) if args.is_object() => args.clone(),
            Some(_) => return RpcResponse::error(id, RpcError::invalid_params("arguments must be an object")),
        };

        match self.registry.invoke(name, arguments, &self.ctx).await {
            Ok(text) => {
                info!(tool = %name, "Tool call succeeded");
                RpcResponse::success(id, json!({ "content": [{ "type": "text", "text": text }] }))
            }
            Err(e) => {
                info!(tool = %name, kind = e.kind(), error = %e, "Tool call failed");
                RpcResponse::error(id, RpcError::tool_error(name, &e))
            }
        }
    }
}
