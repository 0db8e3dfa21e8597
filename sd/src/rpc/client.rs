//! RPC client for talking to a running server
//!
//! Used by the `sd call` and `sd remote-tools` commands.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use super::messages::{RpcRequest, RpcResponse};
use crate::tools::ToolDescriptor;

/// Default timeout for RPC requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(150);

pub const DEFAULT_URL: &str = "http://127.0.0.1:5001";

/// Errors from the client side of an RPC exchange
#[derive(Debug, Error)]
pub enum RpcClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned HTTP {0}")]
    Status(u16),

    #[error("RPC error {code}: {message}")]
    Rpc {
        code: i32,
        message: String,
        kind: Option<String>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// JSON-RPC over HTTP client
#[derive(Debug, Clone)]
pub struct RpcClient {
    url: String,
    http: Client,
    next_id: Arc<AtomicU64>,
}

impl Default for RpcClient {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            url: url.into(),
            http,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one request and return its `result`
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, RpcClientError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        debug!(%id, %method, url = %self.url, "RpcClient::request: sending");

        let response = self
            .http
            .post(&self.url)
            .json(&RpcRequest::new(id, method, params))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcClientError::Status(status.as_u16()));
        }

        let body: RpcResponse = response.json().await?;
        debug!(?body, "RpcClient::request: received");

        if body.id != json!(id) {
            return Err(RpcClientError::InvalidResponse(format!(
                "Response id {} does not match request id {}",
                body.id, id
            )));
        }

        match (body.result, body.error) {
            (_, Some(err)) => Err(RpcClientError::Rpc {
                code: err.code,
                kind: err.kind().map(str::to_string),
                message: err.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(RpcClientError::InvalidResponse(
                "Response has neither result nor error".to_string(),
            )),
        }
    }

    /// Perform the `initialize` handshake
    pub async fn initialize(&self) -> Result<Value, RpcClientError> {
        self.request("initialize", json!({})).await
    }

    /// Fetch the server's tool descriptors
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, RpcClientError> {
        let result = self.request("tools/list", json!({})).await?;
        let tools = result
            .get("tools")
            .cloned()
            .ok_or_else(|| RpcClientError::InvalidResponse("tools/list result has no tools".to_string()))?;
        serde_json::from_value(tools).map_err(|e| RpcClientError::InvalidResponse(e.to_string()))
    }

    /// Call a tool and return its text content
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<String, RpcClientError> {
        let result = self
            .request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;

        let content = result
            .get("content")
            .and_then(Value::as_array)
            .ok_or_else(|| RpcClientError::InvalidResponse("tools/call result has no content".to_string()))?;

        Ok(content
            .iter()
            .filter(|c| c["type"] == "text")
            .filter_map(|c| c["text"].as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
