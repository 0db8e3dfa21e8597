//! Tool trait definition

use async_trait::async_trait;
use serde_json::Value;

use super::{ToolContext, ToolError};

/// A named operation exposed through `tools/call`
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches the `name` of a `tools/call` request)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Execute the tool, returning the text shown to the caller
    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult;
}

/// Result of a tool execution
pub type ToolResult = Result<String, ToolError>;
