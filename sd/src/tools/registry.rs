//! ToolRegistry - the fixed set of tools served over RPC

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::builtin::{AddInstructionTool, CreatePlanTool, GetNextStepTool, GetPlanStatusTool, ResetPlanTool};
use super::{Tool, ToolContext, ToolError, ToolResult};
use crate::config::ToolsConfig;

/// Descriptor returned by `tools/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Registered tools plus the limits applied to every call
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl ToolRegistry {
    /// Registry with the five plan tools and default limits
    pub fn standard() -> Self {
        Self::standard_with(&ToolsConfig::default())
    }

    /// Registry with the five plan tools and the given limits
    pub fn standard_with(config: &ToolsConfig) -> Self {
        debug!(?config, "ToolRegistry::standard_with: called");
        let mut registry = Self::with_limits(config);
        registry.add_tool(Box::new(CreatePlanTool));
        registry.add_tool(Box::new(AddInstructionTool));
        registry.add_tool(Box::new(GetNextStepTool));
        registry.add_tool(Box::new(ResetPlanTool));
        registry.add_tool(Box::new(GetPlanStatusTool));
        registry
    }

    /// Empty registry with the given limits
    pub fn with_limits(config: &ToolsConfig) -> Self {
        Self {
            tools: Vec::new(),
            permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            timeout: config.timeout(),
        }
    }

    /// Register a tool; a tool with the same name is replaced in place
    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        debug!(tool_name = %tool.name(), "ToolRegistry::add_tool: called");
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(idx) => self.tools[idx] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Descriptors in registration order
    pub fn definitions(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|t| ToolDescriptor {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name() == name)
    }

    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Run a tool by name under the concurrency bound and timeout
    pub async fn invoke(&self, name: &str, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(%name, "ToolRegistry::invoke: called");
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| ToolError::UnknownTool { name: name.to_string() })?;

        let _permit = self.permits.acquire().await.map_err(|_| ToolError::Unavailable {
            name: name.to_string(),
            reason: "tool permits closed".to_string(),
        })?;

        match tokio::time::timeout(self.timeout, tool.execute(input, ctx)).await {
            Ok(result) => {
                if let Err(e) = &result {
                    debug!(%name, error = %e, kind = e.kind(), "ToolRegistry::invoke: tool failed");
                }
                result
            }
            Err(_) => {
                warn!(%name, timeout_ms = self.timeout.as_millis() as u64, "ToolRegistry::invoke: timed out");
                Err(ToolError::Timeout {
                    name: name.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::test_support::context;
    use async_trait::async_trait;
    use serde_json::json;
    use tempfile::TempDir;

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn description(&self) -> &'static str {
            "Sleeps for a while"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, _input: Value, _ctx: &ToolContext) -> ToolResult {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("done".to_string())
        }
    }

    #[test]
    fn test_standard_registry_order() {
        let registry = ToolRegistry::standard();
        assert_eq!(
            registry.tool_names(),
            vec!["create_plan", "add_instruction", "get_next_step", "reset_plan", "get_plan_status"]
        );
        assert!(registry.has_tool("reset_plan"));
        assert!(!registry.has_tool("delete_plan"));
    }

    #[test]
    fn test_definitions_have_object_schemas() {
        for def in ToolRegistry::standard().definitions() {
            assert!(!def.description.is_empty());
            assert_eq!(def.input_schema["type"], "object", "{}", def.name);
            assert!(def.input_schema["required"].is_array(), "{}", def.name);
        }
    }

    #[test]
    fn test_descriptor_serializes_input_schema_camel_case() {
        let def = &ToolRegistry::standard().definitions()[2];
        let value = serde_json::to_value(def).unwrap();
        assert_eq!(value["name"], "get_next_step");
        assert!(value.get("inputSchema").is_some());
        assert!(value.get("input_schema").is_none());
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let err = ToolRegistry::standard().invoke("nope", json!({}), &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool { .. }));
        assert_eq!(err.kind(), "tool_not_found");
    }

    #[tokio::test]
    async fn test_invoke_times_out() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let mut registry = ToolRegistry::with_limits(&ToolsConfig {
            timeout_ms: 20,
            max_concurrent: 1,
        });
        registry.add_tool(Box::new(SlowTool));

        let err = registry.invoke("slow", json!({}), &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::Timeout { timeout_ms: 20, .. }));
    }

    #[test]
    fn test_add_tool_replaces_same_name() {
        let mut registry = ToolRegistry::with_limits(&ToolsConfig::default());
        registry.add_tool(Box::new(SlowTool));
        registry.add_tool(Box::new(SlowTool));
        assert_eq!(registry.tool_names(), vec!["slow"]);
    }
}
