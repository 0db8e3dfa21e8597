//! reset_plan tool

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{plan_id_schema, required_str};
use crate::tools::{Tool, ToolContext, ToolResult};

/// Move a plan back to its first step
pub struct ResetPlanTool;

#[async_trait]
impl Tool for ResetPlanTool {
    fn name(&self) -> &'static str {
        "reset_plan"
    }

    fn description(&self) -> &'static str {
        "Reset a plan so the next get_next_step returns its first step again."
    }

    fn input_schema(&self) -> Value {
        plan_id_schema()
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "ResetPlanTool::execute: called");
        let plan_id = required_str(&input, "plan_id")?;
        ctx.sessions.reset(plan_id).await?;
        Ok(format!("Plan '{}' reset to the first step.", plan_id))
    }
}
