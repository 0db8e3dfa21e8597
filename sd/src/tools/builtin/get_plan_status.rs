//! get_plan_status tool

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{plan_id_schema, required_str};
use crate::tools::{Tool, ToolContext, ToolResult};

/// Report progress without advancing
pub struct GetPlanStatusTool;

#[async_trait]
impl Tool for GetPlanStatusTool {
    fn name(&self) -> &'static str {
        "get_plan_status"
    }

    fn description(&self) -> &'static str {
        "Report how many steps of a plan have been handed out and which step is next, without advancing."
    }

    fn input_schema(&self) -> Value {
        plan_id_schema()
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "GetPlanStatusTool::execute: called");
        let plan_id = required_str(&input, "plan_id")?;
        let status = ctx.sessions.status(plan_id).await?;
        Ok(status.to_string())
    }
}
