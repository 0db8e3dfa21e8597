//! get_next_step tool

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{plan_id_schema, required_str};
use crate::tools::{Tool, ToolContext, ToolResult};

/// Hand out the next pending step and advance the plan
pub struct GetNextStepTool;

#[async_trait]
impl Tool for GetNextStepTool {
    fn name(&self) -> &'static str {
        "get_next_step"
    }

    fn description(&self) -> &'static str {
        "Return the next step of a plan and mark it as handed out. \
         Once every step has been returned, reports that the plan is finished."
    }

    fn input_schema(&self) -> Value {
        plan_id_schema()
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "GetNextStepTool::execute: called");
        let plan_id = required_str(&input, "plan_id")?;
        let advance = ctx.sessions.advance(plan_id).await?;
        Ok(advance.to_string())
    }
}
