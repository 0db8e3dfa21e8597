//! add_instruction tool - annotate every step and restart the plan

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use super::required_str;
use crate::tools::{Tool, ToolContext, ToolResult};

/// Attach an instruction to every step of a plan
pub struct AddInstructionTool;

#[async_trait]
impl Tool for AddInstructionTool {
    fn name(&self) -> &'static str {
        "add_instruction"
    }

    fn description(&self) -> &'static str {
        "Attach an instruction to every step of a plan, replacing any earlier instruction. \
         Progress is reset so the plan starts again from the first step."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "plan_id": {
                    "type": "string",
                    "description": "Identifier of the plan"
                },
                "instruction": {
                    "type": "string",
                    "description": "Instruction to apply to each step, e.g. 'add type hints'"
                }
            },
            "required": ["plan_id", "instruction"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "AddInstructionTool::execute: called");
        let plan_id = required_str(&input, "plan_id")?;
        let instruction = required_str(&input, "instruction")?;

        let total = ctx.sessions.add_instruction(plan_id, instruction).await?;
        Ok(format!(
            "Instruction added to {} steps of plan '{}'; progress reset to step 1.",
            total, plan_id
        ))
    }
}
