//! Built-in plan tools

mod add_instruction;
mod create_plan;
mod get_next_step;
mod get_plan_status;
mod reset_plan;

pub use add_instruction::AddInstructionTool;
pub use create_plan::CreatePlanTool;
pub use get_next_step::GetNextStepTool;
pub use get_plan_status::GetPlanStatusTool;
pub use reset_plan::ResetPlanTool;

use serde_json::{Value, json};

use crate::tools::ToolError;

/// Fetch a required string argument
fn required_str<'a>(input: &'a Value, name: &'static str) -> Result<&'a str, ToolError> {
    match input.get(name) {
        None | Some(Value::Null) => Err(ToolError::MissingArgument { name }),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ToolError::InvalidArgument(format!(
            "{} must be a string, got {}",
            name, other
        ))),
    }
}

/// Schema for tools that take only a plan id
fn plan_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "plan_id": {
                "type": "string",
                "description": "Identifier of the plan"
            }
        },
        "required": ["plan_id"]
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_str() {
        let input = json!({"plan_id": "p", "n": 3, "nothing": null});
        assert_eq!(required_str(&input, "plan_id").unwrap(), "p");
        assert!(matches!(
            required_str(&input, "missing"),
            Err(ToolError::MissingArgument { name: "missing" })
        ));
        assert!(matches!(
            required_str(&input, "nothing"),
            Err(ToolError::MissingArgument { .. })
        ));
        assert!(matches!(required_str(&input, "n"), Err(ToolError::InvalidArgument(_))));
    }
}
