//! Tool error types

use thiserror::Error;

use crate::planner::PlannerError;
use crate::session::SessionError;

/// Errors that can occur during tool execution
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    UnknownTool { name: String },

    #[error("Missing required argument: {name}")]
    MissingArgument { name: &'static str },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error("Tool {name} timed out after {timeout_ms}ms")]
    Timeout { name: String, timeout_ms: u64 },

    #[error("Tool {name} unavailable: {reason}")]
    Unavailable { name: String, reason: String },
}

impl ToolError {
    /// Stable machine-readable category, carried in RPC error data
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::UnknownTool { .. } => "tool_not_found",
            ToolError::MissingArgument { .. } | ToolError::InvalidArgument(_) => "invalid_argument",
            ToolError::Session(SessionError::NotFound(_)) => "not_found",
            ToolError::Session(SessionError::InvalidId(_)) => "invalid_argument",
            ToolError::Session(SessionError::Storage(_)) => "io_failure",
            ToolError::Session(SessionError::ChannelError) => "unavailable",
            ToolError::Planner(PlannerError::InvalidResolution(_)) => "upstream_failure",
            ToolError::Planner(PlannerError::Upstream(_)) => "upstream_failure",
            ToolError::Planner(PlannerError::NotConfigured(_)) => "upstream_failure",
            ToolError::Planner(PlannerError::Search(_)) => "io_failure",
            ToolError::Timeout { .. } => "timeout",
            ToolError::Unavailable { .. } => "unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let cases: Vec<(ToolError, &str)> = vec![
            (ToolError::UnknownTool { name: "x".into() }, "tool_not_found"),
            (ToolError::MissingArgument { name: "plan_id" }, "invalid_argument"),
            (SessionError::NotFound("p".into()).into(), "not_found"),
            (SessionError::InvalidId("../p".into()).into(), "invalid_argument"),
            (SessionError::Storage("disk full".into()).into(), "io_failure"),
            (PlannerError::Upstream("503".into()).into(), "upstream_failure"),
            (PlannerError::Search("gone".into()).into(), "io_failure"),
            (
                ToolError::Timeout {
                    name: "create_plan".into(),
                    timeout_ms: 10,
                },
                "timeout",
            ),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{}", err);
        }
    }

    #[test]
    fn test_messages_pass_through() {
        let err: ToolError = SessionError::NotFound("ghost".into()).into();
        assert_eq!(err.to_string(), "Plan not found: ghost");

        let err = ToolError::MissingArgument { name: "query" };
        assert_eq!(err.to_string(), "Missing required argument: query");
    }
}
