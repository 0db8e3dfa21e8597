//! create_plan tool - turn a query into a new plan

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::required_str;
use crate::tools::{Tool, ToolContext, ToolError, ToolResult};

/// Resolve a natural-language query into files and store them as a plan
pub struct CreatePlanTool;

#[async_trait]
impl Tool for CreatePlanTool {
    fn name(&self) -> &'static str {
        "create_plan"
    }

    fn description(&self) -> &'static str {
        "Create a plan from a natural-language query. The query is resolved into a file search; \
         each matching file becomes one step, walked in order with get_next_step."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What files the plan should cover, e.g. 'all python files under app/models'"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "CreatePlanTool::execute: called");
        let query = required_str(&input, "query")?;
        if query.trim().is_empty() {
            return Err(ToolError::InvalidArgument("query must not be empty".to_string()));
        }

        let draft = ctx.planner.plan(query).await?;
        let total = ctx.sessions.create_plan(&draft.id, draft.steps).await?;

        info!(plan_id = %draft.id, %total, "Plan created");
        Ok(format!("Plan '{}' created with {} steps.", draft.id, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{FileSearch, Planner, ResolvedQuery, WalkdirSearch, mock::MockResolver};
    use crate::session::SessionManager;
    use crate::tools::builtin::test_support;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_plan_from_query() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.py"), "").unwrap();
        fs::write(src.join("b.py"), "").unwrap();

        let resolver = Arc::new(MockResolver::new(ResolvedQuery {
            search_path: src.to_string_lossy().to_string(),
            file_patterns: vec!["*.py".to_string()],
            keywords: vec![],
            output_filename: "python".to_string(),
        }));
        let search: Arc<dyn FileSearch> = Arc::new(WalkdirSearch::default());
        let sessions = SessionManager::open(temp.path().join("plans"), temp.path().join("state")).unwrap();
        let ctx = ToolContext::new(sessions, Planner::new(resolver, search));

        let text = CreatePlanTool
            .execute(json!({"query": "python files"}), &ctx)
            .await
            .unwrap();

        assert_eq!(text, "Plan 'python' created with 2 steps.");
        assert!(temp.path().join("plans/python").is_file());
        assert!(temp.path().join("state/python.json").is_file());

        let status = ctx.sessions.status("python").await.unwrap();
        assert_eq!(status.position, 0);
        assert_eq!(status.total, 2);
    }

    #[tokio::test]
    async fn test_create_plan_upstream_failure() {
        let temp = TempDir::new().unwrap();
        let ctx = test_support::context(&temp);

        let err = CreatePlanTool
            .execute(json!({"query": "python files"}), &ctx)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "upstream_failure");
        assert!(err.to_string().contains("Query resolver unavailable"));
    }

    #[tokio::test]
    async fn test_create_plan_requires_query() {
        let temp = TempDir::new().unwrap();
        let ctx = test_support::context(&temp);

        let err = CreatePlanTool.execute(json!({}), &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::MissingArgument { name: "query" }));

        let err = CreatePlanTool.execute(json!({"query": "  "}), &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }
}
