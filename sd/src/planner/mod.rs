//! Planner - turns a natural-language query into an ordered step list
//!
//! Two collaborators do the work: a `QueryResolver` (usually an LLM) that
//! produces a structured query, and a `FileSearch` that walks the disk.

use std::path::Path;
use std::sync::Arc;

use planstore::Step;
use thiserror::Error;
use tracing::{debug, info, warn};

mod resolver;
mod search;

pub use resolver::{OpenAiResolver, QueryResolver, ResolvedQuery, UnavailableResolver, parse_resolution};
pub use search::{FileSearch, WalkdirSearch};

#[cfg(test)]
pub use resolver::mock;

use crate::config::{ResolverConfig, SearchConfig};

/// Errors from planning a query
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    InvalidResolution(String),

    #[error("File search failed: {0}")]
    Search(String),

    #[error("Query resolver not configured: {0}")]
    NotConfigured(String),
}

/// A plan ready to be written
#[derive(Debug, Clone)]
pub struct DraftPlan {
    pub id: String,
    pub steps: Vec<Step>,
    pub query: ResolvedQuery,
}

/// Resolver plus file search
#[derive(Clone)]
pub struct Planner {
    resolver: Arc<dyn QueryResolver>,
    search: Arc<dyn FileSearch>,
}

impl Planner {
    pub fn new(resolver: Arc<dyn QueryResolver>, search: Arc<dyn FileSearch>) -> Self {
        Self { resolver, search }
    }

    /// Build from config; a missing API key leaves `create_plan` failing
    /// with an upstream error instead of stopping the server
    pub fn from_config(resolver: &ResolverConfig, search: &SearchConfig) -> Self {
        let resolver: Arc<dyn QueryResolver> = match OpenAiResolver::from_config(resolver) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                warn!(error = %e, "Planner::from_config: resolver unavailable");
                Arc::new(UnavailableResolver::new(e.to_string()))
            }
        };
        Self::new(resolver, Arc::new(WalkdirSearch::new(search)))
    }

    /// Resolve the query and search for the files it names
    pub async fn plan(&self, query: &str) -> Result<DraftPlan, PlannerError> {
        debug!(%query, "plan: called");
        let resolved = self.resolver.resolve(query).await?;
        debug!(?resolved, "plan: query resolved");

        let search = Arc::clone(&self.search);
        let search_query = resolved.clone();
        let paths = tokio::task::spawn_blocking(move || search.search(&search_query))
            .await
            .map_err(|e| PlannerError::Search(format!("Search task failed: {}", e)))??;

        let id = plan_id_from(&resolved.output_filename);
        let steps = paths
            .iter()
            .map(|p| Step::new(p.to_string_lossy().to_string()))
            .collect::<Vec<_>>();

        info!(%id, step_count = steps.len(), "Planned query");
        Ok(DraftPlan {
            id,
            steps,
            query: resolved,
        })
    }
}

/// Plan id from the resolver's output file name
///
/// Only the final path component is kept; anything unusable as an id is
/// replaced with `plan-<uuid v7>`.
pub fn plan_id_from(output_filename: &str) -> String {
    let candidate = Path::new(output_filename.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::trim)
        .unwrap_or_default();

    if planstore::validate_plan_id(candidate).is_ok() {
        candidate.to_string()
    } else {
        format!("plan-{}", uuid::Uuid::now_v7())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_plan_id_from_file_name() {
        assert_eq!(plan_id_from("python-files"), "python-files");
        assert_eq!(plan_id_from("out/plans/refactor.txt"), "refactor.txt");
        assert_eq!(plan_id_from("  spaced  "), "spaced");
    }

    #[test]
    fn test_plan_id_generated_when_unusable() {
        for bad in ["", "   ", "..", "/", ".hidden"] {
            let id = plan_id_from(bad);
            assert!(id.starts_with("plan-"), "{:?} gave {}", bad, id);
            assert!(planstore::validate_plan_id(&id).is_ok());
        }
        assert_ne!(plan_id_from(""), plan_id_from(""));
    }

    #[tokio::test]
    async fn test_plan_resolves_and_searches() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.py"), "").unwrap();
        fs::write(temp.path().join("b.py"), "").unwrap();
        fs::write(temp.path().join("notes.txt"), "").unwrap();

        let resolver = Arc::new(mock::MockResolver::new(ResolvedQuery {
            search_path: temp.path().to_string_lossy().to_string(),
            file_patterns: vec!["*.py".to_string()],
            keywords: vec![],
            output_filename: "py-plan".to_string(),
        }));
        let planner = Planner::new(resolver.clone(), Arc::new(WalkdirSearch::default()));

        let draft = planner.plan("all python files").await.unwrap();

        assert_eq!(resolver.call_count(), 1);
        assert_eq!(draft.id, "py-plan");
        let paths: Vec<&str> = draft.steps.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("a.py"));
        assert!(paths[1].ends_with("b.py"));
        assert!(draft.steps.iter().all(|s| s.annotation.is_none()));
    }

    #[tokio::test]
    async fn test_plan_propagates_resolver_failure() {
        let planner = Planner::new(
            Arc::new(UnavailableResolver::new("no key")),
            Arc::new(WalkdirSearch::default()),
        );
        let err = planner.plan("anything").await.unwrap_err();
        assert!(matches!(err, PlannerError::Upstream(_)));
    }
}
