//! Query resolver - natural language to a structured file query

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::PlannerError;
use crate::config::ResolverConfig;

const SYSTEM_PROMPT: &str = "You turn a request about files in a codebase into a JSON search query. \
Respond with a single JSON object and nothing else, using exactly these keys: \
\"search_path\" (directory to search, default \".\"), \
\"file_patterns\" (array of glob patterns such as \"*.py\"), \
\"keywords\" (array of words the file name or contents should contain), \
\"output_filename\" (short file name for the resulting plan, no directories).";

/// Structured form of a plan request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedQuery {
    #[serde(default = "default_search_path")]
    pub search_path: String,

    #[serde(default)]
    pub file_patterns: Vec<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub output_filename: String,
}

fn default_search_path() -> String {
    ".".to_string()
}

/// Turns a natural-language query into a `ResolvedQuery`
#[async_trait]
pub trait QueryResolver: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<ResolvedQuery, PlannerError>;
}

/// Resolver backed by an OpenAI-compatible chat completions endpoint
pub struct OpenAiResolver {
    model: String,
    api_key: String,
    base_url: String,
    max_tokens: u32,
    http: Client,
}

impl OpenAiResolver {
    pub fn from_config(config: &ResolverConfig) -> Result<Self, PlannerError> {
        debug!(model = %config.model, base_url = %config.base_url, "from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|e| PlannerError::NotConfigured(e.to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| PlannerError::NotConfigured(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_tokens: config.max_tokens,
            http,
        })
    }

    fn build_request_body(&self, query: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": query },
            ],
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl QueryResolver for OpenAiResolver {
    async fn resolve(&self, query: &str) -> Result<ResolvedQuery, PlannerError> {
        debug!(%query, "OpenAiResolver::resolve: called");
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.build_request_body(query))
            .send()
            .await
            .map_err(|e| PlannerError::Upstream(format!("Resolver request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%status, "OpenAiResolver::resolve: API error");
            return Err(PlannerError::Upstream(format!(
                "Resolver returned {}: {}",
                status.as_u16(),
                text
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| PlannerError::Upstream(format!("Resolver response unreadable: {}", e)))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| PlannerError::Upstream("Resolver returned no content".to_string()))?;

        parse_resolution(&content)
    }
}

/// Parse the model's reply, tolerating a surrounding markdown code fence
pub fn parse_resolution(content: &str) -> Result<ResolvedQuery, PlannerError> {
    let trimmed = content.trim();
    let json = match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    };

    let resolved: ResolvedQuery = serde_json::from_str(json)
        .map_err(|e| PlannerError::InvalidResolution(format!("Resolver reply is not a query object: {}", e)))?;

    if resolved.search_path.trim().is_empty() {
        return Err(PlannerError::InvalidResolution("Resolver returned an empty search_path".to_string()));
    }
    Ok(resolved)
}

/// Stand-in used when no resolver credentials are configured
pub struct UnavailableResolver {
    reason: String,
}

impl UnavailableResolver {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl QueryResolver for UnavailableResolver {
    async fn resolve(&self, _query: &str) -> Result<ResolvedQuery, PlannerError> {
        Err(PlannerError::Upstream(format!("Query resolver unavailable: {}", self.reason)))
    }
}
