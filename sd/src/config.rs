//! StepDaemon configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main StepDaemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listener configuration
    pub server: ServerConfig,

    /// Plan and state directories
    pub storage: StorageConfig,

    /// Tool invocation limits
    pub tools: ToolsConfig,

    /// Query resolver (LLM) configuration
    pub resolver: ResolverConfig,

    /// File search configuration
    pub search: SearchConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Config {
    /// Config files tried when no `--config` is given, in priority order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".stepdaemon.yml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("stepdaemon").join("stepdaemon.yml"));
        }
        paths
    }

    /// Load configuration
    ///
    /// An explicit path must load. Otherwise the first readable file from
    /// `search_paths` wins; a broken one is logged and skipped.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::read(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::search_paths().iter().filter(|p| p.exists()) {
            match Self::read(candidate) {
                Ok(config) => return Ok(config),
                Err(e) => tracing::warn!(path = %candidate.display(), error = %e, "Skipping unreadable config"),
            }
        }

        tracing::info!("Using built-in defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are swallowed; the full `load` reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => Self::search_paths(),
        };

        candidates
            .iter()
            .find(|p| p.exists())
            .and_then(|p| Self::read(p).ok())
            .and_then(|c| c.log_level)
    }

    fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).context("Cannot read config")?;
        let config: Self = serde_yaml::from_str(&raw).context("Cannot parse config")?;
        tracing::info!(path = %path.display(), "Config loaded");
        Ok(config)
    }
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Largest accepted request body
    #[serde(rename = "max-body-bytes")]
    pub max_body_bytes: usize,

    /// Terminate whatever process already listens on the port
    #[serde(rename = "reclaim-port")]
    pub reclaim_port: bool,
}

impl ServerConfig {
    /// Socket address to bind
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .context(format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5001,
            max_body_bytes: 1024 * 1024,
            reclaim_port: false,
        }
    }
}

/// Plan and state directories
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory of plan files
    #[serde(rename = "plan-dir")]
    pub plan_dir: PathBuf,

    /// Directory of cursor records
    #[serde(rename = "state-dir")]
    pub state_dir: PathBuf,
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stepdaemon")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            plan_dir: data_dir().join("plans"),
            state_dir: data_dir().join("state"),
        }
    }
}

/// Tool invocation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Per-call timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Maximum tool calls running at once
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: usize,
}

impl ToolsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 120_000,
            max_concurrent: 8,
        }
    }
}

/// Query resolver configuration (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl ResolverConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .map_err(|_| eyre::eyre!("Resolver API key not found. Set the {} environment variable.", self.api_key_env))
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            max_tokens: 1024,
            timeout_ms: 60_000,
        }
    }
}

/// File search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Cap on files turned into steps
    #[serde(rename = "max-results")]
    pub max_results: usize,

    /// Follow symlinks while walking
    #[serde(rename = "follow-links")]
    pub follow_links: bool,

    /// Descend into dot-directories and match dotfiles
    #[serde(rename = "include-hidden")]
    pub include_hidden: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 1000,
            follow_links: false,
            include_hidden: false,
        }
    }
}
