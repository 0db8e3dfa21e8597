//! CLI command definitions and subcommands

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;
use crate::rpc::DEFAULT_URL;

/// StepDaemon - resumable plan-execution server
#[derive(Parser)]
#[command(
    name = "sd",
    about = "Resumable plan-execution server speaking JSON-RPC over HTTP",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the JSON-RPC server
    Serve(ServeArgs),

    /// List the tools this server exposes
    Tools {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List plans on disk with their progress
    Plans {
        #[command(flatten)]
        storage: StorageArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Call a tool on a running server
    Call {
        /// Tool name, e.g. get_next_step
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,

        /// Server URL
        #[arg(short, long, default_value = DEFAULT_URL)]
        url: String,
    },

    /// List the tools of a running server
    RemoteTools {
        /// Server URL
        #[arg(short, long, default_value = DEFAULT_URL)]
        url: String,
    },
}

/// Plan and state directory overrides
#[derive(Debug, Clone, Default, Args)]
pub struct StorageArgs {
    /// Directory holding plan files
    #[arg(long)]
    pub plan_dir: Option<PathBuf>,

    /// Directory holding cursor records
    #[arg(long)]
    pub state_dir: Option<PathBuf>,
}

impl StorageArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.plan_dir {
            config.storage.plan_dir = dir.clone();
        }
        if let Some(dir) = &self.state_dir {
            config.storage.state_dir = dir.clone();
        }
    }
}

/// Options for `sd serve`
#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// Bind address
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Terminate whatever process already listens on the port
    #[arg(long)]
    pub reclaim_port: bool,

    #[command(flatten)]
    pub storage: StorageArgs,
}

impl ServeArgs {
    /// Override config values with the flags that were given
    pub fn apply(&self, config: &mut Config) {
        debug!(?self, "ServeArgs::apply: called");
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.reclaim_port {
            config.server.reclaim_port = true;
        }
        self.storage.apply(config);
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stepdaemon")
        .join("logs")
        .join("stepdaemon.log")
}

/// Output format for listing commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown format '{}'. Expected: text, json", other)),
        }
    }
}
