//! StepDaemon - resumable plan-execution server
//!
//! CLI entry point for serving plans and talking to a running server.

use std::fs;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use serde_json::{Value, json};
use tracing::{debug, info};

use planstore::{PlanStore, StateStore};
use stepdaemon::cli::{Cli, Command, OutputFormat, ServeArgs, StorageArgs};
use stepdaemon::config::Config;
use stepdaemon::planner::Planner;
use stepdaemon::rpc::{Dispatcher, RpcClient};
use stepdaemon::server;
use stepdaemon::session::{PlanStatus, Session, SessionManager};
use stepdaemon::tools::{ToolContext, ToolDescriptor, ToolRegistry};

fn parse_level(s: &str) -> tracing::Level {
    match s.to_uppercase().as_str() {
        "TRACE" => tracing::Level::TRACE,
        "DEBUG" => tracing::Level::DEBUG,
        "INFO" => tracing::Level::INFO,
        "WARN" | "WARNING" => tracing::Level::WARN,
        "ERROR" => tracing::Level::ERROR,
        _ => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
            tracing::Level::INFO
        }
    }
}

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = stepdaemon::cli::get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > INFO
    let level = cli_log_level
        .or(config_log_level)
        .map(parse_level)
        .unwrap_or(tracing::Level::INFO);

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log level comes from the config file before the full load
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Serve(args)) => cmd_serve(config, &args).await,
        None => cmd_serve(config, &ServeArgs::default()).await,
        Some(Command::Tools { format }) => cmd_tools(&config, format),
        Some(Command::Plans { storage, format }) => cmd_plans(config, &storage, format),
        Some(Command::Call { tool, args, url }) => cmd_call(&url, &tool, &args).await,
        Some(Command::RemoteTools { url }) => cmd_remote_tools(&url).await,
    }
}

/// Run the server until Ctrl-C or SIGTERM
async fn cmd_serve(mut config: Config, args: &ServeArgs) -> Result<()> {
    debug!(?args, "cmd_serve: called");
    args.apply(&mut config);

    let sessions = SessionManager::open(&config.storage.plan_dir, &config.storage.state_dir)
        .context("Failed to start session manager")?;
    let planner = Planner::from_config(&config.resolver, &config.search);
    let registry = ToolRegistry::standard_with(&config.tools);
    let dispatcher = Dispatcher::new(registry, ToolContext::new(sessions.clone(), planner));

    let listener = server::bind(config.server.addr()?, config.server.reclaim_port).await?;
    let addr = listener.local_addr().context("Failed to read listener address")?;

    println!("{} stepdaemon listening on {}", "✓".green(), addr.to_string().cyan());
    println!("  plans: {}", config.storage.plan_dir.display());
    println!("  state: {}", config.storage.state_dir.display());
    info!(%addr, plan_dir = %config.storage.plan_dir.display(), "Server started");

    server::serve(
        listener,
        dispatcher,
        config.server.max_body_bytes,
        server::shutdown_signal(),
    )
    .await?;

    sessions.shutdown().await.context("Failed to stop session manager")?;
    println!("{} stepdaemon stopped", "✓".green());
    Ok(())
}

fn print_tools(tools: &[ToolDescriptor]) {
    for tool in tools {
        println!("{}", tool.name.bold());
        println!("  {}", tool.description);

        let required: Vec<&str> = tool.input_schema["required"]
            .as_array()
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        if let Some(props) = tool.input_schema["properties"].as_object() {
            for (name, prop) in props {
                let marker = if required.contains(&name.as_str()) { "*" } else { " " };
                println!(
                    "  {}{} {}",
                    marker.red(),
                    name.yellow(),
                    prop["description"].as_str().unwrap_or_default().dimmed()
                );
            }
        }
        println!();
    }
}

/// List local tool descriptors
fn cmd_tools(config: &Config, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_tools: called");
    let tools = ToolRegistry::standard_with(&config.tools).definitions();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tools)?),
        OutputFormat::Text => print_tools(&tools),
    }
    Ok(())
}

/// List plans on disk with their progress
fn cmd_plans(mut config: Config, storage: &StorageArgs, format: OutputFormat) -> Result<()> {
    debug!(?storage, ?format, "cmd_plans: called");
    storage.apply(&mut config);

    let plans = PlanStore::open(&config.storage.plan_dir).context("Failed to open plan directory")?;
    let states = StateStore::open(&config.storage.state_dir).context("Failed to open state directory")?;

    let mut statuses = Vec::new();
    for id in plans.list().context("Failed to list plans")? {
        let steps = plans.read(&id).context(format!("Failed to read plan {}", id))?;
        let cursor = states.load(&id).current_step;
        statuses.push(PlanStatus::from_session(&id, &Session::new(steps, cursor)));
    }

    match format {
        OutputFormat::Json => {
            let rows: Vec<Value> = statuses
                .iter()
                .map(|s| {
                    json!({
                        "plan_id": s.plan_id,
                        "position": s.position,
                        "total": s.total,
                        "state": s.state(),
                        "next_step": s.next_step.as_ref().map(|step| step.to_string()),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            if statuses.is_empty() {
                println!("No plans in {}", config.storage.plan_dir.display());
            }
            for s in &statuses {
                println!(
                    "{:<32} {:>5}/{:<5} {}",
                    s.plan_id.cyan(),
                    s.position,
                    s.total,
                    s.state().to_string().dimmed()
                );
            }
        }
    }
    Ok(())
}

/// Call a tool on a running server
async fn cmd_call(url: &str, tool: &str, args: &str) -> Result<()> {
    debug!(%url, %tool, %args, "cmd_call: called");
    let arguments: Value = serde_json::from_str(args).context("--args must be a JSON object")?;
    if !arguments.is_object() {
        return Err(eyre::eyre!("--args must be a JSON object, got: {}", args));
    }

    let client = RpcClient::new(url);
    let text = client
        .call_tool(tool, arguments)
        .await
        .context(format!("Tool call '{}' failed", tool))?;
    println!("{}", text);
    Ok(())
}

/// List the tools of a running server
async fn cmd_remote_tools(url: &str) -> Result<()> {
    debug!(%url, "cmd_remote_tools: called");
    let client = RpcClient::new(url);
    let info = client
        .initialize()
        .await
        .context(format!("Failed to reach server at {}", url))?;

    let name = info["serverInfo"]["name"].as_str().unwrap_or("unknown");
    let version = info["serverInfo"]["version"].as_str().unwrap_or("unknown");
    println!("{} {} {}", "✓".green(), name.bold(), version.dimmed());
    println!();

    let tools = client.list_tools().await.context("Failed to list tools")?;
    print_tools(&tools);
    Ok(())
}
