//! StepDaemon - resumable plan-execution server
//!
//! A plan is an ordered list of steps (usually files) produced from a
//! natural-language query. Clients walk a plan one step at a time through
//! JSON-RPC tool calls; the cursor for each plan is persisted after every
//! change so progress survives restarts.
//!
//! # Modules
//!
//! - [`session`] - Single-writer actor owning per-plan cursors
//! - [`planner`] - Query resolver and file search collaborators
//! - [`tools`] - The named operations exposed over `tools/call`
//! - [`rpc`] - JSON-RPC messages, dispatcher and client
//! - [`server`] - HTTP listener
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod planner;
pub mod rpc;
pub mod server;
pub mod session;
pub mod tools;

// Re-export commonly used types
pub use config::Config;
pub use planner::{Planner, PlannerError};
pub use rpc::{Dispatcher, RpcClient, RpcClientError, RpcError, RpcRequest, RpcResponse};
pub use session::{Advance, PlanState, PlanStatus, SessionError, SessionManager};
pub use tools::{Tool, ToolContext, ToolDescriptor, ToolError, ToolRegistry};
