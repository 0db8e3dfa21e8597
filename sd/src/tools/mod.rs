//! Tool system
//!
//! Tools are the operations a client reaches through `tools/call`. Each one
//! receives a `ToolContext` holding the session manager and planner, and
//! the registry bounds how many run at once and for how long.

mod context;
mod error;
mod registry;
mod traits;

pub mod builtin;

pub use context::ToolContext;
pub use error::ToolError;
pub use registry::{ToolDescriptor, ToolRegistry};
pub use traits::{Tool, ToolResult};
