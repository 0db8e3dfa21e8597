//! ToolContext - what tools run against

use crate::planner::Planner;
use crate::session::SessionManager;

/// Shared handles passed to every tool call
#[derive(Clone)]
pub struct ToolContext {
    pub sessions: SessionManager,
    pub planner: Planner,
}

impl ToolContext {
    pub fn new(sessions: SessionManager, planner: Planner) -> Self {
        Self { sessions, planner }
    }
}
