//! Session manager messages
//!
//! Commands and responses for the actor pattern.

use planstore::{Step, StoreError};
use thiserror::Error;
use tokio::sync::oneshot;

use super::types::{Advance, PlanStatus};

/// Errors from session operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Plan not found: {0}")]
    NotFound(String),

    #[error("Invalid plan id: '{0}'")]
    InvalidId(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Session manager unavailable")]
    ChannelError,
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => SessionError::NotFound(id),
            StoreError::InvalidId(id) => SessionError::InvalidId(id),
            other => SessionError::Storage(other.to_string()),
        }
    }
}

/// Response from session operations
pub type SessionResponse<T> = Result<T, SessionError>;

/// Commands sent to the SessionManager actor
#[derive(Debug)]
pub enum SessionCommand {
    CreatePlan {
        id: String,
        steps: Vec<Step>,
        reply: oneshot::Sender<SessionResponse<usize>>,
    },
    Advance {
        id: String,
        reply: oneshot::Sender<SessionResponse<Advance>>,
    },
    Reset {
        id: String,
        reply: oneshot::Sender<SessionResponse<()>>,
    },
    Status {
        id: String,
        reply: oneshot::Sender<SessionResponse<PlanStatus>>,
    },
    AddInstruction {
        id: String,
        instruction: String,
        reply: oneshot::Sender<SessionResponse<usize>>,
    },
    ReloadAfterEdit {
        id: String,
        reply: oneshot::Sender<SessionResponse<usize>>,
    },

    // Shutdown
    Shutdown,
}
