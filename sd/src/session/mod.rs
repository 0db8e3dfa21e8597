//! Session management with actor pattern
//!
//! SessionManager owns the per-plan cursor cache and the plan/state stores,
//! processing commands via channels. Every mutation is written through to
//! the state store before the reply is sent.

mod manager;
mod messages;
mod table;
mod types;

pub use manager::SessionManager;
pub use messages::{SessionCommand, SessionError, SessionResponse};
pub use table::SessionTable;
pub use types::{Advance, PlanState, PlanStatus, Session};
