//! PlanStore - durable plans and execution cursors
//!
//! Stores a plan's ordered step list as a line-delimited file and the plan's
//! execution cursor as a small JSON record next to it.
//!
//! # Layout
//!
//! ```text
//! plans/
//! ├── refactor-auth          # one JSON step record per line
//! └── migrate-tests
//! state/
//! ├── refactor-auth.json     # {"current_step": 2, "updated_at": "..."}
//! └── migrate-tests.json
//! ```
//!
//! # Example
//!
//! ```ignore
//! use planstore::{PersistedState, PlanStore, StateStore, Step};
//!
//! let plans = PlanStore::open("plans")?;
//! let states = StateStore::open("state")?;
//! plans.create("demo", &[Step::new("a.py"), Step::new("b.py")])?;
//! states.save("demo", &PersistedState::at(1))?;
//! ```

mod error;
mod fsutil;
mod plan;
mod state;
mod step;

pub use error::{StoreError, StoreResult};
pub use plan::PlanStore;
pub use state::{PersistedState, StateStore};
pub use step::Step;

/// Validate a plan id
///
/// A plan id doubles as a filename, so it must be exactly one path component
/// and must not collide with the hidden temp files used for atomic writes.
pub fn validate_plan_id(id: &str) -> StoreResult<()> {
    let valid = !id.is_empty()
        && !id.starts_with('.')
        && !id.contains(['/', '\\', '\0'])
        && id.trim() == id;

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}
