//! StateStore - durable per-plan cursor records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::fsutil::write_atomic;
use crate::validate_plan_id;

/// Persisted execution cursor for one plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Index of the next step to hand out (0 = not started)
    pub current_step: usize,

    /// When the cursor was last written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PersistedState {
    /// State positioned at `current_step`
    pub fn at(current_step: usize) -> Self {
        Self {
            current_step,
            updated_at: None,
        }
    }
}

/// Cursor records, one `<plan_id>.json` file per plan
#[derive(Debug, Clone)]
pub struct StateStore {
    base_path: PathBuf,
}

impl StateStore {
    /// Open or create a state store at the given directory
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).map_err(|e| StoreError::io(&base_path, e))?;
        debug!(?base_path, "Opened state store");
        Ok(Self { base_path })
    }

    /// File backing a plan's cursor
    pub fn path_for(&self, id: &str) -> StoreResult<PathBuf> {
        validate_plan_id(id)?;
        Ok(self.base_path.join(format!("{}.json", id)))
    }

    /// Check whether a cursor record exists
    pub fn exists(&self, id: &str) -> bool {
        self.path_for(id).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Load a plan's cursor
    ///
    /// A missing, unreadable or corrupt record yields the default state
    /// (cursor 0). Corruption is logged, not surfaced.
    pub fn load(&self, id: &str) -> PersistedState {
        debug!(%id, "load: called");
        let path = match self.path_for(id) {
            Ok(path) => path,
            Err(e) => {
                warn!(%id, error = %e, "load: invalid plan id, using default state");
                return PersistedState::default();
            }
        };

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(%id, "load: no state file, using default state");
                return PersistedState::default();
            }
            Err(e) => {
                warn!(%id, path = %path.display(), error = %e, "load: unreadable state file, using default state");
                return PersistedState::default();
            }
        };

        match serde_json::from_str::<PersistedState>(&content) {
            Ok(state) => {
                debug!(%id, current_step = state.current_step, "load: state loaded");
                state
            }
            Err(e) => {
                warn!(%id, path = %path.display(), error = %e, "load: corrupt state file, using default state");
                PersistedState::default()
            }
        }
    }

    /// Overwrite a plan's cursor record (atomic), stamping `updated_at`
    pub fn save(&self, id: &str, state: &PersistedState) -> StoreResult<()> {
        debug!(%id, current_step = state.current_step, "save: called");
        let path = self.path_for(id)?;
        let record = PersistedState {
            current_step: state.current_step,
            updated_at: Some(Utc::now()),
        };
        let content = serde_json::to_string_pretty(&record)?;
        write_atomic(&path, content.as_bytes())
    }
}
