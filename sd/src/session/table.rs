//! SessionTable - the state owned by the session actor
//!
//! Every mutation persists the new cursor before updating the cache. When a
//! plan file has already changed and a later write fails, the cached session
//! is dropped so the next access reloads from disk.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use planstore::{PersistedState, PlanStore, StateStore, Step};
use tracing::{debug, info, warn};

use super::messages::{SessionError, SessionResponse};
use super::types::{Advance, PlanStatus, Session};

/// Cached sessions plus the stores backing them
pub struct SessionTable {
    sessions: HashMap<String, Session>,
    plans: PlanStore,
    states: StateStore,
}

impl SessionTable {
    pub fn new(plans: PlanStore, states: StateStore) -> Self {
        Self {
            sessions: HashMap::new(),
            plans,
            states,
        }
    }

    /// Cached cursor for a plan, if a session is loaded
    pub fn cached_cursor(&self, id: &str) -> Option<usize> {
        self.sessions.get(id).map(|s| s.cursor)
    }

    /// Return the cached session, loading it from disk on first access
    ///
    /// Requires the plan file to exist; nothing is created for unknown ids.
    pub fn get_or_load(&mut self, id: &str) -> SessionResponse<&mut Session> {
        match self.sessions.entry(id.to_string()) {
            Entry::Occupied(entry) => {
                debug!(%id, "get_or_load: cache hit");
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                debug!(%id, "get_or_load: cache miss, loading from disk");
                let steps = self.plans.read(id)?;
                let persisted = self.states.load(id);
                if persisted.current_step > steps.len() {
                    warn!(
                        %id,
                        persisted = persisted.current_step,
                        total = steps.len(),
                        "get_or_load: persisted cursor beyond plan end, clamping"
                    );
                }
                let session = Session::new(steps, persisted.current_step);
                info!(%id, cursor = session.cursor, total = session.total(), "Session loaded");
                Ok(entry.insert(session))
            }
        }
    }

    /// Write a plan and start it from the first step
    pub fn create_plan(&mut self, id: &str, steps: Vec<Step>) -> SessionResponse<usize> {
        debug!(%id, step_count = steps.len(), "create_plan: called");
        self.plans.create(id, &steps)?;
        if let Err(e) = self.states.save(id, &PersistedState::at(0)) {
            self.evict(id);
            return Err(e.into());
        }
        let total = steps.len();
        self.sessions.insert(id.to_string(), Session::new(steps, 0));
        Ok(total)
    }

    /// Hand out the next step and move the cursor past it
    pub fn advance(&mut self, id: &str) -> SessionResponse<Advance> {
        debug!(%id, "advance: called");
        let (step, next, total) = {
            let session = self.get_or_load(id)?;
            let total = session.total();
            match session.next_step() {
                Some(step) => (step.clone(), session.cursor + 1, total),
                None => {
                    debug!(%id, total, "advance: plan already finished");
                    return Ok(Advance::Finished {
                        plan_id: id.to_string(),
                        total,
                    });
                }
            }
        };

        self.states.save(id, &PersistedState::at(next))?;
        if let Some(session) = self.sessions.get_mut(id) {
            session.cursor = next;
        }

        debug!(%id, position = next, total, "advance: step handed out");
        Ok(Advance::Step {
            position: next,
            total,
            step,
        })
    }

    /// Move the cursor back to the first step
    pub fn reset(&mut self, id: &str) -> SessionResponse<()> {
        debug!(%id, "reset: called");
        self.require_plan(id)?;
        self.states.save(id, &PersistedState::at(0))?;
        if let Some(session) = self.sessions.get_mut(id) {
            session.cursor = 0;
        }
        info!(%id, "Plan reset");
        Ok(())
    }

    /// Report progress without mutating anything
    pub fn status(&mut self, id: &str) -> SessionResponse<PlanStatus> {
        debug!(%id, "status: called");
        let session = self.get_or_load(id)?;
        Ok(PlanStatus::from_session(id, session))
    }

    /// Re-read an edited plan and restart it from the first step
    ///
    /// The persisted cursor is reset even when no session is cached, so a
    /// later lazy load cannot resume into the edited content.
    pub fn reload_after_edit(&mut self, id: &str) -> SessionResponse<usize> {
        debug!(%id, "reload_after_edit: called");
        let steps = match self.plans.read(id) {
            Ok(steps) => steps,
            Err(e) => {
                self.evict(id);
                return Err(e.into());
            }
        };
        let total = steps.len();
        if let Err(e) = self.states.save(id, &PersistedState::at(0)) {
            self.evict(id);
            return Err(e.into());
        }
        if let Some(session) = self.sessions.get_mut(id) {
            debug!(%id, "reload_after_edit: refreshing cached session");
            *session = Session::new(steps, 0);
        }
        Ok(total)
    }

    /// Annotate every step with `instruction`, then reload
    pub fn add_instruction(&mut self, id: &str, instruction: &str) -> SessionResponse<usize> {
        debug!(%id, %instruction, "add_instruction: called");
        self.plans.append_instruction(id, instruction)?;
        let total = self.reload_after_edit(id)?;
        info!(%id, total, "Instruction added, plan restarted");
        Ok(total)
    }

    /// Drop a cached session so the next access reloads it from disk
    fn evict(&mut self, id: &str) {
        if self.sessions.remove(id).is_some() {
            warn!(%id, "evict: write failed after plan changed, dropping cached session");
        }
    }

    fn require_plan(&self, id: &str) -> SessionResponse<()> {
        self.plans.path_for(id)?;
        if self.plans.exists(id) {
            Ok(())
        } else {
            Err(SessionError::NotFound(id.to_string()))
        }
    }
}
