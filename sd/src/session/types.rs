//! Session value types

use planstore::Step;
use serde::Serialize;
use std::fmt;

/// In-memory cache of one plan's steps and cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub steps: Vec<Step>,
    pub cursor: usize,
}

impl Session {
    /// Build a session, clamping the cursor into `0..=steps.len()`
    pub fn new(steps: Vec<Step>, cursor: usize) -> Self {
        let cursor = cursor.min(steps.len());
        Self { steps, cursor }
    }

    pub fn total(&self) -> usize {
        self.steps.len()
    }

    pub fn next_step(&self) -> Option<&Step> {
        self.steps.get(self.cursor)
    }
}

/// Result of advancing a plan's cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advance {
    /// The step that was just handed out (1-based position)
    Step { position: usize, total: usize, step: Step },

    /// Every step has been handed out; repeated calls keep returning this
    Finished { plan_id: String, total: usize },
}

impl fmt::Display for Advance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advance::Step { position, total, step } => write!(f, "Step {}/{}: {}", position, total, step),
            Advance::Finished { plan_id, total } => {
                write!(f, "Plan '{}' finished: all {} steps completed.", plan_id, total)
            }
        }
    }
}

/// Coarse plan progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanState {
    NotStarted,
    InProgress,
    Finished,
}

impl fmt::Display for PlanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::InProgress => write!(f, "in progress"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// Read-only progress report for a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStatus {
    pub plan_id: String,
    /// Steps already handed out
    pub position: usize,
    pub total: usize,
    /// Literal next pending step, `None` when finished
    pub next_step: Option<Step>,
}

impl PlanStatus {
    pub fn from_session(plan_id: &str, session: &Session) -> Self {
        Self {
            plan_id: plan_id.to_string(),
            position: session.cursor,
            total: session.total(),
            next_step: session.next_step().cloned(),
        }
    }

    pub fn state(&self) -> PlanState {
        if self.position >= self.total {
            PlanState::Finished
        } else if self.position == 0 {
            PlanState::NotStarted
        } else {
            PlanState::InProgress
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Plan '{}' {}: {}/{} steps done.",
            self.plan_id,
            self.state(),
            self.position,
            self.total
        )?;
        match &self.next_step {
            Some(step) => write!(f, " Next step: {}", step),
            None => write!(f, " No steps remaining."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Vec<Step> {
        vec![Step::new("a.py"), Step::new("b.py"), Step::new("c.py")]
    }

    #[test]
    fn test_session_clamps_cursor() {
        let session = Session::new(abc(), 10);
        assert_eq!(session.cursor, 3);
        assert!(session.next_step().is_none());
    }

    #[test]
    fn test_advance_display() {
        let advance = Advance::Step {
            position: 1,
            total: 3,
            step: Step::new("a.py"),
        };
        assert_eq!(advance.to_string(), "Step 1/3: a.py |");

        let finished = Advance::Finished {
            plan_id: "p".to_string(),
            total: 3,
        };
        assert_eq!(finished.to_string(), "Plan 'p' finished: all 3 steps completed.");
    }

    #[test]
    fn test_status_states() {
        let status = PlanStatus::from_session("p", &Session::new(abc(), 0));
        assert_eq!(status.state(), PlanState::NotStarted);

        let status = PlanStatus::from_session("p", &Session::new(abc(), 2));
        assert_eq!(status.state(), PlanState::InProgress);

        let status = PlanStatus::from_session("p", &Session::new(abc(), 3));
        assert_eq!(status.state(), PlanState::Finished);

        let status = PlanStatus::from_session("empty", &Session::new(vec![], 0));
        assert_eq!(status.state(), PlanState::Finished);
    }

    #[test]
    fn test_status_display() {
        let steps: Vec<Step> = abc().iter().map(|s| s.annotated("run tests")).collect();
        let status = PlanStatus::from_session("p", &Session::new(steps, 0));
        assert_eq!(
            status.to_string(),
            "Plan 'p' not started: 0/3 steps done. Next step: a.py | run tests"
        );

        let status = PlanStatus::from_session("p", &Session::new(abc(), 3));
        assert_eq!(status.to_string(), "Plan 'p' finished: 3/3 steps done. No steps remaining.");
    }
}
