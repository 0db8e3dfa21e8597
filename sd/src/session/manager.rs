//! SessionManager - actor that owns the session table
//!
//! The table and both stores live on one dedicated thread. Callers hold a
//! cloneable handle and exchange commands over a channel, so cursor updates
//! for a plan are serialized without any lock.

use std::path::Path;

use eyre::Context;
use planstore::{PlanStore, StateStore, Step};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::messages::{SessionCommand, SessionError, SessionResponse};
use super::table::SessionTable;
use super::types::{Advance, PlanStatus};

/// Handle to send commands to the SessionManager
#[derive(Clone)]
pub struct SessionManager {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionManager {
    /// Open the plan and state directories and spawn the actor
    pub fn open(plan_dir: impl AsRef<Path>, state_dir: impl AsRef<Path>) -> eyre::Result<Self> {
        debug!(plan_dir = %plan_dir.as_ref().display(), state_dir = %state_dir.as_ref().display(), "open: called");
        let plans = PlanStore::open(plan_dir.as_ref()).context("Failed to open plan directory")?;
        let states = StateStore::open(state_dir.as_ref()).context("Failed to open state directory")?;
        Self::spawn(plans, states)
    }

    /// Spawn a new SessionManager actor over existing stores
    pub fn spawn(plans: PlanStore, states: StateStore) -> eyre::Result<Self> {
        let (tx, rx) = mpsc::channel(256);
        let table = SessionTable::new(plans, states);

        std::thread::Builder::new()
            .name("session-actor".to_string())
            .spawn(move || actor_loop(table, rx))
            .context("Failed to spawn session actor thread")?;

        info!("SessionManager spawned");
        Ok(Self { tx })
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<SessionResponse<T>>) -> SessionCommand,
    ) -> SessionResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(command(reply_tx))
            .await
            .map_err(|_| SessionError::ChannelError)?;
        reply_rx.await.map_err(|_| SessionError::ChannelError)?
    }

    /// Write a plan and start it from the first step; returns the step count
    pub async fn create_plan(&self, id: &str, steps: Vec<Step>) -> SessionResponse<usize> {
        debug!(%id, step_count = steps.len(), "create_plan: called");
        let id = id.to_string();
        self.request(|reply| SessionCommand::CreatePlan { id, steps, reply })
            .await
    }

    /// Hand out the next step of a plan
    pub async fn advance(&self, id: &str) -> SessionResponse<Advance> {
        debug!(%id, "advance: called");
        let id = id.to_string();
        self.request(|reply| SessionCommand::Advance { id, reply }).await
    }

    /// Move a plan's cursor back to the first step
    pub async fn reset(&self, id: &str) -> SessionResponse<()> {
        debug!(%id, "reset: called");
        let id = id.to_string();
        self.request(|reply| SessionCommand::Reset { id, reply }).await
    }

    /// Report a plan's progress
    pub async fn status(&self, id: &str) -> SessionResponse<PlanStatus> {
        debug!(%id, "status: called");
        let id = id.to_string();
        self.request(|reply| SessionCommand::Status { id, reply }).await
    }

    /// Annotate every step and restart the plan; returns the step count
    pub async fn add_instruction(&self, id: &str, instruction: &str) -> SessionResponse<usize> {
        debug!(%id, %instruction, "add_instruction: called");
        let id = id.to_string();
        let instruction = instruction.to_string();
        self.request(|reply| SessionCommand::AddInstruction { id, instruction, reply })
            .await
    }

    /// Re-read a plan edited on disk and restart it; returns the step count
    pub async fn reload_after_edit(&self, id: &str) -> SessionResponse<usize> {
        debug!(%id, "reload_after_edit: called");
        let id = id.to_string();
        self.request(|reply| SessionCommand::ReloadAfterEdit { id, reply })
            .await
    }

    /// Stop the actor
    pub async fn shutdown(&self) -> SessionResponse<()> {
        debug!("shutdown: called");
        self.tx
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| SessionError::ChannelError)
    }
}

/// The actor loop that owns the table and processes commands
fn actor_loop(mut table: SessionTable, mut rx: mpsc::Receiver<SessionCommand>) {
    debug!("SessionManager actor started");

    while let Some(cmd) = rx.blocking_recv() {
        match cmd {
            SessionCommand::CreatePlan { id, steps, reply } => {
                debug!(%id, "actor_loop: CreatePlan command");
                let _ = reply.send(table.create_plan(&id, steps));
            }

            SessionCommand::Advance { id, reply } => {
                debug!(%id, "actor_loop: Advance command");
                let _ = reply.send(table.advance(&id));
            }

            SessionCommand::Reset { id, reply } => {
                debug!(%id, "actor_loop: Reset command");
                let _ = reply.send(table.reset(&id));
            }

            SessionCommand::Status { id, reply } => {
                debug!(%id, "actor_loop: Status command");
                let _ = reply.send(table.status(&id));
            }

            SessionCommand::AddInstruction { id, instruction, reply } => {
                debug!(%id, "actor_loop: AddInstruction command");
                let _ = reply.send(table.add_instruction(&id, &instruction));
            }

            SessionCommand::ReloadAfterEdit { id, reply } => {
                debug!(%id, "actor_loop: ReloadAfterEdit command");
                let _ = reply.send(table.reload_after_edit(&id));
            }

            SessionCommand::Shutdown => {
                debug!("actor_loop: Shutdown command");
                info!("SessionManager shutting down");
                break;
            }
        }
    }

    debug!("SessionManager actor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn abc() -> Vec<Step> {
        vec![Step::new("a.py"), Step::new("b.py"), Step::new("c.py")]
    }

    #[tokio::test]
    async fn test_session_manager_walkthrough() {
        let temp = tempdir().unwrap();
        let manager = SessionManager::open(temp.path().join("plans"), temp.path().join("state")).unwrap();

        let total = manager.create_plan("p", abc()).await.unwrap();
        assert_eq!(total, 3);

        assert_eq!(manager.advance("p").await.unwrap().to_string(), "Step 1/3: a.py |");
        assert_eq!(manager.advance("p").await.unwrap().to_string(), "Step 2/3: b.py |");

        manager.reset("p").await.unwrap();
        assert_eq!(manager.advance("p").await.unwrap().to_string(), "Step 1/3: a.py |");

        let status = manager.status("p").await.unwrap();
        assert_eq!(status.position, 1);

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_session_manager_not_found() {
        let temp = tempdir().unwrap();
        let manager = SessionManager::open(temp.path().join("plans"), temp.path().join("state")).unwrap();

        let result = manager.status("nonexistent").await;
        assert!(matches!(result.unwrap_err(), SessionError::NotFound(_)));

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_session_manager_survives_restart() {
        let temp = tempdir().unwrap();
        let plans = temp.path().join("plans");
        let state = temp.path().join("state");

        let first = SessionManager::open(&plans, &state).unwrap();
        first.create_plan("p", abc()).await.unwrap();
        first.advance("p").await.unwrap();
        first.advance("p").await.unwrap();
        first.shutdown().await.unwrap();

        let second = SessionManager::open(&plans, &state).unwrap();
        assert_eq!(second.advance("p").await.unwrap().to_string(), "Step 3/3: c.py |");
        second.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_reload_after_external_edit() {
        let temp = tempdir().unwrap();
        let plans = PlanStore::open(temp.path().join("plans")).unwrap();
        let states = StateStore::open(temp.path().join("state")).unwrap();
        let manager = SessionManager::spawn(plans.clone(), states).unwrap();

        manager.create_plan("p", abc()).await.unwrap();
        manager.advance("p").await.unwrap();

        plans.create("p", &[Step::new("x.py"), Step::new("y.py")]).unwrap();
        let total = manager.reload_after_edit("p").await.unwrap();

        assert_eq!(total, 2);
        assert_eq!(manager.advance("p").await.unwrap().to_string(), "Step 1/2: x.py |");
        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_advances_hand_out_each_step_once() {
        let temp = tempdir().unwrap();
        let manager = SessionManager::open(temp.path().join("plans"), temp.path().join("state")).unwrap();
        let steps: Vec<Step> = (0..20).map(|i| Step::new(format!("f{}.rs", i))).collect();
        manager.create_plan("p", steps).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..25 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move { manager.advance("p").await.unwrap() }));
        }

        let mut positions = Vec::new();
        let mut finished = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Advance::Step { position, .. } => positions.push(position),
                Advance::Finished { .. } => finished += 1,
            }
        }

        positions.sort();
        assert_eq!(positions, (1..=20).collect::<Vec<_>>());
        assert_eq!(finished, 5);
        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_commands_after_shutdown_fail() {
        let temp = tempdir().unwrap();
        let manager = SessionManager::open(temp.path().join("plans"), temp.path().join("state")).unwrap();
        manager.shutdown().await.unwrap();

        // Give the actor thread time to exit and drop the receiver
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let result = manager.status("p").await;
        assert!(matches!(result.unwrap_err(), SessionError::ChannelError));
    }
}
