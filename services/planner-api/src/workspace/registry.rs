//! Lazily opened workspaces, keyed by name.

use std::collections::HashMap;
use std::time::Duration;

use deskplan_planner::{Planner, RandomShuffler};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::actor::{WorkspaceActor, WorkspaceHandle};
use super::{WorkspaceError, WorkspaceName};
use crate::persistence::StatePersistence;

/// Upper bound on how long [`WorkspaceRegistry::shutdown`] waits for actors
/// to drain their mailboxes.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings shared by every workspace actor.
#[derive(Debug, Clone)]
pub struct WorkspaceSettings {
    pub persistence: StatePersistence,
    pub reorganize_delay: Duration,
    pub mailbox_size: usize,
    /// An actor with no caller for this long is stopped; its state is
    /// reloaded from disk on the next request.
    pub idle_timeout: Duration,
}

struct OpenWorkspace {
    handle: WorkspaceHandle,
    task: JoinHandle<()>,
    last_used: Instant,
}

impl OpenWorkspace {
    /// Only the registry holds a sender, so no command is queued or running.
    fn is_idle_for(&self, timeout: Duration, now: Instant) -> bool {
        self.handle.sender_count() == 1 && now.duration_since(self.last_used) >= timeout
    }
}

/// Opens each workspace on first use and hands out its actor handle.
pub struct WorkspaceRegistry {
    settings: WorkspaceSettings,
    open: Mutex<HashMap<WorkspaceName, OpenWorkspace>>,
    shutdown_tx: watch::Sender<bool>,
}

impl WorkspaceRegistry {
    pub fn new(settings: WorkspaceSettings) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            settings,
            open: Mutex::new(HashMap::new()),
            shutdown_tx,
        }
    }

    /// Returns the handle for `name`, loading its state from disk the first
    /// time it is requested. Fails once shutdown has been signaled.
    pub async fn get(&self, name: &WorkspaceName) -> Result<WorkspaceHandle, WorkspaceError> {
        if *self.shutdown_tx.borrow() {
            return Err(WorkspaceError::Stopped(name.to_string()));
        }

        let mut open = self.open.lock().await;
        let now = Instant::now();
        Self::evict_locked(&mut open, self.settings.idle_timeout, now, Some(name));

        if let Some(entry) = open.get_mut(name) {
            if !entry.handle.is_closed() {
                entry.last_used = now;
                return Ok(entry.handle.clone());
            }
        }

        let snapshot = self.settings.persistence.load(name);
        let planner = Planner::restore(snapshot, RandomShuffler::new());
        info!(
            workspace = %name,
            team_count = planner.teams().len(),
            daily_capacity = planner.capacity().get(),
            "Opened workspace"
        );

        let (handle, task) = WorkspaceActor::spawn(
            name.clone(),
            planner,
            self.settings.persistence.clone(),
            self.settings.reorganize_delay,
            self.settings.mailbox_size,
            self.shutdown_tx.subscribe(),
        );
        open.insert(
            name.clone(),
            OpenWorkspace {
                handle: handle.clone(),
                task,
                last_used: now,
            },
        );
        Ok(handle)
    }

    pub async fn open_count(&self) -> usize {
        self.open.lock().await.len()
    }

    /// Stops actors that have been idle for the configured timeout. Returns
    /// how many were closed.
    pub async fn evict_idle(&self) -> usize {
        let mut open = self.open.lock().await;
        Self::evict_locked(&mut open, self.settings.idle_timeout, Instant::now(), None)
    }

    fn evict_locked(
        open: &mut HashMap<WorkspaceName, OpenWorkspace>,
        timeout: Duration,
        now: Instant,
        keep: Option<&WorkspaceName>,
    ) -> usize {
        let before = open.len();
        open.retain(|name, entry| {
            if keep == Some(name) || !entry.is_idle_for(timeout, now) {
                return true;
            }
            // Dropping the last sender ends the actor's receive loop.
            debug!(workspace = %name, "Closing idle workspace");
            false
        });
        before - open.len()
    }

    /// Signals every actor to drain its mailbox and stop, then waits for
    /// them, up to [`SHUTDOWN_TIMEOUT`] in total.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);

        let drained: Vec<_> = self.open.lock().await.drain().collect();
        let deadline = Instant::now() + SHUTDOWN_TIMEOUT;
        for (name, entry) in drained {
            drop(entry.handle);
            match tokio::time::timeout_at(deadline, entry.task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(workspace = %name, error = %e, "Workspace actor panicked"),
                Err(_) => warn!(workspace = %name, "Workspace actor did not shut down in time"),
            }
        }
    }

    /// Periodically closes idle workspaces until shutdown is signaled. Ticks
    /// at most once a second.
    pub async fn run_evictor(&self, interval: Duration) {
        let mut shutdown = self.shutdown_tx.subscribe();
        let mut ticker = tokio::time::interval(interval.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let closed = self.evict_idle().await;
                    if closed > 0 {
                        info!(closed, "Closed idle workspaces");
                    }
                }
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::JobKind;
    use deskplan_planner::NewTeam;
    use std::env::temp_dir;

    fn registry(label: &str, idle_timeout: Duration) -> WorkspaceRegistry {
        let dir = temp_dir().join(format!("deskplan-registry-{label}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        WorkspaceRegistry::new(WorkspaceSettings {
            persistence: StatePersistence::new(dir, "deskplan-app-data"),
            reorganize_delay: Duration::ZERO,
            mailbox_size: 4,
            idle_timeout,
        })
    }

    fn ws(name: &str) -> WorkspaceName {
        WorkspaceName::parse(name).unwrap()
    }

    #[tokio::test]
    async fn test_idle_workspaces_are_closed() {
        let registry = registry("idle", Duration::ZERO);
        for i in 0..20 {
            let handle = registry.get(&ws(&format!("ghost{i}"))).await.unwrap();
            handle.run(JobKind::Read, |p| p.teams().len()).await.unwrap();
        }
        assert!(registry.open_count().await <= 1);

        registry.evict_idle().await;
        assert_eq!(registry.open_count().await, 0);
    }

    #[tokio::test]
    async fn test_held_handle_is_not_evicted() {
        let registry = registry("held", Duration::ZERO);
        let handle = registry.get(&ws("busy")).await.unwrap();

        assert_eq!(registry.evict_idle().await, 0);
        drop(handle);
        assert_eq!(registry.evict_idle().await, 1);
    }

    #[tokio::test]
    async fn test_recent_workspace_is_kept() {
        let registry = registry("recent", Duration::from_secs(3600));
        registry.get(&ws("warm")).await.unwrap();
        assert_eq!(registry.evict_idle().await, 0);
        assert_eq!(registry.open_count().await, 1);
    }

    #[tokio::test]
    async fn test_reopened_workspace_reloads_from_disk() {
        let registry = registry("reopen", Duration::ZERO);
        let handle = registry.get(&ws("main")).await.unwrap();
        handle
            .run(JobKind::Reorganize, |p| p.add_team(NewTeam::new("Ops", 4)).map(|_| ()))
            .await
            .unwrap()
            .unwrap();
        drop(handle);
        assert_eq!(registry.evict_idle().await, 1);

        let handle = registry.get(&ws("main")).await.unwrap();
        let teams = handle.run(JobKind::Read, |p| p.teams().len()).await.unwrap();
        assert_eq!(teams, 1);
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_queued_work() {
        let dir = temp_dir().join(format!("deskplan-registry-drain-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let persistence = StatePersistence::new(dir, "deskplan-app-data");
        let registry = WorkspaceRegistry::new(WorkspaceSettings {
            persistence: persistence.clone(),
            reorganize_delay: Duration::from_millis(300),
            mailbox_size: 4,
            idle_timeout: Duration::from_secs(3600),
        });

        let handle = registry.get(&ws("main")).await.unwrap();
        let pending = tokio::spawn(async move {
            handle
                .run(JobKind::Reorganize, |p| p.add_team(NewTeam::new("Ops", 4)).map(|_| ()))
                .await
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        registry.shutdown().await;

        let saved = persistence.load(&ws("main"));
        assert_eq!(saved.teams.len(), 1);
        assert!(pending.await.unwrap().unwrap().is_ok());
    }
}
