//! Single-writer actor owning one workspace's planner.

use std::time::Duration;

use deskplan_planner::Planner;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use super::{WorkspaceError, WorkspaceName};
use crate::persistence::StatePersistence;

/// What a queued job does to the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Reads only; nothing is saved.
    Read,
    /// Changes rosters; saved, no reallocation.
    Roster,
    /// Changes teams or capacity and reallocates; saved after the
    /// reorganize delay.
    Reorganize,
}

impl JobKind {
    fn mutates(self) -> bool {
        !matches!(self, JobKind::Read)
    }
}

type Reply = Box<dyn FnOnce() + Send>;
type Job = Box<dyn FnOnce(&mut Planner) -> Reply + Send>;

struct Envelope {
    kind: JobKind,
    job: Job,
}

/// Handle for queueing commands on a workspace.
#[derive(Clone)]
pub struct WorkspaceHandle {
    name: WorkspaceName,
    tx: mpsc::Sender<Envelope>,
}

impl std::fmt::Debug for WorkspaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl WorkspaceHandle {
    pub fn name(&self) -> &WorkspaceName {
        &self.name
    }

    /// Runs `f` against the planner once every earlier command has finished.
    ///
    /// Mutating jobs are persisted before the result is returned.
    pub async fn run<T, F>(&self, kind: JobKind, f: F) -> Result<T, WorkspaceError>
    where
        F: FnOnce(&mut Planner) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |planner: &mut Planner| {
            let out = f(planner);
            Box::new(move || {
                let _ = tx.send(out);
            }) as Reply
        });

        self.tx
            .send(Envelope { kind, job })
            .await
            .map_err(|_| WorkspaceError::Stopped(self.name.to_string()))?;
        rx.await
            .map_err(|_| WorkspaceError::Stopped(self.name.to_string()))
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Live senders for this mailbox, this handle included.
    pub(crate) fn sender_count(&self) -> usize {
        self.tx.strong_count()
    }
}

pub(crate) struct WorkspaceActor {
    name: WorkspaceName,
    planner: Planner,
    persistence: StatePersistence,
    reorganize_delay: Duration,
    rx: mpsc::Receiver<Envelope>,
}

impl WorkspaceActor {
    /// Starts the actor task and returns its handle and the task to await
    /// on shutdown.
    pub(crate) fn spawn(
        name: WorkspaceName,
        planner: Planner,
        persistence: StatePersistence,
        reorganize_delay: Duration,
        mailbox_size: usize,
        shutdown: watch::Receiver<bool>,
    ) -> (WorkspaceHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(mailbox_size);
        let actor = Self {
            name: name.clone(),
            planner,
            persistence,
            reorganize_delay,
            rx,
        };
        let task = tokio::spawn(actor.run(shutdown));
        (WorkspaceHandle { name, tx }, task)
    }

    #[instrument(skip_all, fields(workspace = %self.name))]
    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(team_count = self.planner.teams().len(), "Workspace actor started");

        loop {
            tokio::select! {
                msg = self.rx.recv() => {
                    let Some(envelope) = msg else {
                        break;
                    };
                    self.handle(envelope).await;
                }
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.rx.close();
        while let Ok(envelope) = self.rx.try_recv() {
            self.handle(envelope).await;
        }
        info!("Workspace actor stopped");
    }

    async fn handle(&mut self, envelope: Envelope) {
        if envelope.kind == JobKind::Reorganize && !self.reorganize_delay.is_zero() {
            debug!(delay_ms = self.reorganize_delay.as_millis() as u64, "Reorganizing");
            tokio::time::sleep(self.reorganize_delay).await;
        }

        let reply = (envelope.job)(&mut self.planner);

        if envelope.kind.mutates() {
            if let Err(e) = self.persistence.save(&self.name, &self.planner.snapshot()) {
                error!(error = %e, "Failed to persist workspace state");
            }
        }

        reply();
    }
}
