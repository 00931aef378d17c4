//! Workspace state persistence.
//!
//! Each workspace is saved as a single JSON snapshot at
//! `{state_dir}/{workspace}/{namespace}.json`. Saves write a temp file and
//! rename it over the previous snapshot so a crash never leaves a torn file.
//! Loads never fail: a missing file is a fresh workspace, and an unreadable
//! or corrupt one falls back to the default state with a warning.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use deskplan_planner::Snapshot;
use tracing::{debug, info, warn};

use crate::workspace::WorkspaceName;

/// Snapshot store rooted at a state directory.
#[derive(Debug, Clone)]
pub struct StatePersistence {
    root: PathBuf,
    namespace: String,
}

impl StatePersistence {
    pub fn new(root: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            namespace: namespace.into(),
        }
    }

    pub fn path_for(&self, workspace: &WorkspaceName) -> PathBuf {
        self.root
            .join(workspace.as_str())
            .join(format!("{}.json", self.namespace))
    }

    /// Loads a workspace snapshot, falling back to the default state.
    pub fn load(&self, workspace: &WorkspaceName) -> Snapshot {
        let path = self.path_for(workspace);
        if !path.exists() {
            debug!(workspace = %workspace, path = %path.display(), "No state file, starting fresh");
            return Snapshot::default();
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    workspace = %workspace,
                    path = %path.display(),
                    error = %e,
                    "Failed to read state file, starting fresh"
                );
                return Snapshot::default();
            }
        };

        match Snapshot::from_json(&content) {
            Ok(snapshot) => {
                info!(
                    workspace = %workspace,
                    path = %path.display(),
                    team_count = snapshot.teams.len(),
                    daily_capacity = snapshot.daily_capacity.get(),
                    "Loaded state from disk"
                );
                snapshot
            }
            Err(e) => {
                warn!(
                    workspace = %workspace,
                    path = %path.display(),
                    error = %e,
                    "Unusable state file, starting fresh"
                );
                Snapshot::default()
            }
        }
    }

    /// Saves a workspace snapshot atomically.
    pub fn save(&self, workspace: &WorkspaceName, snapshot: &Snapshot) -> Result<()> {
        let path = self.path_for(workspace);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("tmp");
        let content = snapshot.to_json().context("Failed to serialize state")?;

        fs::write(&tmp_path, &content)
            .with_context(|| format!("Failed to write temp file: {}", tmp_path.display()))?;

        fs::rename(&tmp_path, &path).with_context(|| {
            format!("Failed to rename {} -> {}", tmp_path.display(), path.display())
        })?;

        debug!(
            workspace = %workspace,
            path = %path.display(),
            team_count = snapshot.teams.len(),
            "Saved state to disk"
        );

        Ok(())
    }
}
