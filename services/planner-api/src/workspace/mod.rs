//! Workspaces: one planner per workspace, each owned by a single-writer actor.
//!
//! Every command for a workspace is queued on that workspace's mailbox and
//! executed one at a time against its [`Planner`](deskplan_planner::Planner),
//! so no locking is needed around planner state.

mod actor;
mod registry;

pub use actor::{JobKind, WorkspaceHandle};
pub use registry::{WorkspaceRegistry, WorkspaceSettings, SHUTDOWN_TIMEOUT};

use thiserror::Error;

/// Longest accepted workspace name.
pub const MAX_WORKSPACE_NAME_LEN: usize = 64;

/// Errors from the workspace layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("invalid workspace name: {0}")]
    InvalidName(String),

    /// The actor exited (shutdown in progress).
    #[error("workspace {0} is not accepting commands")]
    Stopped(String),
}

/// A validated workspace name, safe to use as a path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkspaceName(String);

impl WorkspaceName {
    /// Accepts 1 to 64 characters of `[A-Za-z0-9_-]`.
    pub fn parse(name: &str) -> Result<Self, WorkspaceError> {
        let valid = !name.is_empty()
            && name.len() <= MAX_WORKSPACE_NAME_LEN
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(WorkspaceError::InvalidName(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorkspaceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_name_rules() {
        assert!(WorkspaceName::parse("office-madrid_2").is_ok());
        assert!(WorkspaceName::parse("").is_err());
        assert!(WorkspaceName::parse("../etc").is_err());
        assert!(WorkspaceName::parse("a/b").is_err());
        assert!(WorkspaceName::parse(&"x".repeat(65)).is_err());
        assert!(WorkspaceName::parse(&"x".repeat(64)).is_ok());
    }
}
