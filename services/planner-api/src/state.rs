//! Application state shared across request handlers.

use std::sync::Arc;

use crate::workspace::{WorkspaceError, WorkspaceHandle, WorkspaceName, WorkspaceRegistry};

/// Shared application state.
///
/// This is passed to all request handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    workspaces: WorkspaceRegistry,
}

impl AppState {
    pub fn new(workspaces: WorkspaceRegistry) -> Self {
        Self {
            inner: Arc::new(AppStateInner { workspaces }),
        }
    }

    pub fn workspaces(&self) -> &WorkspaceRegistry {
        &self.inner.workspaces
    }

    /// Resolves a raw path segment to a workspace handle.
    pub async fn workspace(&self, name: &str) -> Result<WorkspaceHandle, WorkspaceError> {
        let name = WorkspaceName::parse(name)?;
        self.inner.workspaces.get(&name).await
    }
}
