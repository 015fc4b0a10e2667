//! Collaborator trait definitions

use async_trait::async_trait;

use crate::errors::SourceResult;
use crate::models::{PathEntry, Workspace, WorkspaceItem};

/// Identity and workspace lookup
#[async_trait]
pub trait WorkspaceResolver: Send + Sync {
    /// Resolve the workspace that owns an item
    async fn resolve_workspace_for_item(&self, item_id: &str) -> SourceResult<String>;

    /// Workspaces the caller can access, in the order the service returns them
    async fn list_accessible_workspaces(&self) -> SourceResult<Vec<Workspace>>;
}

/// Storage listing and read access
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// All items in a workspace, of every type
    async fn list_items(&self, workspace_id: &str) -> SourceResult<Vec<WorkspaceItem>>;

    /// Every entry below `container_path` (`{containerId}/{filesRoot}`), recursively.
    ///
    /// Entry names are container-qualified: `{containerId}/{filesRoot}/sub/doc.pdf`.
    async fn list_paths_recursive(
        &self,
        workspace_id: &str,
        container_path: &str,
    ) -> SourceResult<Vec<PathEntry>>;

    /// Full file content, base64 encoded for transport
    async fn read_file_encoded(&self, full_path: &str) -> SourceResult<String>;
}
