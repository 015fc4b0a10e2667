//! In-memory workspace and storage backend
//!
//! Holds workspaces, items and files in process memory and answers the
//! collaborator traits from them. Failures and latency can be injected per
//! call site, which makes it useful for offline embedding as well as tests.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::defaults::DEFAULT_FILES_ROOT;
use crate::errors::{SourceError, SourceResult};
use crate::models::{ContentLength, PathEntry, Workspace, WorkspaceItem};
use crate::sources::traits::{StorageClient, WorkspaceResolver};
use crate::utils::paths;

/// Call sites where a failure can be injected
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    ResolveItem,
    ListWorkspaces,
    ListItems,
    /// Recursive listing of one container, by container id
    ListPaths(String),
    /// Reading one file, by full path
    ReadFile(String),
}

/// A failure to return from an injected call site
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedFailure {
    Network(String),
    Http(u16, String),
    Condition(u32, String),
}

impl InjectedFailure {
    fn to_error(&self) -> SourceError {
        match self {
            InjectedFailure::Network(message) => SourceError::network(message.clone()),
            InjectedFailure::Http(status, message) => SourceError::http(*status, message.clone()),
            InjectedFailure::Condition(code, message) => {
                SourceError::condition(*code, message.clone())
            }
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    workspaces: Vec<Workspace>,
    item_workspaces: HashMap<String, String>,
    items: HashMap<String, Vec<WorkspaceItem>>,
    // keyed by (workspace id, container id); listing order is insertion order
    entries: HashMap<(String, String), Vec<PathEntry>>,
    contents: HashMap<String, String>,
    failures: HashMap<FailurePoint, InjectedFailure>,
    listing_delays: HashMap<String, Duration>,
    read_delay: Option<Duration>,
    reads: usize,
}

/// In-memory implementation of [`WorkspaceResolver`] and [`StorageClient`]
#[derive(Clone, Debug, Default)]
pub struct InMemoryLakehouse {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryLakehouse {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an accessible workspace; order of calls is listing order
    pub fn add_workspace(&self, id: &str, display_name: &str) -> &Self {
        self.inner().workspaces.push(Workspace {
            id: id.to_string(),
            display_name: Some(display_name.to_string()),
        });
        self
    }

    /// Make `item_id` resolve to `workspace_id`
    pub fn map_item(&self, item_id: &str, workspace_id: &str) -> &Self {
        self.inner()
            .item_workspaces
            .insert(item_id.to_string(), workspace_id.to_string());
        self
    }

    /// Add an item of any type to a workspace
    pub fn add_item(&self, workspace_id: &str, id: &str, display_name: &str, item_type: &str) -> &Self {
        self.inner()
            .items
            .entry(workspace_id.to_string())
            .or_default()
            .push(WorkspaceItem {
                id: id.to_string(),
                display_name: display_name.to_string(),
                item_type: item_type.to_string(),
            });
        self
    }

    /// Add a lakehouse container to a workspace
    pub fn add_lakehouse(&self, workspace_id: &str, id: &str, display_name: &str) -> &Self {
        self.add_item(workspace_id, id, display_name, "Lakehouse")
    }

    /// Add a file below a container's files root.
    ///
    /// Missing parent directories are listed as directory entries first, the
    /// way a recursive listing reports them.
    pub fn add_file(&self, workspace_id: &str, container_id: &str, relative_path: &str, content: &[u8]) -> &Self {
        let root = paths::container_root(container_id, DEFAULT_FILES_ROOT);
        let key = (workspace_id.to_string(), container_id.to_string());
        let mut inner = self.inner();

        let listing = inner.entries.entry(key).or_default();
        let segments: Vec<&str> = relative_path.split('/').collect();
        for depth in 1..segments.len() {
            let dir_name = format!("{root}/{}", segments[..depth].join("/"));
            if !listing.iter().any(|entry| entry.name == dir_name) {
                listing.push(PathEntry {
                    name: dir_name,
                    is_directory: true,
                    content_length: None,
                    last_modified: None,
                });
            }
        }
        listing.push(PathEntry {
            name: format!("{root}/{relative_path}"),
            is_directory: false,
            content_length: Some(ContentLength::Integer(content.len() as i64)),
            last_modified: Some(Utc::now().to_rfc3339()),
        });

        let full_path = paths::full_path(workspace_id, container_id, DEFAULT_FILES_ROOT, relative_path);
        inner.contents.insert(full_path, STANDARD.encode(content));
        drop(inner);
        self
    }

    /// Append a raw listing entry exactly as given
    pub fn add_entry(&self, workspace_id: &str, container_id: &str, entry: PathEntry) -> &Self {
        self.inner()
            .entries
            .entry((workspace_id.to_string(), container_id.to_string()))
            .or_default()
            .push(entry);
        self
    }

    /// Store already-encoded content for a full path, valid or not
    pub fn put_encoded(&self, full_path: &str, encoded: &str) -> &Self {
        self.inner()
            .contents
            .insert(full_path.to_string(), encoded.to_string());
        self
    }

    pub fn fail(&self, point: FailurePoint, failure: InjectedFailure) -> &Self {
        self.inner().failures.insert(point, failure);
        self
    }

    pub fn clear_failure(&self, point: &FailurePoint) -> &Self {
        self.inner().failures.remove(point);
        self
    }

    /// Delay the recursive listing of one container
    pub fn delay_listing(&self, container_id: &str, delay: Duration) -> &Self {
        self.inner()
            .listing_delays
            .insert(container_id.to_string(), delay);
        self
    }

    /// Delay every file read
    pub fn delay_reads(&self, delay: Duration) -> &Self {
        self.inner().read_delay = Some(delay);
        self
    }

    /// Number of `read_file_encoded` calls served so far
    pub fn read_count(&self) -> usize {
        self.inner().reads
    }

    fn check(&self, point: &FailurePoint) -> SourceResult<()> {
        match self.inner().failures.get(point) {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl WorkspaceResolver for InMemoryLakehouse {
    async fn resolve_workspace_for_item(&self, item_id: &str) -> SourceResult<String> {
        self.check(&FailurePoint::ResolveItem)?;
        self.inner()
            .item_workspaces
            .get(item_id)
            .cloned()
            .ok_or_else(|| SourceError::http(404, format!("Item {item_id} not found")))
    }

    async fn list_accessible_workspaces(&self) -> SourceResult<Vec<Workspace>> {
        self.check(&FailurePoint::ListWorkspaces)?;
        Ok(self.inner().workspaces.clone())
    }
}

#[async_trait]
impl StorageClient for InMemoryLakehouse {
    async fn list_items(&self, workspace_id: &str) -> SourceResult<Vec<WorkspaceItem>> {
        self.check(&FailurePoint::ListItems)?;
        Ok(self
            .inner()
            .items
            .get(workspace_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_paths_recursive(
        &self,
        workspace_id: &str,
        container_path: &str,
    ) -> SourceResult<Vec<PathEntry>> {
        let container_id = container_path
            .split('/')
            .next()
            .unwrap_or(container_path)
            .to_string();

        let delay = self.inner().listing_delays.get(&container_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.check(&FailurePoint::ListPaths(container_id.clone()))?;
        let prefix = format!("{container_path}/");
        Ok(self
            .inner()
            .entries
            .get(&(workspace_id.to_string(), container_id))
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.name.starts_with(&prefix))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn read_file_encoded(&self, full_path: &str) -> SourceResult<String> {
        let delay = {
            let mut inner = self.inner();
            inner.reads += 1;
            inner.read_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.check(&FailurePoint::ReadFile(full_path.to_string()))?;
        self.inner()
            .contents
            .get(full_path)
            .cloned()
            .ok_or_else(|| SourceError::http(404, format!("File {full_path} not found")))
    }
}
