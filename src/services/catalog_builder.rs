//! Catalog builder
//!
//! Turns an optional item id into a flat, ordered list of files:
//!
//! 1. resolve the workspace (item lookup, then the first accessible workspace)
//! 2. list the workspace's items and keep the storage containers
//! 3. list every container's files root recursively, skipping containers whose
//!    listing fails
//! 4. flatten the entries into [`FileRecord`]s
//!
//! The builder only produces a [`BuildOutcome`]; committing it to view state is
//! the caller's job, so no partial listing is ever visible.

use futures::{StreamExt, stream};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::CatalogSettings;
use crate::errors::{CatalogError, CatalogResult, SourceError, SourceResult};
use crate::models::{Container, FileRecord, PathEntry};
use crate::observability::{DiagnosticEvent, DiagnosticSink, TracingSink};
use crate::sources::{StorageClient, WorkspaceResolver};
use crate::utils::paths;

/// Counters for one completed build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub containers_scanned: usize,
    pub containers_skipped: usize,
    pub files: usize,
    pub elapsed: Duration,
}

/// Result of one build cycle
#[derive(Debug)]
pub enum BuildOutcome {
    /// Every container was attempted; `files` holds what could be listed
    Completed {
        workspace_id: String,
        files: Vec<FileRecord>,
        summary: BuildSummary,
    },
    /// Neither the item lookup nor the workspace list produced a workspace
    NoWorkspace,
    /// The workspace has no storage containers
    NoContainers { workspace_id: String },
    /// Resolution or the item listing itself failed
    Failed {
        workspace_id: Option<String>,
        error: CatalogError,
    },
}

pub struct CatalogBuilder {
    resolver: Arc<dyn WorkspaceResolver>,
    storage: Arc<dyn StorageClient>,
    diagnostics: Arc<dyn DiagnosticSink>,
    settings: CatalogSettings,
}

impl CatalogBuilder {
    pub fn new(
        resolver: Arc<dyn WorkspaceResolver>,
        storage: Arc<dyn StorageClient>,
        settings: CatalogSettings,
    ) -> Self {
        Self {
            resolver,
            storage,
            diagnostics: Arc::new(TracingSink),
            settings,
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// Run one build cycle. Never panics or returns early with an error; every
    /// failure ends up in the outcome or the diagnostic sink.
    pub async fn build(&self, item_id: Option<&str>) -> BuildOutcome {
        let started = Instant::now();

        let workspace_id = match self.resolve_workspace(item_id).await {
            Ok(Some(workspace_id)) => workspace_id,
            Ok(None) => {
                info!("No workspace available for catalog build");
                return BuildOutcome::NoWorkspace;
            }
            Err(error) => {
                self.diagnostics.record(DiagnosticEvent::BuildFailed {
                    reason: error.to_string(),
                });
                return BuildOutcome::Failed {
                    workspace_id: None,
                    error,
                };
            }
        };

        let containers = match self.discover_containers(&workspace_id).await {
            Ok(containers) => containers,
            Err(error) => {
                self.diagnostics.record(DiagnosticEvent::BuildFailed {
                    reason: error.to_string(),
                });
                return BuildOutcome::Failed {
                    workspace_id: Some(workspace_id),
                    error,
                };
            }
        };

        if containers.is_empty() {
            info!("Workspace {} has no {} items", workspace_id, self.settings.container_type);
            return BuildOutcome::NoContainers { workspace_id };
        }

        let (files, skipped) = self.enumerate_containers(&workspace_id, &containers).await;
        let summary = BuildSummary {
            containers_scanned: containers.len(),
            containers_skipped: skipped,
            files: files.len(),
            elapsed: started.elapsed(),
        };

        self.diagnostics.record(DiagnosticEvent::BuildCompleted {
            workspace_id: workspace_id.clone(),
            containers_scanned: summary.containers_scanned,
            containers_skipped: summary.containers_skipped,
            files: summary.files,
            elapsed: summary.elapsed,
        });

        BuildOutcome::Completed {
            workspace_id,
            files,
            summary,
        }
    }

    /// Item lookup first; a failed lookup is reported and falls through to the
    /// first accessible workspace.
    async fn resolve_workspace(&self, item_id: Option<&str>) -> CatalogResult<Option<String>> {
        if let Some(item_id) = item_id.filter(|id| !id.trim().is_empty()) {
            match self.resolver.resolve_workspace_for_item(item_id).await {
                Ok(workspace_id) if !workspace_id.is_empty() => {
                    debug!("Item {} belongs to workspace {}", item_id, workspace_id);
                    return Ok(Some(workspace_id));
                }
                Ok(_) => {
                    self.diagnostics.record(DiagnosticEvent::WorkspaceResolutionFailed {
                        item_id: item_id.to_string(),
                        reason: "resolver returned an empty workspace id".to_string(),
                    });
                }
                Err(e) => {
                    self.diagnostics.record(DiagnosticEvent::WorkspaceResolutionFailed {
                        item_id: item_id.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let workspaces = self.resolver.list_accessible_workspaces().await?;
        let first = workspaces.into_iter().map(|w| w.id).find(|id| !id.is_empty());
        if let Some(workspace_id) = &first {
            self.diagnostics.record(DiagnosticEvent::WorkspaceFallbackUsed {
                workspace_id: workspace_id.clone(),
            });
        }
        Ok(first)
    }

    async fn discover_containers(&self, workspace_id: &str) -> CatalogResult<Vec<Container>> {
        let items = self.storage.list_items(workspace_id).await?;
        let containers: Vec<Container> = items
            .into_iter()
            .filter(|item| item.item_type == self.settings.container_type)
            .map(Container::from)
            .collect();

        debug!(
            "Found {} {} containers in workspace {}",
            containers.len(),
            self.settings.container_type,
            workspace_id
        );
        Ok(containers)
    }

    /// List every container and flatten the results in container order.
    ///
    /// Listings may run concurrently, but `buffered` yields them in the order
    /// the containers were discovered. Returns the files and the skip count.
    async fn enumerate_containers(
        &self,
        workspace_id: &str,
        containers: &[Container],
    ) -> (Vec<FileRecord>, usize) {
        let listings: Vec<(&Container, SourceResult<Vec<PathEntry>>)> = stream::iter(containers)
            .map(|container| async move {
                (container, self.list_container(workspace_id, container).await)
            })
            .buffered(self.settings.listing_concurrency.max(1))
            .collect()
            .await;

        let mut files = Vec::new();
        let mut seen = HashSet::new();
        let mut skipped = 0;

        for (container, listing) in listings {
            let entries = match listing {
                Ok(entries) => entries,
                Err(e) => {
                    skipped += 1;
                    self.diagnostics.record(DiagnosticEvent::ContainerSkipped {
                        container_id: container.id.clone(),
                        container_name: container.display_name.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            for entry in &entries {
                let Some(record) =
                    flatten_entry(workspace_id, container, entry, &self.settings.files_root)
                else {
                    continue;
                };
                if seen.insert(record.full_path.clone()) {
                    files.push(record);
                } else {
                    self.diagnostics.record(DiagnosticEvent::DuplicatePathDropped {
                        full_path: record.full_path,
                    });
                }
            }
        }

        (files, skipped)
    }

    async fn list_container(
        &self,
        workspace_id: &str,
        container: &Container,
    ) -> SourceResult<Vec<PathEntry>> {
        let root = paths::container_root(&container.id, &self.settings.files_root);
        let listing = self.storage.list_paths_recursive(workspace_id, &root);

        match self.settings.listing_timeout {
            Some(limit) => tokio::time::timeout(limit, listing)
                .await
                .map_err(|_| SourceError::timeout(format!("listing {root}"), limit))?,
            None => listing.await,
        }
    }
}

/// Flatten one listing entry; directories and the files root itself yield `None`.
pub fn flatten_entry(
    workspace_id: &str,
    container: &Container,
    entry: &PathEntry,
    files_root: &str,
) -> Option<FileRecord> {
    if entry.is_directory {
        return None;
    }

    let relative_path = paths::relative_to_root(&entry.name, &container.id, files_root)?;
    Some(FileRecord {
        full_path: paths::full_path(workspace_id, &container.id, files_root, &relative_path),
        name: paths::leaf_name(&relative_path).to_string(),
        size: entry.content_length.as_ref().map_or(0, |length| length.to_size()),
        last_modified: entry.last_modified.clone().unwrap_or_default(),
        container_name: container.display_name.clone(),
        container_id: container.id.clone(),
        relative_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::user_message;
    use crate::models::ContentLength;
    use crate::observability::RecordingSink;
    use crate::sources::{FailurePoint, InMemoryLakehouse, InjectedFailure};

    fn container(id: &str, name: &str) -> Container {
        Container {
            id: id.to_string(),
            display_name: name.to_string(),
        }
    }

    fn builder(lake: &InMemoryLakehouse, settings: CatalogSettings) -> (CatalogBuilder, RecordingSink) {
        let sink = RecordingSink::new();
        let lake = Arc::new(lake.clone());
        let builder = CatalogBuilder::new(lake.clone(), lake, settings)
            .with_diagnostics(Arc::new(sink.clone()));
        (builder, sink)
    }

    fn two_lakehouses() -> InMemoryLakehouse {
        let lake = InMemoryLakehouse::new();
        lake.add_workspace("ws1", "Main")
            .map_item("item-1", "ws1")
            .add_lakehouse("ws1", "lhA", "Alpha")
            .add_item("ws1", "nb1", "Notebook", "Notebook")
            .add_lakehouse("ws1", "lhB", "Beta")
            .add_file("ws1", "lhA", "raw/a1.csv", b"a1")
            .add_file("ws1", "lhA", "a2.json", b"{}")
            .add_file("ws1", "lhB", "b1.pdf", b"%PDF");
        lake
    }

    fn names(files: &[FileRecord]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_flatten_strips_files_root() {
        let entry = PathEntry {
            name: "c1/Files/sub/doc.pdf".to_string(),
            is_directory: false,
            content_length: Some(ContentLength::Integer(42)),
            last_modified: None,
        };
        let record = flatten_entry("ws1", &container("c1", "Sales"), &entry, "Files")
            .expect("file entry flattens");

        assert_eq!(record.relative_path, "sub/doc.pdf");
        assert_eq!(record.name, "doc.pdf");
        assert_eq!(record.full_path, "ws1/c1/Files/sub/doc.pdf");
        assert_eq!(record.size, 42);
        assert_eq!(record.last_modified, "");
        assert_eq!(record.container_name, "Sales");
    }

    #[test]
    fn test_flatten_keeps_file_named_like_the_root() {
        let entry = PathEntry {
            name: "c1/Files/Files".to_string(),
            is_directory: false,
            content_length: Some(ContentLength::Integer(7)),
            last_modified: None,
        };
        let record = flatten_entry("ws1", &container("c1", "Sales"), &entry, "Files")
            .expect("file named Files is kept");

        assert_eq!(record.relative_path, "Files");
        assert_eq!(record.name, "Files");
        assert_eq!(record.full_path, "ws1/c1/Files/Files");
    }

    #[test]
    fn test_flatten_skips_directories_and_normalizes_size() {
        let dir = PathEntry {
            name: "c1/Files/sub".to_string(),
            is_directory: true,
            content_length: None,
            last_modified: None,
        };
        assert!(flatten_entry("ws1", &container("c1", "Sales"), &dir, "Files").is_none());

        let odd = PathEntry {
            name: "c1/Files/odd.bin".to_string(),
            is_directory: false,
            content_length: Some(ContentLength::Text("not-a-number".to_string())),
            last_modified: Some("2024-01-01T00:00:00Z".to_string()),
        };
        let record = flatten_entry("ws1", &container("c1", "Sales"), &odd, "Files")
            .expect("file entry flattens");
        assert_eq!(record.size, 0);
        assert_eq!(record.name, "odd.bin");
    }

    #[tokio::test]
    async fn test_build_lists_files_in_container_order() {
        let lake = two_lakehouses();
        let (builder, sink) = builder(&lake, CatalogSettings::default());

        let BuildOutcome::Completed { workspace_id, files, summary } = builder.build(Some("item-1")).await else {
            panic!("expected a completed build");
        };

        assert_eq!(workspace_id, "ws1");
        assert_eq!(names(&files), vec!["a1.csv", "a2.json", "b1.pdf"]);
        assert!(files.iter().all(|f| !f.full_path.ends_with("/raw")));
        assert_eq!(summary.containers_scanned, 2);
        assert_eq!(summary.containers_skipped, 0);
        assert!(
            sink.events()
                .iter()
                .any(|e| matches!(e, DiagnosticEvent::BuildCompleted { files: 3, .. }))
        );
    }

    #[tokio::test]
    async fn test_failed_container_is_skipped() {
        let lake = two_lakehouses();
        lake.fail(
            FailurePoint::ListPaths("lhA".into()),
            InjectedFailure::Http(403, "Forbidden".into()),
        );
        let (builder, sink) = builder(&lake, CatalogSettings::default());

        let BuildOutcome::Completed { files, summary, .. } = builder.build(Some("item-1")).await else {
            panic!("expected a completed build");
        };

        assert_eq!(names(&files), vec!["b1.pdf"]);
        assert_eq!(summary.containers_skipped, 1);
        assert!(sink.events().iter().any(|e| matches!(
            e,
            DiagnosticEvent::ContainerSkipped { container_id, .. } if container_id == "lhA"
        )));
    }

    #[tokio::test]
    async fn test_resolution_failure_falls_back_to_first_workspace() {
        let lake = InMemoryLakehouse::new();
        lake.add_workspace("ws1", "First")
            .add_workspace("ws2", "Second")
            .add_lakehouse("ws1", "lh1", "Sales")
            .add_file("ws1", "lh1", "x.txt", b"x")
            .fail(FailurePoint::ResolveItem, InjectedFailure::Network("offline".into()));
        let (builder, sink) = builder(&lake, CatalogSettings::default());

        let BuildOutcome::Completed { workspace_id, files, .. } = builder.build(Some("item-1")).await else {
            panic!("expected a completed build");
        };

        assert_eq!(workspace_id, "ws1");
        assert_eq!(files.len(), 1);
        let events = sink.events();
        assert!(matches!(events[0], DiagnosticEvent::WorkspaceResolutionFailed { .. }));
        assert!(matches!(&events[1], DiagnosticEvent::WorkspaceFallbackUsed { workspace_id } if workspace_id == "ws1"));
    }

    #[tokio::test]
    async fn test_without_item_id_uses_workspace_list() {
        let lake = two_lakehouses();
        let (builder, _) = builder(&lake, CatalogSettings::default());

        let outcome = builder.build(None).await;
        assert!(matches!(outcome, BuildOutcome::Completed { ref workspace_id, .. } if workspace_id == "ws1"));
    }

    #[tokio::test]
    async fn test_no_workspace() {
        let lake = InMemoryLakehouse::new();
        let (builder, _) = builder(&lake, CatalogSettings::default());
        assert!(matches!(builder.build(Some("item-1")).await, BuildOutcome::NoWorkspace));
    }

    #[tokio::test]
    async fn test_no_containers() {
        let lake = InMemoryLakehouse::new();
        lake.add_workspace("ws1", "Main")
            .add_item("ws1", "nb1", "Notebook", "Notebook");
        let (builder, _) = builder(&lake, CatalogSettings::default());

        let outcome = builder.build(None).await;
        assert!(matches!(outcome, BuildOutcome::NoContainers { ref workspace_id } if workspace_id == "ws1"));
    }

    #[tokio::test]
    async fn test_item_listing_failure_fails_build() {
        let lake = two_lakehouses();
        lake.fail(FailurePoint::ListItems, InjectedFailure::Condition(2001, "login".into()));
        let (builder, sink) = builder(&lake, CatalogSettings::default());

        let BuildOutcome::Failed { workspace_id, error } = builder.build(Some("item-1")).await else {
            panic!("expected a failed build");
        };
        assert_eq!(workspace_id.as_deref(), Some("ws1"));
        assert_eq!(
            user_message(&error),
            crate::errors::KnownCondition::InteractiveAuthRequired.message()
        );
        assert!(matches!(sink.events().last(), Some(DiagnosticEvent::BuildFailed { .. })));
    }

    #[tokio::test]
    async fn test_workspace_list_failure_fails_build() {
        let lake = InMemoryLakehouse::new();
        lake.fail(FailurePoint::ListWorkspaces, InjectedFailure::Http(500, "boom".into()));
        let (builder, _) = builder(&lake, CatalogSettings::default());

        let outcome = builder.build(None).await;
        assert!(matches!(outcome, BuildOutcome::Failed { workspace_id: None, .. }));
    }

    #[tokio::test]
    async fn test_duplicate_paths_keep_first_record() {
        let lake = two_lakehouses();
        lake.add_entry(
            "ws1",
            "lhB",
            PathEntry {
                name: "lhB/Files/b1.pdf".to_string(),
                is_directory: false,
                content_length: Some(ContentLength::Integer(999)),
                last_modified: None,
            },
        );
        let (builder, sink) = builder(&lake, CatalogSettings::default());

        let BuildOutcome::Completed { files, .. } = builder.build(None).await else {
            panic!("expected a completed build");
        };

        let unique: HashSet<_> = files.iter().map(|f| f.full_path.as_str()).collect();
        assert_eq!(unique.len(), files.len());
        let b1 = files.iter().find(|f| f.name == "b1.pdf").expect("b1 listed");
        assert_eq!(b1.size, 4);
        assert!(sink.events().iter().any(|e| matches!(e, DiagnosticEvent::DuplicatePathDropped { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_listing_keeps_container_order() {
        let lake = two_lakehouses();
        lake.delay_listing("lhA", Duration::from_millis(500))
            .delay_listing("lhB", Duration::from_millis(10));
        let settings = CatalogSettings {
            listing_concurrency: 4,
            ..CatalogSettings::default()
        };
        let (builder, _) = builder(&lake, settings);

        let BuildOutcome::Completed { files, .. } = builder.build(None).await else {
            panic!("expected a completed build");
        };
        assert_eq!(names(&files), vec!["a1.csv", "a2.json", "b1.pdf"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listing_timeout_skips_container() {
        let lake = two_lakehouses();
        lake.delay_listing("lhA", Duration::from_secs(120));
        let settings = CatalogSettings {
            listing_timeout: Some(Duration::from_secs(5)),
            ..CatalogSettings::default()
        };
        let (builder, sink) = builder(&lake, settings);

        let BuildOutcome::Completed { files, summary, .. } = builder.build(None).await else {
            panic!("expected a completed build");
        };
        assert_eq!(names(&files), vec!["b1.pdf"]);
        assert_eq!(summary.containers_skipped, 1);
        assert!(sink.events().iter().any(|e| matches!(
            e,
            DiagnosticEvent::ContainerSkipped { reason, .. } if reason.contains("Timed out")
        )));
    }

    #[tokio::test]
    async fn test_custom_container_type() {
        let lake = InMemoryLakehouse::new();
        lake.add_workspace("ws1", "Main")
            .add_item("ws1", "wh1", "Warehouse One", "Warehouse")
            .add_file("ws1", "wh1", "w.txt", b"w");
        let settings = CatalogSettings {
            container_type: "Warehouse".to_string(),
            ..CatalogSettings::default()
        };
        let (builder, _) = builder(&lake, settings);

        let BuildOutcome::Completed { files, .. } = builder.build(None).await else {
            panic!("expected a completed build");
        };
        assert_eq!(names(&files), vec!["w.txt"]);
        assert_eq!(files[0].container_name, "Warehouse One");
    }
}
