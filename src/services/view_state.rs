//! Observable catalog view state
//!
//! [`CatalogViewState`] is the single value a presentation layer renders from.
//! Build results are committed atomically by [`CatalogViewState::apply_build`];
//! the filter is derived on read and never modifies `files`.

use serde::Serialize;

use crate::errors::messages::{NO_CONTAINERS_MESSAGE, NO_FILES_MESSAGE, NO_WORKSPACE_MESSAGE};
use crate::errors::user_message;
use crate::models::{FileRecord, PreviewState};
use crate::services::catalog_builder::{BuildOutcome, BuildSummary};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogViewState {
    pub files: Vec<FileRecord>,
    pub preview: Option<PreviewState>,
    /// True while at least one build is in flight
    pub loading: bool,
    pub error: Option<String>,
    /// Informational guidance, set when a build completed with no files
    pub notice: Option<String>,
    pub workspace_id: Option<String>,
    pub filter_query: String,
    #[serde(skip)]
    pub last_build: Option<BuildSummary>,
    #[serde(skip)]
    pending_builds: usize,
}

impl CatalogViewState {
    /// Files matching the current filter, in catalog order
    pub fn visible_files(&self) -> Vec<&FileRecord> {
        let needle = self.filter_query.to_lowercase();
        self.files
            .iter()
            .filter(|file| matches_filter(file, &needle))
            .collect()
    }

    pub fn set_filter_query(&mut self, query: impl Into<String>) {
        self.filter_query = query.into();
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Mark a build as in flight; a previous error is cleared
    pub fn begin_build(&mut self) {
        self.pending_builds += 1;
        self.loading = true;
        self.error = None;
    }

    /// Commit a finished build.
    ///
    /// Only a completed build or an empty workspace replaces `files`. Failures
    /// keep the previous catalog visible next to the error message. `loading`
    /// stays set while other builds started with [`begin_build`](Self::begin_build)
    /// are still in flight.
    pub fn apply_build(&mut self, outcome: BuildOutcome) {
        self.pending_builds = self.pending_builds.saturating_sub(1);
        self.loading = self.pending_builds > 0;
        match outcome {
            BuildOutcome::Completed {
                workspace_id,
                files,
                summary,
            } => {
                self.notice = files.is_empty().then(|| NO_FILES_MESSAGE.to_string());
                self.files = files;
                self.error = None;
                self.workspace_id = Some(workspace_id);
                self.last_build = Some(summary);
            }
            BuildOutcome::NoWorkspace => {
                self.error = Some(NO_WORKSPACE_MESSAGE.to_string());
            }
            BuildOutcome::NoContainers { workspace_id } => {
                self.files = Vec::new();
                self.notice = None;
                self.error = Some(NO_CONTAINERS_MESSAGE.to_string());
                self.workspace_id = Some(workspace_id);
            }
            BuildOutcome::Failed {
                workspace_id,
                error,
            } => {
                self.error = Some(user_message(&error));
                if workspace_id.is_some() {
                    self.workspace_id = workspace_id;
                }
            }
        }
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            files: self.visible_files().into_iter().cloned().collect(),
            total_files: self.files.len(),
            preview: self.preview.clone(),
            loading: self.loading,
            error: self.error.clone(),
            notice: self.notice.clone(),
            workspace_id: self.workspace_id.clone(),
            filter_query: self.filter_query.clone(),
        }
    }
}

/// Case-insensitive substring match on name or container name.
///
/// `folded_query` must already be lowercased; an empty query matches everything.
pub fn matches_filter(file: &FileRecord, folded_query: &str) -> bool {
    folded_query.is_empty()
        || file.name.to_lowercase().contains(folded_query)
        || file.container_name.to_lowercase().contains(folded_query)
}

/// What a presentation layer renders: the filtered list plus status
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub files: Vec<FileRecord>,
    pub total_files: usize,
    pub preview: Option<PreviewState>,
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub workspace_id: Option<String>,
    pub filter_query: String,
}
