//! Catalog session
//!
//! [`CatalogSession`] owns one view state and the two services that change it.
//! Every mutation goes through a `tokio::sync::watch` channel, so observers
//! see whole states and can wait for changes via [`CatalogSession::subscribe`].
//! Dropping the session releases the installed preview handle.

use preview_store::{
    DirectorySaveTarget, MemoryResourceStore, ResourceStore, SaveTarget, TempFileResourceStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::{Config, PreviewBackend};
use crate::errors::{CatalogError, CatalogResult};
use crate::models::FileRecord;
use crate::observability::{DiagnosticSink, TracingSink};
use crate::services::catalog_builder::CatalogBuilder;
use crate::services::preview_manager::PreviewManager;
use crate::services::view_state::{CatalogSnapshot, CatalogViewState};
use crate::sources::{StorageClient, WorkspaceResolver};

pub struct CatalogSession {
    state: watch::Sender<CatalogViewState>,
    builder: CatalogBuilder,
    preview: PreviewManager,
    item_id: Option<String>,
}

impl CatalogSession {
    pub fn new(builder: CatalogBuilder, preview: PreviewManager, item_id: Option<String>) -> Self {
        Self {
            state: watch::Sender::new(CatalogViewState::default()),
            builder,
            preview,
            item_id,
        }
    }

    /// Assemble a session from configuration.
    ///
    /// The resource store follows `preview.backend` and downloads land in
    /// `preview.download_path`. Diagnostics go to `tracing`.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid or the temp-dir
    /// backend cannot create its directory.
    pub fn from_config(
        config: &Config,
        resolver: Arc<dyn WorkspaceResolver>,
        storage: Arc<dyn StorageClient>,
        item_id: Option<String>,
    ) -> CatalogResult<Self> {
        let save_target = Arc::new(DirectorySaveTarget::new(&config.preview.download_path));
        Self::from_config_with(
            config,
            resolver,
            storage,
            save_target,
            Arc::new(TracingSink),
            item_id,
        )
    }

    /// Like [`from_config`](Self::from_config) with an explicit save target and sink
    pub fn from_config_with(
        config: &Config,
        resolver: Arc<dyn WorkspaceResolver>,
        storage: Arc<dyn StorageClient>,
        save_target: Arc<dyn SaveTarget>,
        diagnostics: Arc<dyn DiagnosticSink>,
        item_id: Option<String>,
    ) -> CatalogResult<Self> {
        config
            .validate()
            .map_err(|e| CatalogError::configuration(e.to_string()))?;

        let store: Arc<dyn ResourceStore> = match config.preview.backend {
            PreviewBackend::Memory => Arc::new(MemoryResourceStore::new()),
            PreviewBackend::TempDir => Arc::new(
                TempFileResourceStore::builder()
                    .base_directory(&config.preview.temp_path)
                    .build()?,
            ),
        };
        info!(
            "Catalog session using {:?} preview backend",
            config.preview.backend
        );

        let builder = CatalogBuilder::new(resolver, storage.clone(), config.catalog.clone())
            .with_diagnostics(diagnostics.clone());
        let preview = PreviewManager::new(storage, store, save_target)
            .with_diagnostics(diagnostics)
            .with_max_preview_bytes(config.preview.max_preview_bytes);

        Ok(Self::new(builder, preview, item_id))
    }

    /// Run a build cycle and commit its outcome
    pub async fn build(&self) {
        self.state.send_modify(CatalogViewState::begin_build);
        let outcome = self.builder.build(self.item_id.as_deref()).await;
        self.state.send_modify(|view| view.apply_build(outcome));
    }

    /// Rebuild the catalog; the current preview is left alone
    pub async fn refresh(&self) {
        debug!("Refreshing catalog");
        self.build().await;
    }

    pub async fn select(&self, file: FileRecord) {
        self.preview.select(&self.state, file).await;
    }

    /// Select a file of the current catalog by full path.
    ///
    /// Returns `false` when no such file is listed.
    pub async fn select_path(&self, full_path: &str) -> bool {
        let file = self
            .state
            .borrow()
            .files
            .iter()
            .find(|f| f.full_path == full_path)
            .cloned();

        match file {
            Some(file) => {
                self.select(file).await;
                true
            }
            None => false,
        }
    }

    pub fn close(&self) {
        self.preview.close(&self.state);
    }

    /// Save the ready preview; `None` when nothing was saved
    pub async fn download(&self) -> Option<PathBuf> {
        self.preview.download(&self.state).await
    }

    pub fn set_filter_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.state.send_if_modified(|view| {
            if view.filter_query == query {
                return false;
            }
            view.set_filter_query(query);
            true
        });
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|view| view.error.take().is_some());
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        self.state.borrow().snapshot()
    }

    /// A copy of the full view state
    pub fn state(&self) -> CatalogViewState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CatalogViewState> {
        self.state.subscribe()
    }

    pub fn resource_store(&self) -> &Arc<dyn ResourceStore> {
        self.preview.store()
    }

    /// Release preview resources now instead of at drop
    pub fn teardown(&self) {
        self.preview.teardown(&self.state);
    }
}

impl Drop for CatalogSession {
    fn drop(&mut self) {
        self.preview.teardown(&self.state);
    }
}
