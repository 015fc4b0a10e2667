//! Lakehouse file catalog
//!
//! Builds a flat, searchable catalog of every file stored under the files root
//! of each lakehouse container in a workspace, and manages a single preview of
//! one selected file at a time.
//!
//! Discovery tolerates partial failure: a container that cannot be listed is
//! skipped and reported, and the rest of the workspace is still catalogued.
//! Previews hold at most one live resource handle; replacing, closing or
//! dropping the session releases it.
//!
//! ```no_run
//! use std::sync::Arc;
//! use lakehouse_catalog::{CatalogSession, Config, InMemoryLakehouse};
//!
//! # async fn run() -> lakehouse_catalog::CatalogResult<()> {
//! let lake = Arc::new(InMemoryLakehouse::new());
//! let session = CatalogSession::from_config(&Config::default(), lake.clone(), lake, None)?;
//!
//! session.build().await;
//! session.set_filter_query("report");
//! for file in session.snapshot().files {
//!     println!("{} ({} bytes)", file.full_path, file.size);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod models;
pub mod observability;
pub mod services;
pub mod sources;
pub mod utils;

pub use config::{CatalogSettings, Config, LoggingSettings, PreviewBackend, PreviewSettings};
pub use errors::{CatalogError, CatalogResult, SourceError, SourceResult, user_message};
pub use models::{FileRecord, PathEntry, PreviewState, PreviewStatus, Workspace, WorkspaceItem};
pub use observability::{DiagnosticEvent, DiagnosticSink, RecordingSink, TracingSink, init_tracing};
pub use services::{
    BuildOutcome, BuildSummary, CatalogBuilder, CatalogSession, CatalogSnapshot, CatalogViewState,
    PreviewManager,
};
pub use sources::{InMemoryLakehouse, StorageClient, WorkspaceResolver};

pub use preview_store;
