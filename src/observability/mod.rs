//! Structured diagnostics
//!
//! Recoverable failures (a skipped container, a failed preview) are reported
//! as [`DiagnosticEvent`]s to an injected [`DiagnosticSink`] instead of being
//! logged inline, so hosts can route them to their own telemetry. The default
//! [`TracingSink`] forwards every event to `tracing`.

use anyhow::Result;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingSettings;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DiagnosticEvent {
    /// Looking up the item's workspace failed; the workspace list is tried next
    WorkspaceResolutionFailed { item_id: String, reason: String },
    /// The first accessible workspace was used
    WorkspaceFallbackUsed { workspace_id: String },
    /// One container could not be listed and was left out of the build
    ContainerSkipped {
        container_id: String,
        container_name: String,
        reason: String,
    },
    /// A listing reported the same full path twice; the later entry was dropped
    DuplicatePathDropped { full_path: String },
    BuildCompleted {
        workspace_id: String,
        containers_scanned: usize,
        containers_skipped: usize,
        files: usize,
        elapsed: Duration,
    },
    BuildFailed { reason: String },
    PreviewFailed { full_path: String, reason: String },
    /// A fetch finished after its selection was replaced; nothing was allocated for it
    PreviewDiscarded { full_path: String },
    ResourceReleaseFailed { address: String, reason: String },
    DownloadFailed { file_name: String, reason: String },
}

/// Receiver of diagnostic events
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: DiagnosticEvent);
}

/// Forwards events to `tracing` at a level matching their severity
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, event: DiagnosticEvent) {
        match &event {
            DiagnosticEvent::WorkspaceResolutionFailed { item_id, reason } => {
                warn!("Failed to resolve workspace for item {}: {}", item_id, reason)
            }
            DiagnosticEvent::WorkspaceFallbackUsed { workspace_id } => {
                info!("Using first accessible workspace {}", workspace_id)
            }
            DiagnosticEvent::ContainerSkipped {
                container_id,
                container_name,
                reason,
            } => warn!(
                "Skipping container {} ({}): {}",
                container_name, container_id, reason
            ),
            DiagnosticEvent::DuplicatePathDropped { full_path } => {
                debug!("Dropped duplicate listing entry {}", full_path)
            }
            DiagnosticEvent::BuildCompleted {
                workspace_id,
                containers_scanned,
                containers_skipped,
                files,
                elapsed,
            } => info!(
                "Catalog build for workspace {} finished: {} files from {} containers ({} skipped) in {:?}",
                workspace_id, files, containers_scanned, containers_skipped, elapsed
            ),
            DiagnosticEvent::BuildFailed { reason } => error!("Catalog build failed: {}", reason),
            DiagnosticEvent::PreviewFailed { full_path, reason } => {
                warn!("Preview of {} failed: {}", full_path, reason)
            }
            DiagnosticEvent::PreviewDiscarded { full_path } => {
                debug!("Discarded superseded preview of {}", full_path)
            }
            DiagnosticEvent::ResourceReleaseFailed { address, reason } => {
                error!("Failed to release preview resource {}: {}", address, reason)
            }
            DiagnosticEvent::DownloadFailed { file_name, reason } => {
                warn!("Download of {} failed: {}", file_name, reason)
            }
        }
    }
}

/// Keeps every event in memory, optionally forwarding to another sink
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<DiagnosticEvent>>>,
    forward: Option<Arc<dyn DiagnosticSink>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forwarding_to(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            events: Arc::default(),
            forward: Some(sink),
        }
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl DiagnosticSink for RecordingSink {
    fn record(&self, event: DiagnosticEvent) {
        if let Some(forward) = &self.forward {
            forward.record(event.clone());
        }
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` wins over the configured level when it is set.
pub fn init_tracing(settings: &LoggingSettings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("lakehouse_catalog={},preview_store={}", settings.level, settings.level)))?;

    let registry = tracing_subscriber::registry().with(filter);
    if settings.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
    }
    Ok(())
}
