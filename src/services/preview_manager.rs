//! Preview resource management
//!
//! A view has one preview slot. Selecting a file fetches its encoded content,
//! decodes it and registers the bytes with a [`ResourceStore`]; the returned
//! handle is what a renderer points at. At most one handle allocated here is
//! live at any time:
//!
//! - the previous handle is released before a new selection starts loading
//! - a fetch that finishes after its selection was replaced is dropped before
//!   anything is allocated
//! - closing and teardown release whatever is installed

use base64::{Engine as _, engine::general_purpose::STANDARD};
use preview_store::{BlobResource, ResourceHandle, ResourceStore, SaveTarget};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::debug;

use crate::errors::{CatalogError, CatalogResult, user_message};
use crate::models::{FileRecord, PreviewState, PreviewStatus};
use crate::observability::{DiagnosticEvent, DiagnosticSink, TracingSink};
use crate::services::view_state::CatalogViewState;
use crate::sources::StorageClient;

pub struct PreviewManager {
    storage: Arc<dyn StorageClient>,
    store: Arc<dyn ResourceStore>,
    save_target: Arc<dyn SaveTarget>,
    diagnostics: Arc<dyn DiagnosticSink>,
    max_preview_bytes: Option<usize>,
    next_selection: AtomicU64,
}

impl PreviewManager {
    pub fn new(
        storage: Arc<dyn StorageClient>,
        store: Arc<dyn ResourceStore>,
        save_target: Arc<dyn SaveTarget>,
    ) -> Self {
        Self {
            storage,
            store,
            save_target,
            diagnostics: Arc::new(TracingSink),
            max_preview_bytes: None,
            next_selection: AtomicU64::new(0),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Refuse to preview files whose decoded size exceeds `max_bytes`
    pub fn with_max_preview_bytes(mut self, max_bytes: Option<usize>) -> Self {
        self.max_preview_bytes = max_bytes;
        self
    }

    pub fn store(&self) -> &Arc<dyn ResourceStore> {
        &self.store
    }

    /// Select `file` for preview.
    ///
    /// The slot moves to `Loading` immediately and settles to `Ready` or
    /// `Error` once the fetch finishes, unless another selection, a close or a
    /// teardown happened in the meantime.
    pub async fn select(&self, state: &watch::Sender<CatalogViewState>, file: FileRecord) {
        let selection_id = self.next_selection.fetch_add(1, Ordering::Relaxed) + 1;

        state.send_modify(|view| {
            if let Some(handle) = view.preview.take().and_then(|p| p.resource_handle) {
                self.release(&handle);
            }
            view.preview = Some(PreviewState::loading(file.clone(), selection_id));
        });

        let loaded = self.load(&file).await;
        let loaded_ok = loaded.is_ok();

        // Allocation happens under the state lock, after the selection check,
        // so a replaced selection never allocates a resource.
        let installed = state.send_if_modified(|view| {
            let Some(preview) = view
                .preview
                .as_mut()
                .filter(|preview| preview.selection_id == selection_id)
            else {
                return false;
            };

            match loaded.and_then(|blob| Ok(self.store.allocate(blob)?)) {
                Ok(handle) => {
                    preview.status = PreviewStatus::Ready;
                    preview.resource_handle = Some(handle);
                }
                Err(error) => {
                    self.diagnostics.record(DiagnosticEvent::PreviewFailed {
                        full_path: file.full_path.clone(),
                        reason: error.to_string(),
                    });
                    preview.status = PreviewStatus::Error;
                    preview.error_detail = Some(user_message(&error));
                }
            }
            true
        });

        if !installed {
            if loaded_ok {
                self.diagnostics.record(DiagnosticEvent::PreviewDiscarded {
                    full_path: file.full_path,
                });
            } else {
                debug!("Ignoring failed fetch for replaced selection {}", file.full_path);
            }
        }
    }

    /// Clear the preview slot, releasing its handle if one is installed
    pub fn close(&self, state: &watch::Sender<CatalogViewState>) {
        state.send_if_modified(|view| match view.preview.take() {
            Some(preview) => {
                if let Some(handle) = preview.resource_handle {
                    self.release(&handle);
                }
                true
            }
            None => false,
        });
    }

    /// Hand the ready preview's bytes to the save target under the file's name.
    ///
    /// Returns the written path. Without a ready preview, or when saving fails,
    /// returns `None`; failures are reported to the diagnostic sink only.
    pub async fn download(&self, state: &watch::Sender<CatalogViewState>) -> Option<PathBuf> {
        let (handle, file_name) = {
            let view = state.borrow();
            let preview = view.preview.as_ref().filter(|p| p.is_ready())?;
            (preview.resource_handle.clone()?, preview.file.name.clone())
        };

        let saved = match self.store.resolve(&handle) {
            Ok(blob) => self.save_target.save_as(&blob, &file_name).await,
            Err(e) => Err(e),
        };

        match saved {
            Ok(path) => {
                debug!("Saved {} to {}", file_name, path.display());
                Some(path)
            }
            Err(e) => {
                self.diagnostics.record(DiagnosticEvent::DownloadFailed {
                    file_name,
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    /// Release the installed handle and empty the slot. Safe to call more than once.
    pub fn teardown(&self, state: &watch::Sender<CatalogViewState>) {
        self.close(state);
    }

    /// Read and decode a file's content without allocating anything
    async fn load(&self, file: &FileRecord) -> CatalogResult<BlobResource> {
        let encoded = self.storage.read_file_encoded(&file.full_path).await?;
        let bytes = decode_content(&encoded)?;

        if let Some(max_size) = self.max_preview_bytes
            && bytes.len() > max_size
        {
            return Err(CatalogError::PreviewTooLarge {
                size: bytes.len(),
                max_size,
            });
        }

        let blob = BlobResource::for_file_name(bytes, &file.name);
        debug!(
            "Decoded {} ({} bytes, {})",
            file.full_path,
            blob.len(),
            blob.mime_type
        );
        Ok(blob)
    }

    fn release(&self, handle: &ResourceHandle) {
        if let Err(e) = self.store.release(handle) {
            self.diagnostics.record(DiagnosticEvent::ResourceReleaseFailed {
                address: handle.address().to_string(),
                reason: e.to_string(),
            });
        }
    }
}

/// Decode standard base64 content.
///
/// Whitespace (line-wrapped payloads) and a `data:<mime>;base64,` prefix are
/// tolerated.
pub fn decode_content(encoded: &str) -> CatalogResult<Vec<u8>> {
    let payload = match encoded.trim_start().strip_prefix("data:") {
        Some(rest) => rest.split_once(";base64,").map_or(rest, |(_, data)| data),
        None => encoded,
    };
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::RecordingSink;
    use crate::sources::{FailurePoint, InMemoryLakehouse, InjectedFailure};
    use preview_store::{DirectorySaveTarget, MemoryResourceStore, ResourceInfo};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Wraps a memory store and records every allocate/release in order
    #[derive(Default)]
    struct RecordingStore {
        inner: MemoryResourceStore,
        ops: Mutex<Vec<String>>,
        max_live: Mutex<usize>,
    }

    impl RecordingStore {
        fn ops(&self) -> Vec<String> {
            self.ops.lock().expect("ops lock").clone()
        }

        fn max_live(&self) -> usize {
            *self.max_live.lock().expect("max lock")
        }
    }

    impl ResourceStore for RecordingStore {
        fn allocate(&self, blob: BlobResource) -> preview_store::Result<ResourceHandle> {
            let handle = self.inner.allocate(blob)?;
            self.ops.lock().expect("ops lock").push(format!("allocate {handle}"));
            let mut max = self.max_live.lock().expect("max lock");
            *max = (*max).max(self.inner.live_count());
            Ok(handle)
        }

        fn release(&self, handle: &ResourceHandle) -> preview_store::Result<()> {
            self.ops.lock().expect("ops lock").push(format!("release {handle}"));
            self.inner.release(handle)
        }

        fn resolve(&self, handle: &ResourceHandle) -> preview_store::Result<Arc<BlobResource>> {
            self.inner.resolve(handle)
        }

        fn info(&self, handle: &ResourceHandle) -> Option<ResourceInfo> {
            self.inner.info(handle)
        }

        fn live_count(&self) -> usize {
            self.inner.live_count()
        }
    }

    struct Fixture {
        lake: InMemoryLakehouse,
        store: Arc<RecordingStore>,
        sink: RecordingSink,
        manager: PreviewManager,
        state: watch::Sender<CatalogViewState>,
        _downloads: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let lake = InMemoryLakehouse::new();
        lake.add_lakehouse("ws1", "lh1", "Sales")
            .add_file("ws1", "lh1", "a.txt", b"alpha")
            .add_file("ws1", "lh1", "b.csv", b"x,y\n1,2\n");

        let downloads = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(RecordingStore::default());
        let sink = RecordingSink::new();
        let manager = PreviewManager::new(
            Arc::new(lake.clone()),
            store.clone(),
            Arc::new(DirectorySaveTarget::new(downloads.path())),
        )
        .with_diagnostics(Arc::new(sink.clone()));

        Fixture {
            lake,
            store,
            sink,
            manager,
            state: watch::Sender::new(CatalogViewState::default()),
            _downloads: downloads,
        }
    }

    fn file(name: &str) -> FileRecord {
        FileRecord {
            full_path: format!("ws1/lh1/Files/{name}"),
            name: name.to_string(),
            relative_path: name.to_string(),
            size: 0,
            last_modified: String::new(),
            container_name: "Sales".to_string(),
            container_id: "lh1".to_string(),
        }
    }

    fn preview(state: &watch::Sender<CatalogViewState>) -> Option<PreviewState> {
        state.borrow().preview.clone()
    }

    #[tokio::test]
    async fn test_select_installs_ready_preview() -> Result<(), Box<dyn std::error::Error>> {
        let fx = fixture();
        fx.manager.select(&fx.state, file("a.txt")).await;

        let preview = preview(&fx.state).expect("preview set");
        assert_eq!(preview.status, PreviewStatus::Ready);
        let handle = preview.resource_handle.expect("handle installed");
        let blob = fx.store.resolve(&handle)?;
        assert_eq!(blob.bytes, b"alpha");
        assert_eq!(blob.mime_type, "text/plain");
        assert_eq!(fx.store.live_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_reselect_releases_before_allocating() {
        let fx = fixture();
        fx.manager.select(&fx.state, file("a.txt")).await;
        fx.manager.select(&fx.state, file("b.csv")).await;
        fx.manager.select(&fx.state, file("a.txt")).await;

        let ops = fx.store.ops();
        let kinds: Vec<&str> = ops.iter().filter_map(|op| op.split(' ').next()).collect();
        assert_eq!(kinds, vec!["allocate", "release", "allocate", "release", "allocate"]);
        // each release targets the handle allocated just before it
        assert_eq!(ops[1].replace("release", "allocate"), ops[0]);
        assert_eq!(ops[3].replace("release", "allocate"), ops[2]);
        assert_eq!(fx.store.max_live(), 1);
        assert_eq!(fx.store.live_count(), 1);
    }

    #[tokio::test]
    async fn test_read_failure_sets_error_without_handle() {
        let fx = fixture();
        fx.lake.fail(
            FailurePoint::ReadFile("ws1/lh1/Files/a.txt".to_string()),
            InjectedFailure::Network("connection reset".to_string()),
        );

        fx.manager.select(&fx.state, file("a.txt")).await;

        let preview = preview(&fx.state).expect("preview set");
        assert_eq!(preview.status, PreviewStatus::Error);
        assert_eq!(preview.resource_handle, None);
        assert_eq!(preview.error_detail.as_deref(), Some("Network error: connection reset"));
        assert_eq!(fx.store.live_count(), 0);
        assert!(matches!(fx.sink.events()[0], DiagnosticEvent::PreviewFailed { .. }));
    }

    #[tokio::test]
    async fn test_malformed_content_sets_error() {
        let fx = fixture();
        fx.lake.put_encoded("ws1/lh1/Files/a.txt", "not base64 !!");

        fx.manager.select(&fx.state, file("a.txt")).await;

        let preview = preview(&fx.state).expect("preview set");
        assert_eq!(preview.status, PreviewStatus::Error);
        assert!(preview.error_detail.is_some());
        assert_eq!(fx.store.live_count(), 0);
    }

    #[tokio::test]
    async fn test_oversized_preview_is_refused() {
        let mut fx = fixture();
        fx.manager = fx.manager.with_max_preview_bytes(Some(3));

        fx.manager.select(&fx.state, file("a.txt")).await;

        let preview = preview(&fx.state).expect("preview set");
        assert_eq!(preview.status, PreviewStatus::Error);
        assert_eq!(fx.store.live_count(), 0);
    }

    #[tokio::test]
    async fn test_close_releases_handle() {
        let fx = fixture();
        fx.manager.select(&fx.state, file("a.txt")).await;
        fx.manager.close(&fx.state);

        assert_eq!(preview(&fx.state), None);
        assert_eq!(fx.store.live_count(), 0);

        // closing again is a no-op
        fx.manager.close(&fx.state);
        assert_eq!(fx.store.ops().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_fetch_is_discarded() {
        let fx = fixture();
        fx.lake.delay_reads(Duration::from_millis(100));

        tokio::join!(fx.manager.select(&fx.state, file("a.txt")), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            fx.manager.select(&fx.state, file("b.csv")).await;
        });

        let preview = preview(&fx.state).expect("preview set");
        assert_eq!(preview.file.name, "b.csv");
        assert_eq!(preview.status, PreviewStatus::Ready);
        assert_eq!(fx.store.live_count(), 1);
        assert!(fx.sink.events().iter().any(|e| matches!(
            e,
            DiagnosticEvent::PreviewDiscarded { full_path } if full_path.ends_with("a.txt")
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_selection_finishing_first_keeps_one_live_handle() {
        let fx = fixture();
        fx.lake.delay_reads(Duration::from_millis(100));

        tokio::join!(fx.manager.select(&fx.state, file("a.txt")), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            fx.lake.delay_reads(Duration::from_millis(1));
            fx.manager.select(&fx.state, file("b.csv")).await;
        });

        let preview = preview(&fx.state).expect("preview set");
        assert_eq!(preview.file.name, "b.csv");
        assert_eq!(preview.status, PreviewStatus::Ready);
        assert_eq!(fx.store.max_live(), 1);
        assert_eq!(fx.store.live_count(), 1);

        // the replaced selection never reached the store
        let allocations = fx.store.ops().iter().filter(|op| op.starts_with("allocate")).count();
        assert_eq!(allocations, 1);
        assert!(fx.sink.events().iter().any(|e| matches!(
            e,
            DiagnosticEvent::PreviewDiscarded { full_path } if full_path.ends_with("a.txt")
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_while_loading_discards_result() {
        let fx = fixture();
        fx.lake.delay_reads(Duration::from_millis(100));

        tokio::join!(fx.manager.select(&fx.state, file("a.txt")), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            fx.manager.close(&fx.state);
        });

        assert_eq!(preview(&fx.state), None);
        assert_eq!(fx.store.live_count(), 0);
    }

    #[tokio::test]
    async fn test_teardown_while_loading_releases_nothing() {
        let fx = fixture();
        fx.state.send_modify(|view| view.preview = Some(PreviewState::loading(file("a.txt"), 99)));

        fx.manager.teardown(&fx.state);

        assert_eq!(preview(&fx.state), None);
        assert!(fx.store.ops().is_empty());
    }

    #[tokio::test]
    async fn test_teardown_releases_ready_handle_once() {
        let fx = fixture();
        fx.manager.select(&fx.state, file("a.txt")).await;

        fx.manager.teardown(&fx.state);
        fx.manager.teardown(&fx.state);

        let releases = fx.store.ops().iter().filter(|op| op.starts_with("release")).count();
        assert_eq!(releases, 1);
        assert_eq!(fx.store.live_count(), 0);
    }

    #[tokio::test]
    async fn test_download_writes_file_name() -> Result<(), Box<dyn std::error::Error>> {
        let fx = fixture();
        fx.manager.select(&fx.state, file("b.csv")).await;

        let path = fx.manager.download(&fx.state).await.expect("download saved");
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("b.csv"));
        assert_eq!(std::fs::read(&path)?, b"x,y\n1,2\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_download_without_ready_preview() {
        let fx = fixture();
        assert_eq!(fx.manager.download(&fx.state).await, None);
        assert!(fx.sink.events().is_empty());
    }

    #[test]
    fn test_decode_content_variants() -> CatalogResult<()> {
        assert_eq!(decode_content("aGVsbG8=")?, b"hello");
        assert_eq!(decode_content("aGVs\nbG8=\n")?, b"hello");
        assert_eq!(decode_content("data:text/plain;base64,aGVsbG8=")?, b"hello");
        assert!(decode_content("***").is_err());
        Ok(())
    }
}
