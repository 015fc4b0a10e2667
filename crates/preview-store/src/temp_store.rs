//! Resource store that spills preview content to a private directory.

use crate::{
    error::{PreviewStoreError, Result},
    security::set_secure_permissions,
    store::{BlobResource, ResourceHandle, ResourceInfo, ResourceStore},
};

use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct TempEntry {
    path: PathBuf,
    mime_type: String,
    size_bytes: u64,
    allocated_at: DateTime<Utc>,
}

/// Resource store where every live handle is a file under `base_dir`.
///
/// Handle addresses are `file://` URLs so a renderer can open them directly.
/// Releasing a handle deletes its file.
#[derive(Clone, Debug)]
pub struct TempFileResourceStore {
    base_dir: PathBuf,
    registry: Arc<Mutex<HashMap<String, TempEntry>>>,
}

impl TempFileResourceStore {
    /// Create a new builder for configuring the store.
    #[must_use]
    pub fn builder() -> TempFileResourceStoreBuilder {
        TempFileResourceStoreBuilder::new()
    }

    #[must_use]
    pub fn base_directory(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the file behind a live handle.
    #[must_use]
    pub fn path_of(&self, handle: &ResourceHandle) -> Option<PathBuf> {
        self.registry()
            .get(handle.address())
            .map(|entry| entry.path.clone())
    }

    /// Release every live handle, returning how many files were removed.
    pub fn purge(&self) -> usize {
        let drained: Vec<TempEntry> = self.registry().drain().map(|(_, entry)| entry).collect();
        let mut removed = 0;
        for entry in drained {
            match std::fs::remove_file(&entry.path) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!("Failed to remove preview file {:?}: {}", entry.path, e),
            }
        }
        removed
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<String, TempEntry>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResourceStore for TempFileResourceStore {
    fn allocate(&self, blob: BlobResource) -> Result<ResourceHandle> {
        let path = self.base_dir.join(Uuid::new_v4().to_string());
        std::fs::write(&path, &blob.bytes)?;

        let address = format!("file://{}", path.display());
        tracing::debug!(
            "Allocated preview file {:?} ({} bytes, {})",
            path,
            blob.len(),
            blob.mime_type
        );

        self.registry().insert(
            address.clone(),
            TempEntry {
                path,
                size_bytes: blob.len() as u64,
                mime_type: blob.mime_type,
                allocated_at: Utc::now(),
            },
        );
        Ok(ResourceHandle::new(address))
    }

    fn release(&self, handle: &ResourceHandle) -> Result<()> {
        let entry = self
            .registry()
            .remove(handle.address())
            .ok_or_else(|| PreviewStoreError::handle_not_found(handle.address()))?;

        match std::fs::remove_file(&entry.path) {
            Ok(()) => {}
            // Someone cleaned the directory behind our back; the handle is still gone.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Preview file {:?} was already removed", entry.path);
            }
            Err(e) => return Err(e.into()),
        }
        tracing::debug!("Released preview file {:?}", entry.path);
        Ok(())
    }

    fn resolve(&self, handle: &ResourceHandle) -> Result<Arc<BlobResource>> {
        let entry = self
            .registry()
            .get(handle.address())
            .cloned()
            .ok_or_else(|| PreviewStoreError::handle_not_found(handle.address()))?;

        let bytes = std::fs::read(&entry.path)?;
        Ok(Arc::new(BlobResource::new(bytes, entry.mime_type)))
    }

    fn info(&self, handle: &ResourceHandle) -> Option<ResourceInfo> {
        self.registry().get(handle.address()).map(|entry| ResourceInfo {
            address: handle.address().to_string(),
            mime_type: entry.mime_type.clone(),
            size_bytes: entry.size_bytes,
            allocated_at: entry.allocated_at,
        })
    }

    fn live_count(&self) -> usize {
        self.registry().len()
    }
}

/// Builder for [`TempFileResourceStore`].
pub struct TempFileResourceStoreBuilder {
    base_directory: Option<PathBuf>,
}

impl TempFileResourceStoreBuilder {
    fn new() -> Self {
        Self {
            base_directory: None,
        }
    }

    /// Set the directory preview files are written to.
    #[must_use]
    pub fn base_directory<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.base_directory = Some(path.into());
        self
    }

    /// Build the `TempFileResourceStore`.
    ///
    /// The base directory is created if needed and stored in canonical form.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Base directory is not set
    /// - Base directory cannot be created or secured
    pub fn build(self) -> Result<TempFileResourceStore> {
        let base_dir = self
            .base_directory
            .ok_or_else(|| PreviewStoreError::Configuration {
                message: "Base directory is required".to_string(),
            })?;

        std::fs::create_dir_all(&base_dir).map_err(|e| PreviewStoreError::DirectoryCreation {
            path: base_dir.clone(),
            source: e,
        })?;
        set_secure_permissions(&base_dir)?;

        // Addresses are `file://` URLs, which need an absolute path
        let base_dir =
            std::fs::canonicalize(&base_dir).map_err(|e| PreviewStoreError::DirectoryCreation {
                path: base_dir.clone(),
                source: e,
            })?;

        tracing::info!("TempFileResourceStore initialized - base_dir: {:?}", base_dir);

        Ok(TempFileResourceStore {
            base_dir,
            registry: Arc::new(Mutex::new(HashMap::new())),
        })
    }
}
