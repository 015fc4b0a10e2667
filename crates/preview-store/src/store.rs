//! Resource handles and the in-memory resource store.

use crate::error::{PreviewStoreError, Result};
use crate::mime::mime_type_for_name;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use uuid::Uuid;

/// Decoded binary content tagged with a MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobResource {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl BlobResource {
    /// Create a blob with an explicit MIME type.
    pub fn new<M: Into<String>>(bytes: Vec<u8>, mime_type: M) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Create a blob whose MIME type is derived from a file name's extension.
    #[must_use]
    pub fn for_file_name(bytes: Vec<u8>, file_name: &str) -> Self {
        Self::new(bytes, mime_type_for_name(file_name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Opaque, addressable reference to a live resource.
///
/// Handles are cheap to clone so they can be shown to a rendering layer, but
/// only the owner that allocated one should hand it back to [`ResourceStore::release`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceHandle {
    address: String,
}

impl ResourceHandle {
    pub(crate) fn new(address: String) -> Self {
        Self { address }
    }

    /// Address the rendering layer uses to reach the content.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// Metadata about a live resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub address: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub allocated_at: DateTime<Utc>,
}

/// A scoped store of binary resources with explicit allocate/release.
///
/// Operations are synchronous so an owner can release its handle from `Drop`.
pub trait ResourceStore: Send + Sync {
    /// Take ownership of a blob and return a handle that addresses it.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot hold the blob.
    fn allocate(&self, blob: BlobResource) -> Result<ResourceHandle>;

    /// Release a handle. Releasing a handle twice is an error.
    ///
    /// # Errors
    /// Returns [`PreviewStoreError::HandleNotFound`] for unknown or already released handles.
    fn release(&self, handle: &ResourceHandle) -> Result<()>;

    /// Read back the content behind a live handle.
    ///
    /// # Errors
    /// Returns [`PreviewStoreError::HandleNotFound`] for unknown or released handles.
    fn resolve(&self, handle: &ResourceHandle) -> Result<Arc<BlobResource>>;

    /// Metadata for a live handle, if any.
    fn info(&self, handle: &ResourceHandle) -> Option<ResourceInfo>;

    /// Number of handles currently allocated and not yet released.
    fn live_count(&self) -> usize;
}

#[derive(Debug)]
struct MemoryEntry {
    blob: Arc<BlobResource>,
    allocated_at: DateTime<Utc>,
}

/// Resource store backed by reference-counted in-memory buffers.
#[derive(Clone, Debug, Default)]
pub struct MemoryResourceStore {
    registry: Arc<Mutex<HashMap<String, MemoryEntry>>>,
}

impl MemoryResourceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<String, MemoryEntry>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResourceStore for MemoryResourceStore {
    fn allocate(&self, blob: BlobResource) -> Result<ResourceHandle> {
        let address = format!("blob:memory/{}", Uuid::new_v4());
        tracing::debug!(
            "Allocating in-memory resource {} ({} bytes, {})",
            address,
            blob.len(),
            blob.mime_type
        );

        self.registry().insert(
            address.clone(),
            MemoryEntry {
                blob: Arc::new(blob),
                allocated_at: Utc::now(),
            },
        );
        Ok(ResourceHandle::new(address))
    }

    fn release(&self, handle: &ResourceHandle) -> Result<()> {
        match self.registry().remove(handle.address()) {
            Some(_) => {
                tracing::debug!("Released in-memory resource {}", handle);
                Ok(())
            }
            None => Err(PreviewStoreError::handle_not_found(handle.address())),
        }
    }

    fn resolve(&self, handle: &ResourceHandle) -> Result<Arc<BlobResource>> {
        self.registry()
            .get(handle.address())
            .map(|entry| Arc::clone(&entry.blob))
            .ok_or_else(|| PreviewStoreError::handle_not_found(handle.address()))
    }

    fn info(&self, handle: &ResourceHandle) -> Option<ResourceInfo> {
        self.registry().get(handle.address()).map(|entry| ResourceInfo {
            address: handle.address().to_string(),
            mime_type: entry.blob.mime_type.clone(),
            size_bytes: entry.blob.len() as u64,
            allocated_at: entry.allocated_at,
        })
    }

    fn live_count(&self) -> usize {
        self.registry().len()
    }
}
