//! # Preview Store
//!
//! Scoped binary resources for file previews. Decoded content is handed to a
//! [`ResourceStore`], which returns an opaque, addressable [`ResourceHandle`].
//! The owner of a handle must give it back with [`ResourceStore::release`]
//! exactly once; stores reject a second release instead of ignoring it.
//!
//! Two stores are provided:
//!
//! - [`MemoryResourceStore`] keeps reference-counted buffers in memory and hands
//!   out `blob:memory/<uuid>` addresses.
//! - [`TempFileResourceStore`] writes each resource to a private directory and
//!   hands out `file://` addresses; releasing deletes the file.
//!
//! ## Basic Usage
//!
//! ```rust
//! use preview_store::{BlobResource, MemoryResourceStore, ResourceStore};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryResourceStore::new();
//! let handle = store.allocate(BlobResource::for_file_name(b"hello".to_vec(), "hello.txt"))?;
//! assert_eq!(store.resolve(&handle)?.mime_type, "text/plain");
//! store.release(&handle)?;
//! assert_eq!(store.live_count(), 0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Saving
//!
//! [`SaveTarget`] is the "save as" side of a preview. [`DirectorySaveTarget`]
//! sanitises the suggested file name and never overwrites an existing file.

pub mod error;
pub mod mime;
pub mod save;
pub mod security;
pub mod store;
pub mod temp_store;

pub use error::{PreviewStoreError, Result};
pub use mime::{DEFAULT_MIME_TYPE, mime_type_for_name};
pub use save::{DirectorySaveTarget, SaveTarget};
pub use store::{BlobResource, MemoryResourceStore, ResourceHandle, ResourceInfo, ResourceStore};
pub use temp_store::{TempFileResourceStore, TempFileResourceStoreBuilder};
