//! Error types for the preview store.

use std::path::PathBuf;

/// Result type for preview store operations.
pub type Result<T> = std::result::Result<T, PreviewStoreError>;

/// Errors that can occur while allocating, resolving or releasing preview resources.
#[derive(Debug, thiserror::Error)]
pub enum PreviewStoreError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Path or file name validation failed - potential security issue
    #[error("Path validation failed: {path:?} - {reason}")]
    PathValidation { path: PathBuf, reason: String },

    /// The handle was never allocated by this store or has already been released
    #[error("Resource handle not found: {address}")]
    HandleNotFound { address: String },

    /// Directory creation failed
    #[error("Failed to create directory: {path:?} - {source}")]
    DirectoryCreation {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Permissions error
    #[error("Permission denied: {operation} on {path:?}")]
    Permission { operation: String, path: PathBuf },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl PreviewStoreError {
    /// Create a handle-not-found error for an address
    pub fn handle_not_found<A: Into<String>>(address: A) -> Self {
        Self::HandleNotFound {
            address: address.into(),
        }
    }
}
