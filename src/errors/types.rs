//! Error type definitions for the lakehouse catalog

use preview_store::PreviewStoreError;
use std::time::Duration;
use thiserror::Error;

/// Top-level catalog error type
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Workspace resolver or storage client failures
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// File content was not valid transport encoding
    #[error("Decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Preview resource allocation or release failures
    #[error("Preview store error: {0}")]
    PreviewStore(#[from] PreviewStoreError),

    /// Decoded preview content exceeds the configured limit
    #[error("Preview too large: {size} bytes (max: {max_size})")]
    PreviewTooLarge { size: usize, max_size: usize },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Failures reported by the external workspace resolver and storage client
#[derive(Error, Debug)]
pub enum SourceError {
    /// HTTP errors returned by the remote API
    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// A failure identified by an opaque numeric condition code
    #[error("Condition {code}: {message}")]
    Condition { code: u32, message: String },

    /// An object-shaped error payload passed through from the remote side
    #[error("Remote error: {0}")]
    Remote(serde_json::Value),

    /// Connection level failures
    #[error("Network error: {message}")]
    Network { message: String },

    /// The call did not finish in time
    #[error("Timed out after {elapsed:?}: {operation}")]
    Timeout { operation: String, elapsed: Duration },

    /// Anything else, carried as text
    #[error("{0}")]
    Other(String),
}

impl CatalogError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl SourceError {
    /// Create an HTTP error
    pub fn http<M: Into<String>>(status: u16, message: M) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Create a condition-code error
    pub fn condition<M: Into<String>>(code: u32, message: M) -> Self {
        Self::Condition {
            code,
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout<O: Into<String>>(operation: O, elapsed: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed,
        }
    }
}
