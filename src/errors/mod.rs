//! Centralized error handling for the lakehouse catalog
//!
//! # Error Categories
//!
//! - **Source Errors**: failures reported by the workspace resolver or the
//!   storage client (HTTP, network, timeouts, opaque condition codes)
//! - **Decode Errors**: transport-encoded file content that is not valid base64
//! - **Preview Store Errors**: allocating or releasing a preview resource
//! - **Configuration Errors**: invalid settings
//!
//! None of these escape a catalog build or a preview selection. They are turned
//! into user-facing text with [`messages::user_message`] and stored in state.
//!
//! # Usage
//!
//! ```rust
//! use lakehouse_catalog::errors::{CatalogResult, SourceError};
//!
//! fn example() -> CatalogResult<String> {
//!     Err(SourceError::network("connection reset").into())
//! }
//! ```

pub mod messages;
pub mod types;

pub use messages::{KnownCondition, user_message};
pub use types::*;

/// Convenience type alias for Results using CatalogError
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Convenience type alias for external collaborator Results
pub type SourceResult<T> = Result<T, SourceError>;
