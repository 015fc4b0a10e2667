//! External collaborators
//!
//! The catalog never talks to a network directly. Workspace resolution and
//! storage access go through two traits so hosts can plug in their own
//! clients:
//!
//! - [`WorkspaceResolver`]: item id to workspace id, plus the accessible
//!   workspace list used as a fallback
//! - [`StorageClient`]: item listing, recursive path listing and file reads
//!
//! [`memory::InMemoryLakehouse`] implements both for offline use.

pub mod memory;
pub mod traits;

pub use memory::{FailurePoint, InMemoryLakehouse, InjectedFailure};
pub use traits::*;
