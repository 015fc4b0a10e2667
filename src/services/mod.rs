//! Catalog services
//!
//! - [`catalog_builder`]: workspace resolution, container discovery and listing
//! - [`preview_manager`]: the single preview slot and its resource handle
//! - [`view_state`]: the observable state both of them write to
//! - [`session`]: one view's state plus the services, as a single facade

pub mod catalog_builder;
pub mod preview_manager;
pub mod session;
pub mod view_state;

pub use catalog_builder::{BuildOutcome, BuildSummary, CatalogBuilder};
pub use preview_manager::PreviewManager;
pub use session::CatalogSession;
pub use view_state::{CatalogSnapshot, CatalogViewState};
