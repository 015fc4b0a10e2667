//! Data model shared by the catalog builder, preview manager and view state.

use preview_store::ResourceHandle;
use serde::{Deserialize, Serialize};

/// A workspace the caller can access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// An item inside a workspace, as returned by the item listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceItem {
    pub id: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub item_type: String,
}

/// A storage container ("lakehouse") discovered in a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub id: String,
    pub display_name: String,
}

impl From<WorkspaceItem> for Container {
    fn from(item: WorkspaceItem) -> Self {
        Self {
            id: item.id,
            display_name: item.display_name,
        }
    }
}

/// Raw content length as it arrives from a listing: a number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentLength {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ContentLength {
    /// Numeric coercion to a byte count; anything unusable becomes 0.
    pub fn to_size(&self) -> u64 {
        match self {
            ContentLength::Integer(n) => u64::try_from(*n).unwrap_or(0),
            ContentLength::Float(f) => float_size(*f),
            ContentLength::Text(text) => {
                let text = text.trim();
                text.parse::<u64>()
                    .ok()
                    .or_else(|| text.parse::<f64>().ok().map(float_size))
                    .unwrap_or(0)
            }
        }
    }
}

fn float_size(value: f64) -> u64 {
    if value.is_finite() && value >= 0.0 {
        value as u64
    } else {
        0
    }
}

/// One entry of a recursive path listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathEntry {
    /// Container-qualified path, e.g. `{containerId}/Files/sub/doc.pdf`
    pub name: String,
    #[serde(default)]
    pub is_directory: bool,
    #[serde(default)]
    pub content_length: Option<ContentLength>,
    #[serde(default)]
    pub last_modified: Option<String>,
}

/// One enumerated file in a catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Canonical, container-qualified path used for reads; unique per snapshot
    pub full_path: String,
    /// Leaf file name, the last segment of `relative_path`
    pub name: String,
    /// Path below the container's files root
    pub relative_path: String,
    pub size: u64,
    /// Timestamp as reported by storage, empty when unknown
    pub last_modified: String,
    pub container_name: String,
    pub container_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewStatus {
    Loading,
    Ready,
    Error,
}

/// The single preview slot of a catalog view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewState {
    pub file: FileRecord,
    /// Set only while `status` is `Ready` and the handle has not been released
    pub resource_handle: Option<ResourceHandle>,
    pub status: PreviewStatus,
    /// Set only while `status` is `Error`
    pub error_detail: Option<String>,
    /// Identifies the `select` call that produced this state
    pub selection_id: u64,
}

impl PreviewState {
    pub fn loading(file: FileRecord, selection_id: u64) -> Self {
        Self {
            file,
            resource_handle: None,
            status: PreviewStatus::Loading,
            error_detail: None,
            selection_id,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == PreviewStatus::Ready && self.resource_handle.is_some()
    }
}
