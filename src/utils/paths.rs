//! Path conventions for container listings.
//!
//! Listing entries are container-qualified: `{containerId}/{filesRoot}/sub/doc.pdf`.
//! Reads use the workspace-qualified full path
//! `{workspaceId}/{containerId}/{filesRoot}/sub/doc.pdf`.

/// `{containerId}/{filesRoot}`, the path handed to a recursive listing.
pub fn container_root(container_id: &str, files_root: &str) -> String {
    format!("{container_id}/{files_root}")
}

/// Canonical path used to read a file.
pub fn full_path(workspace_id: &str, container_id: &str, files_root: &str, relative_path: &str) -> String {
    format!("{workspace_id}/{container_id}/{files_root}/{relative_path}")
}

/// Strip the container's files-root prefix from a listing entry name.
///
/// Accepts the container-qualified form as well as names that are already
/// relative to the files root. Returns `None` only for the root itself; a file
/// below the root may share the root's name.
pub fn relative_to_root(entry_name: &str, container_id: &str, files_root: &str) -> Option<String> {
    let name = entry_name.trim_matches('/');
    let root = container_root(container_id, files_root);
    if name == root || name == files_root {
        return None;
    }

    let relative = name
        .strip_prefix(&format!("{root}/"))
        .or_else(|| name.strip_prefix(&format!("{files_root}/")))
        .unwrap_or(name)
        .trim_matches('/');

    (!relative.is_empty()).then(|| relative.to_string())
}

/// Last segment of a relative path; the whole path when it has no separator.
pub fn leaf_name(relative_path: &str) -> &str {
    match relative_path.rsplit_once('/') {
        Some((_, leaf)) if !leaf.is_empty() => leaf,
        _ => relative_path,
    }
}
