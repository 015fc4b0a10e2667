//! Security utilities for file names and private directories.

use crate::error::{PreviewStoreError, Result};
use std::path::{Component, Path};

/// Sets owner-only permissions on a directory (Unix only).
pub fn set_secure_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o700);
        std::fs::set_permissions(path, perms).map_err(|_e| PreviewStoreError::Permission {
            operation: "set secure permissions".to_string(),
            path: path.to_path_buf(),
        })?;
    }

    #[cfg(not(unix))]
    {
        if !path.exists() {
            return Err(PreviewStoreError::PathValidation {
                path: path.to_path_buf(),
                reason: "Directory does not exist".to_string(),
            });
        }
    }

    Ok(())
}

/// Validates that a suggested file name is a single, plain path component.
///
/// Rejects empty names, null bytes, separators and `.`/`..`.
pub fn validate_file_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| PreviewStoreError::PathValidation {
        path: Path::new(name).to_path_buf(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("File name is empty"));
    }
    if name.contains('\0') {
        return Err(invalid("File name contains null bytes"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(invalid("File name contains path separators"));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid("File name is not a plain file name")),
    }
}

/// Turn an arbitrary suggested name into a safe file name.
///
/// Separators and control characters become `_`; names that are still not
/// usable fall back to `download`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();

    if validate_file_name(&cleaned).is_ok() {
        cleaned
    } else {
        "download".to_string()
    }
}
