//! Save-as targets for downloading a preview resource.

use crate::{
    error::{PreviewStoreError, Result},
    security::sanitize_file_name,
    store::BlobResource,
};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};

/// Highest ` (n)` suffix tried before giving up on a free file name.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Destination for a "save as" of preview content.
#[async_trait]
pub trait SaveTarget: Send + Sync {
    /// Persist `blob` using `suggested_name` as the preferred file name.
    ///
    /// Returns the location the content was written to.
    async fn save_as(&self, blob: &BlobResource, suggested_name: &str) -> Result<PathBuf>;
}

/// Saves downloads into a directory without overwriting existing files.
#[derive(Debug, Clone)]
pub struct DirectorySaveTarget {
    directory: PathBuf,
}

impl DirectorySaveTarget {
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

/// `report.pdf` -> `report (2).pdf`
fn numbered_name(name: &str, n: u32) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({n}).{ext}"),
        _ => format!("{name} ({n})"),
    }
}

#[async_trait]
impl SaveTarget for DirectorySaveTarget {
    async fn save_as(&self, blob: &BlobResource, suggested_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| PreviewStoreError::DirectoryCreation {
                path: self.directory.clone(),
                source: e,
            })?;

        let name = sanitize_file_name(suggested_name);
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = if attempt == 0 {
                name.clone()
            } else {
                numbered_name(&name, attempt)
            };
            let path = self.directory.join(&candidate);

            let file = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match file {
                Ok(mut file) => {
                    file.write_all(&blob.bytes).await?;
                    file.flush().await?;
                    tracing::info!("Saved {} bytes to {:?}", blob.len(), path);
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(PreviewStoreError::PathValidation {
            path: self.directory.join(&name),
            reason: format!("No free file name after {MAX_NAME_ATTEMPTS} attempts"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_name() {
        assert_eq!(numbered_name("report.pdf", 1), "report (1).pdf");
        assert_eq!(numbered_name("README", 2), "README (2)");
    }

    #[tokio::test]
    async fn test_save_as_never_overwrites() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let temp_dir = tempfile::tempdir()?;
        let target = DirectorySaveTarget::new(temp_dir.path().join("downloads"));
        let blob = BlobResource::for_file_name(b"first".to_vec(), "doc.txt");

        let first = target.save_as(&blob, "doc.txt").await?;
        let second = target
            .save_as(&BlobResource::new(b"second".to_vec(), "text/plain"), "doc.txt")
            .await?;

        assert_eq!(first.file_name().and_then(|n| n.to_str()), Some("doc.txt"));
        assert_eq!(second.file_name().and_then(|n| n.to_str()), Some("doc (1).txt"));
        assert_eq!(std::fs::read(&first)?, b"first");
        assert_eq!(std::fs::read(&second)?, b"second");
        Ok(())
    }

    #[tokio::test]
    async fn test_save_as_sanitizes_traversal() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let temp_dir = tempfile::tempdir()?;
        let target = DirectorySaveTarget::new(temp_dir.path());
        let blob = BlobResource::new(b"x".to_vec(), "text/plain");

        let path = target.save_as(&blob, "../escape.txt").await?;
        assert_eq!(path.parent(), Some(temp_dir.path()));
        Ok(())
    }
}
