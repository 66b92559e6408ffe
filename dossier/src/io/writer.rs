//! Merged-document writing.
//!
//! Writes are atomic: the document is saved to a temporary sibling file
//! and renamed into place, so a mid-write failure never leaves a truncated
//! dossier in the output folder.

use lopdf::Document;
use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::task;

use crate::error::{DossierError, Result};

/// Writer for merged output documents.
#[derive(Debug, Clone)]
pub struct PdfWriter {
    /// Use atomic writes (write to temp file, then rename).
    atomic: bool,
}

impl PdfWriter {
    /// Create a writer with atomic writes enabled.
    pub fn new() -> Self {
        Self { atomic: true }
    }

    /// Create a writer without atomic writes.
    pub fn non_atomic() -> Self {
        Self { atomic: false }
    }

    /// Save a document, returning the written file size in bytes.
    ///
    /// The document is consumed; saving requires mutable access and the
    /// merged document has no further use after it is on disk.
    ///
    /// # Errors
    ///
    /// Returns [`DossierError::FailedToCreateOutput`] or
    /// [`DossierError::FailedToWrite`] on I/O failure.
    pub async fn save(&self, mut document: Document, path: &Path) -> Result<u64> {
        let atomic = self.atomic;
        let path = path.to_path_buf();

        task::spawn_blocking(move || {
            let target = if atomic {
                temp_sibling(&path)
            } else {
                path.clone()
            };

            write_document(&mut document, &target)?;

            if atomic {
                std::fs::rename(&target, &path).map_err(|source| {
                    DossierError::FailedToWrite {
                        path: path.clone(),
                        source,
                    }
                })?;
            }

            let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            Ok(size)
        })
        .await
        .map_err(|err| DossierError::other(format!("write task panicked: {err}")))?
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Temp-file path next to the final target.
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_document(document: &mut Document, target: &Path) -> Result<()> {
    let file =
        std::fs::File::create(target).map_err(|source| DossierError::FailedToCreateOutput {
            path: target.to_path_buf(),
            source,
        })?;
    let mut writer = std::io::BufWriter::new(file);

    document
        .save_to(&mut writer)
        .map_err(|err| DossierError::other(format!("failed to serialize PDF: {err}")))?;

    writer.flush().map_err(|source| DossierError::FailedToWrite {
        path: target.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_test_document;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_save_writes_readable_pdf() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.pdf");

        let document = build_test_document(&["hello"]);
        let size = PdfWriter::new().save(document, &path).await.unwrap();

        assert!(size > 0);
        let reloaded = Document::load(&path).unwrap();
        assert_eq!(reloaded.get_pages().len(), 1);
    }

    #[tokio::test]
    async fn test_atomic_save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.pdf");

        let document = build_test_document(&["hello"]);
        PdfWriter::new().save(document, &path).await.unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_non_atomic_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.pdf");

        let document = build_test_document(&["hello"]);
        let size = PdfWriter::non_atomic().save(document, &path).await.unwrap();
        assert!(size > 0);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_save_to_missing_directory_fails() {
        let document = build_test_document(&["hello"]);
        let result = PdfWriter::new()
            .save(document, Path::new("/nonexistent/dir/out.pdf"))
            .await;
        assert!(result.is_err());
    }
}
