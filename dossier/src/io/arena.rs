//! Arena of open source documents.
//!
//! Handles are scoped resources: they must stay open across the full
//! attribution-then-merge sequence and are guaranteed released before the
//! run reports completion (the arena is owned by the run and dropped on
//! every exit path, including mid-run failures).

use lopdf::Document;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::task;

use crate::error::{DossierError, Result};

/// An open source document with its metadata.
#[derive(Debug)]
pub struct SourceDocument {
    /// The parsed PDF document.
    pub document: Document,

    /// Path to the source file.
    pub path: PathBuf,

    /// Number of pages in the document.
    pub page_count: usize,

    /// File size in bytes.
    pub file_size: u64,
}

impl SourceDocument {
    /// Extract the text of one page (0-based index).
    ///
    /// # Errors
    ///
    /// Returns [`DossierError::PageTextExtraction`] when the page's content
    /// streams cannot be decoded; the caller skips the page and continues.
    pub fn page_text(&self, page_index: usize) -> Result<String> {
        let page_number = page_index as u32 + 1;
        self.document
            .extract_text(&[page_number])
            .map_err(|err| DossierError::PageTextExtraction {
                path: self.path.clone(),
                page_index,
                reason: err.to_string(),
            })
    }

    /// Extract the text of every page, concatenated in page order.
    ///
    /// Pages that fail extraction are skipped - used for the whole-document
    /// content scan where partial text is better than none.
    pub fn full_text(&self) -> String {
        let mut text = String::new();
        for page_index in 0..self.page_count {
            if let Ok(page) = self.page_text(page_index) {
                text.push_str(&page);
                text.push('\n');
            }
        }
        text
    }
}

/// Open source documents keyed by path.
#[derive(Debug, Default)]
pub struct DocumentArena {
    documents: HashMap<PathBuf, SourceDocument>,
}

impl DocumentArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a document, or return the already-open handle.
    ///
    /// # Errors
    ///
    /// Returns [`DossierError::FailedToLoadPdf`] if the file cannot be
    /// parsed as a PDF or is encrypted.
    pub async fn open(&mut self, path: &Path) -> Result<&SourceDocument> {
        if !self.documents.contains_key(path) {
            let loaded = load_document(path.to_path_buf()).await?;
            self.documents.insert(path.to_path_buf(), loaded);
        }
        Ok(self
            .documents
            .get(path)
            .expect("document was just inserted"))
    }

    /// Get an already-open document.
    pub fn get(&self, path: &Path) -> Option<&SourceDocument> {
        self.documents.get(path)
    }

    /// Drop a handle that turned out not to contribute any pages.
    pub fn discard(&mut self, path: &Path) {
        self.documents.remove(path);
    }

    /// Release every handle.
    pub fn release_all(&mut self) {
        self.documents.clear();
    }

    /// Number of open handles.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the arena holds no handles.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Load a PDF off the async runtime's blocking pool.
async fn load_document(path: PathBuf) -> Result<SourceDocument> {
    let loaded = task::spawn_blocking(move || {
        let document = Document::load(&path)
            .map_err(|err| DossierError::failed_to_load_pdf(path.clone(), err.to_string()))?;

        if document.is_encrypted() {
            return Err(DossierError::failed_to_load_pdf(
                path.clone(),
                "document is encrypted",
            ));
        }

        let page_count = document.get_pages().len();
        let file_size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

        Ok(SourceDocument {
            document,
            path,
            page_count,
            file_size,
        })
    })
    .await
    .map_err(|err| DossierError::other(format!("load task panicked: {err}")))??;

    Ok(loaded)
}
