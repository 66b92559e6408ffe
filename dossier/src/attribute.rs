//! Page-to-client attribution.
//!
//! Walks every page of every classified input file, applies the reference
//! matcher, and accumulates a per-client collection of page attributions.
//! Multi-client documents (arrival notices, bills of lading) are scanned
//! page by page; single-client customer documents are attributed wholesale
//! from their filename, falling back to a full-text scan.
//!
//! Exactly one arrival-notice file is considered per run: any later file
//! classified as an arrival notice is excluded from attribution entirely,
//! not merely deduplicated per page.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::classify::DocumentKind;
use crate::error::{DossierError, Result};
use crate::io::DocumentArena;
use crate::manifest::Manifest;
use crate::matcher::ReferenceMatcher;
use crate::report::{RunReport, RunWarning};

/// One page assigned to one client.
///
/// Never mutated after creation; discarded once the owning client's
/// dossier has been merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAttribution {
    /// Arena key of the source document.
    pub source: PathBuf,

    /// Zero-based page index within the source document.
    pub page_index: usize,

    /// Document type the page was classified under.
    pub kind: DocumentKind,
}

/// The accumulated set of pages attributed to one client reference.
///
/// `pages` is in scan order; the final merge order is recomputed from the
/// document kind. A bundle may be empty when the manifest lists a client
/// whose documents were never found - tracked, not an error.
#[derive(Debug, Clone)]
pub struct ClientBundle {
    /// The client's reference code (a manifest key).
    pub reference: String,

    /// The client's full name from the manifest.
    pub full_name: String,

    /// Attributed pages in scan order.
    pub pages: Vec<PageAttribution>,
}

impl ClientBundle {
    /// Create an empty bundle for a manifest entry.
    pub fn new(reference: String, full_name: String) -> Self {
        Self {
            reference,
            full_name,
            pages: Vec::new(),
        }
    }

    /// Whether any pages were attributed.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Pages of one kind, scan order preserved.
    pub fn pages_of(&self, kind: DocumentKind) -> impl Iterator<Item = &PageAttribution> {
        self.pages.iter().filter(move |page| page.kind == kind)
    }

    /// Number of pages of one kind.
    pub fn count_of(&self, kind: DocumentKind) -> usize {
        self.pages_of(kind).count()
    }
}

/// An input file with its classification.
#[derive(Debug, Clone)]
pub struct ClassifiedFile {
    /// Full path of the input file.
    pub path: PathBuf,

    /// Bare file name, used for matching and warnings.
    pub file_name: String,

    /// Assigned document type.
    pub kind: DocumentKind,
}

/// Walks input files and assigns pages to client bundles.
pub struct PageAttributor {
    matcher: ReferenceMatcher,
}

impl PageAttributor {
    /// Create an attributor.
    pub fn new() -> Self {
        Self {
            matcher: ReferenceMatcher::new(),
        }
    }

    /// Attribute every page of every file to a client bundle.
    ///
    /// Returns one bundle per manifest entry, in manifest order, empty
    /// bundles included. Source documents that contributed pages stay open
    /// in `arena` for the merge stage; documents that contributed nothing
    /// are discarded.
    ///
    /// Per-file and per-page failures are recoverable: the file or page is
    /// skipped with a warning and the run continues.
    pub async fn attribute(
        &self,
        files: &[ClassifiedFile],
        manifest: &Manifest,
        arena: &mut DocumentArena,
        report: &mut RunReport,
    ) -> Result<Vec<ClientBundle>> {
        let mut bundles: Vec<ClientBundle> = manifest
            .iter()
            .map(|entry| ClientBundle::new(entry.reference.clone(), entry.full_name.clone()))
            .collect();
        let index: HashMap<String, usize> = bundles
            .iter()
            .enumerate()
            .map(|(i, bundle)| (bundle.reference.clone(), i))
            .collect();

        let mut arrival_taken = false;

        for file in files {
            if file.kind == DocumentKind::ArrivalNotice {
                if arrival_taken {
                    report.warn(RunWarning::DuplicateArrivalSkipped {
                        path: file.path.clone(),
                    });
                    continue;
                }
                arrival_taken = true;
            }

            let outcome = if file.kind.is_multi_client() {
                self.attribute_multi_client(file, manifest, arena, &index, &mut bundles, report)
                    .await
            } else {
                self.attribute_single_client(file, manifest, arena, &index, &mut bundles, report)
                    .await
            };

            if let Err(err) = outcome {
                if err.is_recoverable() {
                    report.warn(RunWarning::FileSkipped {
                        path: file.path.clone(),
                        reason: err.to_string(),
                    });
                } else {
                    return Err(err);
                }
            }
        }

        Ok(bundles)
    }

    /// Page-by-page attribution for arrival notices and bills of lading.
    ///
    /// First reference match per page wins; a page belongs to at most one
    /// client. A page whose text yields no match falls back to the
    /// reference embedded in the file name - bills of lading are usually
    /// named by reference and their pages often carry no machine-readable
    /// code.
    async fn attribute_multi_client(
        &self,
        file: &ClassifiedFile,
        manifest: &Manifest,
        arena: &mut DocumentArena,
        index: &HashMap<String, usize>,
        bundles: &mut [ClientBundle],
        report: &mut RunReport,
    ) -> Result<()> {
        let document = arena.open(&file.path).await?;
        let page_count = document.page_count;
        let mut contributed = false;

        for page_index in 0..page_count {
            let text = match document.page_text(page_index) {
                Ok(text) => text,
                Err(err) => {
                    report.warn(RunWarning::PageSkipped {
                        path: file.path.clone(),
                        page_index,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            let resolved = self
                .matcher
                .resolve(&text, manifest)
                .or_else(|| self.matcher.resolve(&file.file_name, manifest));

            if let Some((reference, _)) = resolved
                && let Some(&bundle_index) = index.get(reference)
            {
                bundles[bundle_index].pages.push(PageAttribution {
                    source: file.path.clone(),
                    page_index,
                    kind: file.kind,
                });
                contributed = true;
            }
        }

        if !contributed {
            arena.discard(&file.path);
        }
        Ok(())
    }

    /// Wholesale attribution for customer documents.
    ///
    /// The filename is tried first and short-circuits; only when it does
    /// not resolve is the document's full text scanned for a manifest
    /// reference appearing verbatim. A document resolving to no client is
    /// excluded from every bundle.
    async fn attribute_single_client(
        &self,
        file: &ClassifiedFile,
        manifest: &Manifest,
        arena: &mut DocumentArena,
        index: &HashMap<String, usize>,
        bundles: &mut [ClientBundle],
        report: &mut RunReport,
    ) -> Result<()> {
        let document = arena.open(&file.path).await?;
        let page_count = document.page_count;

        let resolved = self
            .matcher
            .resolve(&file.file_name, manifest)
            .or_else(|| self.matcher.scan_verbatim(&document.full_text(), manifest));

        let Some((reference, _)) = resolved else {
            report.warn(RunWarning::UnmatchedDocument {
                file_name: file.file_name.clone(),
            });
            arena.discard(&file.path);
            return Ok(());
        };

        let bundle_index = *index.get(reference).ok_or_else(|| {
            DossierError::other(format!("resolved reference {reference} missing from manifest"))
        })?;

        for page_index in 0..page_count {
            bundles[bundle_index].pages.push(PageAttribution {
                source: file.path.clone(),
                page_index,
                kind: file.kind,
            });
        }
        Ok(())
    }
}

impl Default for PageAttributor {
    fn default() -> Self {
        Self::new()
    }
}
