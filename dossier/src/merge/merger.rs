//! The per-client merge engine.
//!
//! Iterates manifest entries in manifest order, builds one output document
//! per client with a non-empty bundle, and writes it under a deterministic
//! filename derived from the client's reference and name. Empty bundles
//! are skipped with a "no documents found" warning; a failure while
//! merging one client never aborts the run.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use lopdf::{Document, ObjectId};
use serde::Serialize;

use crate::attribute::ClientBundle;
use crate::audit::KeywordAlert;
use crate::classify::DocumentKind;
use crate::error::{DossierError, Result};
use crate::io::{DocumentArena, PdfWriter};
use crate::manifest::Manifest;
use crate::merge::pages::{copy_page, finalize_output, new_output_document};
use crate::report::{RunReport, RunWarning};

/// Page counts of a merged dossier, by document type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageCounts {
    /// Arrival-notice pages.
    pub arrival: usize,
    /// Bill-of-lading pages.
    pub bill: usize,
    /// Customer-document pages.
    pub customer: usize,
}

impl PageCounts {
    /// Total pages across the three groups.
    pub fn total(&self) -> usize {
        self.arrival + self.bill + self.customer
    }
}

/// One successfully merged client dossier.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The client's reference code.
    pub reference: String,

    /// The client's full name.
    pub full_name: String,

    /// Output file name (within the output folder).
    pub filename: String,

    /// Full path of the written dossier.
    pub output_path: PathBuf,

    /// Page counts by document type.
    pub page_counts: PageCounts,

    /// Size of the written file before optimization.
    pub original_size_bytes: u64,

    /// Size after optimization (equals original until the auditor runs).
    pub final_size_bytes: u64,

    /// Tax-keyword alerts found by the auditor.
    pub keyword_alerts: Vec<KeywordAlert>,
}

/// Builds and writes one dossier per client.
pub struct MergeEngine {
    writer: PdfWriter,
}

impl MergeEngine {
    /// Create a merge engine with the default atomic writer.
    pub fn new() -> Self {
        Self {
            writer: PdfWriter::new(),
        }
    }

    /// Merge every non-empty bundle into a dossier in the output folder.
    ///
    /// Bundles must be in manifest order (the attributor guarantees this).
    /// All arena handles are released before returning, including when a
    /// client fails.
    ///
    /// # Errors
    ///
    /// Returns [`DossierError::ManifestUnavailable`] when called with an
    /// empty manifest - a fatal precondition - and propagates output-folder
    /// creation failures. Per-client failures are absorbed into the report.
    pub async fn merge_all(
        &self,
        manifest: &Manifest,
        bundles: &[ClientBundle],
        arena: &mut DocumentArena,
        output_folder: &Path,
        report: &mut RunReport,
    ) -> Result<Vec<MergeOutcome>> {
        if manifest.is_empty() {
            return Err(DossierError::manifest_unavailable(
                "refusing to merge with an empty reference mapping",
            ));
        }

        tokio::fs::create_dir_all(output_folder).await.map_err(|source| {
            DossierError::FailedToCreateOutput {
                path: output_folder.to_path_buf(),
                source,
            }
        })?;

        let mut outcomes = Vec::new();

        for bundle in bundles {
            if bundle.is_empty() {
                report.warn(RunWarning::NoDocumentsFound {
                    reference: bundle.reference.clone(),
                    name: bundle.full_name.clone(),
                });
                continue;
            }

            match self.merge_client(bundle, arena, output_folder).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    report.warn(RunWarning::ClientMergeFailed {
                        reference: bundle.reference.clone(),
                        name: bundle.full_name.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        arena.release_all();
        Ok(outcomes)
    }

    /// Merge one client's bundle and write the dossier.
    async fn merge_client(
        &self,
        bundle: &ClientBundle,
        arena: &DocumentArena,
        output_folder: &Path,
    ) -> Result<MergeOutcome> {
        let (document, page_counts) = assemble_dossier(bundle, arena)?;

        let filename = output_filename(&bundle.reference, &bundle.full_name);
        let output_path = output_folder.join(&filename);

        let size = self.writer.save(document, &output_path).await?;

        Ok(MergeOutcome {
            reference: bundle.reference.clone(),
            full_name: bundle.full_name.clone(),
            filename,
            output_path,
            page_counts,
            original_size_bytes: size,
            final_size_bytes: size,
            keyword_alerts: Vec::new(),
        })
    }
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the merged document for one bundle.
///
/// Pages are copied Arrival -> Bill -> Customer, scan order within each
/// group. Each contributing source is cloned and renumbered once, so one
/// open source can feed any number of client dossiers.
pub fn assemble_dossier(
    bundle: &ClientBundle,
    arena: &DocumentArena,
) -> Result<(Document, PageCounts)> {
    let (mut output, pages_root) = new_output_document();
    let mut prepared: HashMap<PathBuf, (Document, BTreeMap<u32, ObjectId>)> = HashMap::new();
    let mut kids = Vec::new();
    let mut page_counts = PageCounts::default();

    let ordered = [
        DocumentKind::ArrivalNotice,
        DocumentKind::BillOfLading,
        DocumentKind::CustomerDocument,
    ]
    .into_iter()
    .flat_map(|kind| bundle.pages_of(kind));

    for attribution in ordered {
        if !prepared.contains_key(&attribution.source) {
            let source = arena.get(&attribution.source).ok_or_else(|| {
                DossierError::merge_failed(
                    &bundle.reference,
                    format!("source not open: {}", attribution.source.display()),
                )
            })?;

            let mut clone = source.document.clone();
            clone.renumber_objects_with(output.max_id + 1);
            output.max_id = clone.max_id;
            let page_map = clone.get_pages();
            prepared.insert(attribution.source.clone(), (clone, page_map));
        }

        let (source_doc, page_map) = prepared
            .get(&attribution.source)
            .expect("source was just prepared");

        let page_number = attribution.page_index as u32 + 1;
        let page_id = *page_map.get(&page_number).ok_or_else(|| {
            DossierError::merge_failed(
                &bundle.reference,
                format!(
                    "page {} missing from {}",
                    page_number,
                    attribution.source.display()
                ),
            )
        })?;

        let kid = copy_page(&mut output, source_doc, page_id, pages_root)?;
        kids.push(kid);

        match attribution.kind {
            DocumentKind::ArrivalNotice => page_counts.arrival += 1,
            DocumentKind::BillOfLading => page_counts.bill += 1,
            DocumentKind::CustomerDocument => page_counts.customer += 1,
        }
    }

    finalize_output(&mut output, pages_root, &kids)?;
    Ok((output, page_counts))
}

/// Derive the deterministic output filename for a client.
///
/// The name keeps alphanumerics, `-` and `_`, with whitespace collapsed to
/// `_`; the reference's `/` separators become `_`.
pub fn output_filename(reference: &str, full_name: &str) -> String {
    let name_part = sanitize_component(full_name);
    let reference_part = sanitize_component(&reference.replace('/', "_"));

    if name_part.is_empty() {
        format!("{reference_part}.pdf")
    } else {
        format!("{name_part}_{reference_part}.pdf")
    }
}

/// Keep alphanumerics, `-` and `_`; whitespace becomes `_`; everything
/// else is stripped.
fn sanitize_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.trim().chars() {
        if ch.is_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
        } else if ch.is_whitespace() && !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}
