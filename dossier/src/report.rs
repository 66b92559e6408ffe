//! Per-run warnings and the persisted plain-text reports.
//!
//! All non-fatal conditions are absorbed into a [`RunReport`] owned by the
//! run - there are no process-wide accumulators - and surfaced through the
//! result summary and two report files written into the output folder:
//! a compression summary and a tax-alert summary.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::audit::{CompressionEntry, OptimizationStats};
use crate::error::{DossierError, Result};
use crate::summary::TaxAlertGroup;

/// File name of the compression summary in the output folder.
pub const COMPRESSION_REPORT_FILE: &str = "compression_report.txt";

/// File name of the tax-alert summary in the output folder.
pub const TAX_ALERT_REPORT_FILE: &str = "tax_alert_report.txt";

/// A non-fatal condition surfaced in logs and reports.
#[derive(Debug, Clone, PartialEq)]
pub enum RunWarning {
    /// A manifest source failed and the loader fell through to the next.
    ManifestSourceSkipped {
        /// Path to the skipped source.
        path: PathBuf,
        /// Why it was skipped.
        reason: String,
    },

    /// The derived mapping could not be persisted for later runs.
    MappingExportFailed {
        /// Where the mapping should have been written.
        path: PathBuf,
        /// Why the write failed.
        reason: String,
    },

    /// A second (or later) arrival-notice file was excluded entirely.
    DuplicateArrivalSkipped {
        /// Path to the excluded file.
        path: PathBuf,
    },

    /// A filename matched no classification rule and fell into the
    /// default bucket.
    Unclassified {
        /// The unclassified file name.
        file_name: String,
    },

    /// A source file could not be opened and was skipped.
    FileSkipped {
        /// Path to the skipped file.
        path: PathBuf,
        /// Why it was skipped.
        reason: String,
    },

    /// A single page failed text extraction and was skipped.
    PageSkipped {
        /// Path to the file the page belongs to.
        path: PathBuf,
        /// Zero-based page index.
        page_index: usize,
        /// Why it was skipped.
        reason: String,
    },

    /// A customer document resolved to no client and was excluded.
    UnmatchedDocument {
        /// The excluded file name.
        file_name: String,
    },

    /// A manifest client had no attributed pages; no output was produced.
    NoDocumentsFound {
        /// The client's reference code.
        reference: String,
        /// The client's full name.
        name: String,
    },

    /// One client's merge or save failed; the run continued.
    ClientMergeFailed {
        /// The client's reference code.
        reference: String,
        /// The client's full name.
        name: String,
        /// Why the merge failed.
        reason: String,
    },

    /// Optimization was skipped for one merged file.
    OptimizationSkipped {
        /// File name of the merged output.
        filename: String,
        /// Why optimization was skipped.
        reason: String,
    },
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ManifestSourceSkipped { path, reason } => {
                write!(f, "Manifest source skipped: {} ({reason})", path.display())
            }
            Self::MappingExportFailed { path, reason } => {
                write!(f, "Mapping not persisted to {} ({reason})", path.display())
            }
            Self::DuplicateArrivalSkipped { path } => {
                write!(
                    f,
                    "Duplicate arrival notice excluded from attribution: {}",
                    path.display()
                )
            }
            Self::Unclassified { file_name } => {
                write!(f, "Unclassified file defaulted to Customer Document: {file_name}")
            }
            Self::FileSkipped { path, reason } => {
                write!(f, "File skipped: {} ({reason})", path.display())
            }
            Self::PageSkipped {
                path,
                page_index,
                reason,
            } => {
                write!(
                    f,
                    "Page {} of {} skipped ({reason})",
                    page_index + 1,
                    path.display()
                )
            }
            Self::UnmatchedDocument { file_name } => {
                write!(f, "Unmatched customer document excluded: {file_name}")
            }
            Self::NoDocumentsFound { reference, name } => {
                write!(f, "No documents found for {name} ({reference})")
            }
            Self::ClientMergeFailed {
                reference,
                name,
                reason,
            } => {
                write!(f, "Merge failed for {name} ({reference}): {reason}")
            }
            Self::OptimizationSkipped { filename, reason } => {
                write!(f, "Optimization skipped for {filename}: {reason}")
            }
        }
    }
}

/// Per-run mutable state: warnings and failed clients.
///
/// Created at run start, passed by reference through the pipeline,
/// discarded at run end.
#[derive(Debug, Default)]
pub struct RunReport {
    warnings: Vec<RunWarning>,
    failed_clients: Vec<String>,
}

impl RunReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning.
    pub fn warn(&mut self, warning: RunWarning) {
        if let RunWarning::ClientMergeFailed { reference, .. } = &warning {
            self.failed_clients.push(reference.clone());
        }
        self.warnings.push(warning);
    }

    /// All recorded warnings, in order.
    pub fn warnings(&self) -> &[RunWarning] {
        &self.warnings
    }

    /// References of clients whose merge failed.
    pub fn failed_clients(&self) -> &[String] {
        &self.failed_clients
    }
}

/// Render the compression summary, sorted by savings descending.
pub fn render_compression_report(
    entries: &[CompressionEntry],
    stats: Option<&OptimizationStats>,
    job_id: Option<&str>,
) -> String {
    let mut out = String::new();
    out.push_str("COMPRESSION REPORT\n");
    out.push_str("==================\n");
    if let Some(job_id) = job_id {
        out.push_str(&format!("Job: {job_id}\n"));
    }
    out.push('\n');

    match stats {
        Some(stats) => {
            out.push_str(&format!("Files optimized:     {}\n", stats.files_optimized));
            out.push_str(&format!(
                "Total savings:       {:.2} MB\n",
                stats.total_savings_mb
            ));
            out.push_str(&format!(
                "Average compression: {:.2}x\n",
                stats.average_compression_ratio
            ));
        }
        None => {
            out.push_str("Optimization disabled for this run.\n");
        }
    }
    out.push('\n');

    let mut sorted: Vec<&CompressionEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| {
        b.outcome
            .savings_mb
            .partial_cmp(&a.outcome.savings_mb)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for entry in sorted {
        let outcome = &entry.outcome;
        if outcome.optimized {
            out.push_str(&format!(
                "{}: {:.2} MB -> {:.2} MB (saved {:.2} MB, {:.2}x)\n",
                entry.filename,
                outcome.original_size_mb,
                outcome.final_size_mb,
                outcome.savings_mb,
                outcome.compression_ratio,
            ));
        } else {
            let reason = outcome.reason.as_deref().unwrap_or("not optimized");
            out.push_str(&format!(
                "{}: {:.2} MB ({reason})\n",
                entry.filename, outcome.original_size_mb,
            ));
        }
    }

    if entries.is_empty() {
        out.push_str("No merged files.\n");
    }

    out
}

/// Render the tax-alert summary, grouped by client.
pub fn render_tax_alert_report(groups: &[TaxAlertGroup], job_id: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str("TAX ALERT REPORT\n");
    out.push_str("================\n");
    if let Some(job_id) = job_id {
        out.push_str(&format!("Job: {job_id}\n"));
    }
    out.push('\n');

    let flagged: Vec<&TaxAlertGroup> = groups.iter().filter(|g| !g.alerts.is_empty()).collect();
    if flagged.is_empty() {
        out.push_str("No tax-relevant keywords found.\n");
        return out;
    }

    for group in flagged {
        out.push_str(&format!("{} ({})\n", group.client_name, group.client_ref));
        for alert in &group.alerts {
            out.push_str(&format!(
                "  page {}: \"{}\" - {}\n",
                alert.page_number, alert.keyword, alert.context_snippet
            ));
        }
        out.push('\n');
    }

    out
}

/// Persist both reports into the output folder.
pub async fn persist_reports(
    output_folder: &Path,
    compression_report: &str,
    tax_alert_report: &str,
) -> Result<()> {
    let compression_path = output_folder.join(COMPRESSION_REPORT_FILE);
    tokio::fs::write(&compression_path, compression_report)
        .await
        .map_err(|source| DossierError::FailedToWrite {
            path: compression_path.clone(),
            source,
        })?;

    let tax_path = output_folder.join(TAX_ALERT_REPORT_FILE);
    tokio::fs::write(&tax_path, tax_alert_report)
        .await
        .map_err(|source| DossierError::FailedToWrite {
            path: tax_path.clone(),
            source,
        })?;

    Ok(())
}
