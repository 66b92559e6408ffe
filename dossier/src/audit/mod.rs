//! Post-merge auditing: tax-keyword scanning and optimization bookkeeping.
//!
//! Every freshly merged dossier is scanned from a fixed page offset onward
//! for tax-relevant keywords, then handed to the Optimizer. Keyword hits
//! are flags, not blocking conditions; optimizer failures degrade to
//! "optimization skipped" with the original file retained.

pub mod optimizer;

pub use optimizer::{OptimizationOutcome, Optimizer, PdfOptimizer};

use std::path::Path;

use lopdf::Document;
use serde::Serialize;
use tokio::task;

use crate::config::OptimizeSettings;
use crate::merge::MergeOutcome;
use crate::report::{RunReport, RunWarning};

/// Keywords flagged during the post-merge scan.
pub const TAX_KEYWORDS: &[&str] = &["tax", "vat", "duty", "customs", "hmrc", "excise"];

/// Zero-based page index the keyword scan starts at. Pages before this are
/// standard boilerplate shared by every dossier and never inspected.
pub const TAX_SCAN_START_PAGE: usize = 12;

/// Number of words kept on each side of a keyword hit.
const CONTEXT_WORDS: usize = 4;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// One flagged keyword occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordAlert {
    /// The keyword that matched.
    pub keyword: String,

    /// One-based page number in the merged dossier.
    pub page_number: u32,

    /// A short word-window around the first occurrence on the page.
    pub context_snippet: String,
}

/// Per-file compression bookkeeping for the report.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionEntry {
    /// Output file name of the dossier.
    pub filename: String,

    /// What the optimizer reported (or a skip record on failure).
    pub outcome: OptimizationOutcome,
}

/// Run-level optimization totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationStats {
    /// Files the optimizer actually rewrote.
    pub files_optimized: usize,

    /// Total megabytes saved across the run.
    pub total_savings_mb: f64,

    /// Summed original bytes divided by summed final bytes.
    pub average_compression_ratio: f64,
}

/// Scans merged dossiers and drives the Optimizer.
pub struct PostMergeAuditor {
    settings: OptimizeSettings,
}

impl PostMergeAuditor {
    /// Create an auditor from run settings.
    pub fn new(settings: &OptimizeSettings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }

    /// Audit every merged dossier in place.
    ///
    /// Fills in each outcome's keyword alerts and final size, and returns
    /// the per-file compression entries plus run totals (`None` when
    /// optimization is disabled).
    pub async fn audit_all(
        &self,
        outcomes: &mut [MergeOutcome],
        report: &mut RunReport,
    ) -> (Vec<CompressionEntry>, Option<OptimizationStats>) {
        let mut entries = Vec::new();
        let mut files_optimized = 0usize;
        let mut total_savings_mb = 0.0f64;
        let mut total_original_bytes = 0u64;
        let mut total_final_bytes = 0u64;

        for outcome in outcomes.iter_mut() {
            match scan_file(&outcome.output_path).await {
                Ok(alerts) => outcome.keyword_alerts = alerts,
                Err(reason) => {
                    report.warn(RunWarning::FileSkipped {
                        path: outcome.output_path.clone(),
                        reason: format!("keyword scan failed: {reason}"),
                    });
                }
            }

            if !self.settings.enabled {
                continue;
            }

            let optimization = self
                .optimize_file(&outcome.output_path)
                .await
                .unwrap_or_else(|err| {
                    let reason = err.to_string();
                    report.warn(RunWarning::OptimizationSkipped {
                        filename: outcome.filename.clone(),
                        reason: reason.clone(),
                    });
                    OptimizationOutcome {
                        optimized: false,
                        reason: Some(reason),
                        original_size_mb: outcome.original_size_bytes as f64 / BYTES_PER_MB,
                        final_size_mb: outcome.original_size_bytes as f64 / BYTES_PER_MB,
                        compression_ratio: 1.0,
                        savings_mb: 0.0,
                    }
                });

            outcome.final_size_bytes = std::fs::metadata(&outcome.output_path)
                .map(|m| m.len())
                .unwrap_or(outcome.original_size_bytes);

            if optimization.optimized {
                files_optimized += 1;
                total_savings_mb += optimization.savings_mb;
            }
            total_original_bytes += outcome.original_size_bytes;
            total_final_bytes += outcome.final_size_bytes;

            entries.push(CompressionEntry {
                filename: outcome.filename.clone(),
                outcome: optimization,
            });
        }

        let stats = self.settings.enabled.then(|| OptimizationStats {
            files_optimized,
            total_savings_mb,
            average_compression_ratio: if total_final_bytes > 0 {
                total_original_bytes as f64 / total_final_bytes as f64
            } else {
                1.0
            },
        });

        (entries, stats)
    }

    /// Run the optimizer off the async runtime.
    async fn optimize_file(&self, path: &Path) -> crate::error::Result<OptimizationOutcome> {
        let optimizer = PdfOptimizer::from_settings(&self.settings);
        let input = path.to_path_buf();
        task::spawn_blocking(move || optimizer.optimize(&input, &input))
            .await
            .map_err(|err| crate::error::DossierError::other(format!("optimize task panicked: {err}")))?
    }
}

/// Load a merged dossier and scan it for keywords.
async fn scan_file(path: &Path) -> std::result::Result<Vec<KeywordAlert>, String> {
    let path = path.to_path_buf();
    task::spawn_blocking(move || {
        let document = Document::load(&path).map_err(|err| err.to_string())?;
        Ok(scan_document(&document))
    })
    .await
    .map_err(|err| format!("scan task panicked: {err}"))?
}

/// Scan a document for tax keywords from [`TAX_SCAN_START_PAGE`] onward.
///
/// A document with no pages past the offset produces no alerts - that is
/// the expected case, not an error. At most one alert is recorded per
/// keyword per page (the first occurrence).
pub fn scan_document(document: &Document) -> Vec<KeywordAlert> {
    let mut alerts = Vec::new();

    for (&page_number, _) in document.get_pages().iter() {
        let page_index = page_number as usize - 1;
        if page_index < TAX_SCAN_START_PAGE {
            continue;
        }

        let Ok(text) = document.extract_text(&[page_number]) else {
            continue;
        };

        for keyword in TAX_KEYWORDS {
            if let Some(snippet) = context_snippet(&text, keyword) {
                alerts.push(KeywordAlert {
                    keyword: (*keyword).to_string(),
                    page_number,
                    context_snippet: snippet,
                });
            }
        }
    }

    alerts
}

/// Word window around the first case-insensitive occurrence of `keyword`.
fn context_snippet(text: &str, keyword: &str) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let hit = words
        .iter()
        .position(|word| word.to_lowercase().contains(keyword))?;

    let start = hit.saturating_sub(CONTEXT_WORDS);
    let end = (hit + CONTEXT_WORDS + 1).min(words.len());
    Some(words[start..end].join(" "))
}
