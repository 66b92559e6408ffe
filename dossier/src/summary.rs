//! The structured run result returned to the caller.
//!
//! With `--json-output` the summary is emitted as a single JSON line; the
//! shape is stable and consumed by the orchestration layer that invokes
//! the engine as a subprocess.

use serde::Serialize;

use crate::audit::{KeywordAlert, OptimizationStats};

/// Aggregate counters for the run.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    /// Number of input PDFs discovered and classified.
    pub processed_files: usize,

    /// Number of clients that received a merged dossier.
    pub merged_clients: usize,

    /// Optimization totals, `null` when optimization was disabled.
    pub optimization: Option<OptimizationStats>,
}

/// Tax alerts for one merged client.
#[derive(Debug, Clone, Serialize)]
pub struct TaxAlertGroup {
    /// The client's full name.
    pub client_name: String,

    /// The client's reference code.
    pub client_ref: String,

    /// Alerts found in the client's dossier (may be empty).
    pub alerts: Vec<KeywordAlert>,
}

/// The rendered report texts, mirrored into the result for callers that
/// want them without re-reading the output folder.
#[derive(Debug, Clone, Default)]
pub struct RenderedReports {
    /// Contents of `compression_report.txt`.
    pub compression: String,

    /// Contents of `tax_alert_report.txt`.
    pub tax_alerts: String,
}

/// Structured result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Whether the run completed structurally (even with zero merges).
    pub success: bool,

    /// Human-readable outcome message on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Error description on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// The output folder the dossiers and reports were written to.
    pub output_folder: String,

    /// Aggregate counters.
    pub stats: RunStats,

    /// Per-client tax alerts for every merged dossier.
    pub tax_alerts: Vec<TaxAlertGroup>,

    /// Rendered report texts; not part of the JSON shape.
    #[serde(skip)]
    pub reports: RenderedReports,
}

impl RunSummary {
    /// Build a success summary.
    pub fn success(
        message: String,
        output_folder: String,
        stats: RunStats,
        tax_alerts: Vec<TaxAlertGroup>,
        reports: RenderedReports,
    ) -> Self {
        Self {
            success: true,
            message: Some(message),
            error: None,
            output_folder,
            stats,
            tax_alerts,
            reports,
        }
    }

    /// Build a failure summary for a fatal error.
    pub fn failure(error: String, output_folder: String) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error),
            output_folder,
            stats: RunStats {
                processed_files: 0,
                merged_clients: 0,
                optimization: None,
            },
            tax_alerts: Vec::new(),
            reports: RenderedReports::default(),
        }
    }

    /// Serialize as the single-line JSON result.
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| {
            format!("{{\"success\":false,\"error\":\"serialization failed: {err}\"}}")
        })
    }
}
