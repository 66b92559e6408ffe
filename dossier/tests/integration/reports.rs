//! Post-merge auditing and persisted reports, end to end.

use crate::common;
use dossier::report::{COMPRESSION_REPORT_FILE, TAX_ALERT_REPORT_FILE};
use tempfile::tempdir;

fn pages_with_tail(count: usize, tail: &str) -> Vec<String> {
    (0..count)
        .map(|i| {
            if i == count - 1 {
                tail.to_string()
            } else {
                format!("ordinary shipping page {i}")
            }
        })
        .collect()
}

// Keyword scanning never inspects pages before index 12: a merged
// document with exactly 12 pages produces zero alerts.
#[tokio::test]
async fn test_twelve_page_dossier_has_no_tax_alerts() {
    let dir = tempdir().unwrap();
    let config = common::test_config(dir.path(), &[("000/527/962", "Jane Doe")]);

    let texts = pages_with_tail(12, "import VAT and customs duty payable");
    let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
    common::create_pdf(&common::input_path(&config, "000-527-962_Document.pdf"), &refs);

    let summary = dossier::run(&config).await.unwrap();

    assert_eq!(summary.stats.merged_clients, 1);
    assert_eq!(summary.tax_alerts.len(), 1);
    assert!(summary.tax_alerts[0].alerts.is_empty());
}

#[tokio::test]
async fn test_keyword_past_offset_is_flagged_and_reported() {
    let dir = tempdir().unwrap();
    let config = common::test_config(dir.path(), &[("000/527/962", "Jane Doe")]);

    // Fourteen pages: the keyword lands on page 14 (index 13), past the
    // scan offset.
    let texts = pages_with_tail(14, "shipment subject to import VAT on arrival");
    let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
    common::create_pdf(&common::input_path(&config, "000-527-962_Document.pdf"), &refs);

    let summary = dossier::run(&config).await.unwrap();

    let group = &summary.tax_alerts[0];
    assert_eq!(group.client_name, "Jane Doe");
    assert_eq!(group.client_ref, "000/527/962");
    assert_eq!(group.alerts.len(), 1);
    assert_eq!(group.alerts[0].keyword, "vat");
    assert_eq!(group.alerts[0].page_number, 14);
    assert!(group.alerts[0].context_snippet.contains("VAT"));

    // The alert also lands in the persisted report.
    let report =
        std::fs::read_to_string(config.output_folder.join(TAX_ALERT_REPORT_FILE)).unwrap();
    assert!(report.contains("Jane Doe"));
    assert!(report.contains("page 14"));
}

#[tokio::test]
async fn test_both_reports_persisted_even_for_empty_runs() {
    let dir = tempdir().unwrap();
    let config = common::test_config(dir.path(), &[("000/527/962", "Jane Doe")]);

    let summary = dossier::run(&config).await.unwrap();
    assert_eq!(summary.stats.merged_clients, 0);

    let compression =
        std::fs::read_to_string(config.output_folder.join(COMPRESSION_REPORT_FILE)).unwrap();
    assert!(compression.contains("COMPRESSION REPORT"));
    assert!(compression.contains("No merged files"));

    let tax = std::fs::read_to_string(config.output_folder.join(TAX_ALERT_REPORT_FILE)).unwrap();
    assert!(tax.contains("No tax-relevant keywords"));

    // The rendered texts are mirrored into the result object.
    assert_eq!(summary.reports.compression, compression);
    assert_eq!(summary.reports.tax_alerts, tax);
}

#[tokio::test]
async fn test_disabled_optimization_reports_null_stats() {
    let dir = tempdir().unwrap();
    let mut config = common::test_config(dir.path(), &[("000/527/962", "Jane Doe")]);
    config.optimize.enabled = false;

    common::create_pdf(
        &common::input_path(&config, "000-527-962_Document.pdf"),
        &["one page"],
    );

    let summary = dossier::run(&config).await.unwrap();
    assert!(summary.stats.optimization.is_none());
    assert!(summary.to_json_line().contains("\"optimization\":null"));

    let compression =
        std::fs::read_to_string(config.output_folder.join(COMPRESSION_REPORT_FILE)).unwrap();
    assert!(compression.contains("Optimization disabled"));
}

#[tokio::test]
async fn test_small_outputs_skip_optimization_with_stats() {
    let dir = tempdir().unwrap();
    let config = common::test_config(dir.path(), &[("000/527/962", "Jane Doe")]);

    common::create_pdf(
        &common::input_path(&config, "000-527-962_Document.pdf"),
        &["one page"],
    );

    let summary = dossier::run(&config).await.unwrap();

    let stats = summary.stats.optimization.unwrap();
    assert_eq!(stats.files_optimized, 0);
    assert_eq!(stats.total_savings_mb, 0.0);

    let compression =
        std::fs::read_to_string(config.output_folder.join(COMPRESSION_REPORT_FILE)).unwrap();
    assert!(compression.contains("File already under target size"));
}
