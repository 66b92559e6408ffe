//! Manifest source strategies exercised through full runs.

use crate::common;
use dossier::DossierError;
use dossier::config::ManifestSource;
use tempfile::tempdir;

// The reference-document path recovers names from free text and persists
// the derived mapping for later runs.
#[tokio::test]
async fn test_reference_document_strategy_and_mapping_export() {
    let dir = tempdir().unwrap();
    let mut config = common::test_config(dir.path(), &[("999/999/999", "Unused Entry")]);

    let reference_doc = dir.path().join("client_listing.pdf");
    common::create_pdf(
        &reference_doc,
        &[
            "000/527/962: Jane Doe",
            "111-222-333: John Smith",
            "555/666/777: ACME SHIPPING LTD",
        ],
    );
    config.manifest_sources = vec![ManifestSource::ReferenceDocument(reference_doc)];

    common::create_pdf(
        &common::input_path(&config, "000-527-962_Document.pdf"),
        &["customer pages"],
    );

    let summary = dossier::run(&config).await.unwrap();
    assert_eq!(summary.stats.merged_clients, 1);
    assert!(config.output_folder.join("Jane_Doe_000_527_962.pdf").exists());

    // The derived mapping was persisted under the fixed name, and the
    // company-looking entry was filtered by the person-name heuristic.
    let exported = std::fs::read_to_string(&config.mapping_export).unwrap();
    assert!(exported.starts_with("ConsigneeRef,FullName"));
    assert!(exported.contains("000/527/962,Jane Doe"));
    assert!(exported.contains("111/222/333,John Smith"));
    assert!(!exported.contains("ACME"));
}

// EDI > reference document > mapping file: a failing higher-priority
// source falls through without failing the run.
#[tokio::test]
async fn test_priority_fallthrough_on_broken_edi() {
    let dir = tempdir().unwrap();
    let mut config = common::test_config(dir.path(), &[("000/527/962", "Jane Doe")]);

    let broken_edi = dir.path().join("broken.xls");
    std::fs::write(&broken_edi, b"not a workbook").unwrap();

    let mapping = dir.path().join("manifest.csv");
    config.manifest_sources = vec![
        ManifestSource::EdiWorkbook(broken_edi),
        ManifestSource::MappingFile(mapping),
    ];

    common::create_pdf(
        &common::input_path(&config, "000-527-962_Document.pdf"),
        &["page"],
    );

    let summary = dossier::run(&config).await.unwrap();
    assert_eq!(summary.stats.merged_clients, 1);
    assert!(summary.message.as_deref().unwrap().contains("warning"));
}

#[tokio::test]
async fn test_no_usable_source_is_fatal() {
    let dir = tempdir().unwrap();
    let mut config = common::test_config(dir.path(), &[("000/527/962", "Jane Doe")]);
    config.manifest_sources = vec![ManifestSource::MappingFile(dir.path().join("absent.csv"))];

    let result = dossier::run(&config).await;
    assert!(matches!(
        result,
        Err(DossierError::ManifestUnavailable { .. })
    ));
}
