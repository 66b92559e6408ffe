//! End-to-end runs over real (generated) PDF inputs.

use crate::common;
use tempfile::tempdir;

// Manifest {"000/527/962": "Jane Doe"}; input: an arrival notice whose
// page 3 carries the reference, a one-page bill of lading and a two-page
// customer document matched by filename. Expected: one four-page output
// in the order arrival, bill, customer.
#[tokio::test]
async fn test_full_assembly_scenario() {
    let dir = tempdir().unwrap();
    let config = common::test_config(dir.path(), &[("000/527/962", "Jane Doe")]);

    common::create_pdf(
        &common::input_path(&config, "Advice of Arrival X.pdf"),
        &[
            "vessel schedule cover",
            "notices for other ports",
            "Cust Ref: 000/527/962 arrival notice",
        ],
    );
    common::create_pdf(
        &common::input_path(&config, "000-527-962_HBL.pdf"),
        &["bill of lading page"],
    );
    common::create_pdf(
        &common::input_path(&config, "000-527-962_Document.pdf"),
        &["customer document first page", "customer document second page"],
    );

    let summary = dossier::run(&config).await.unwrap();

    assert!(summary.success);
    assert_eq!(summary.stats.processed_files, 3);
    assert_eq!(summary.stats.merged_clients, 1);

    let output = config.output_folder.join("Jane_Doe_000_527_962.pdf");
    assert!(output.exists(), "dossier written under the derived name");
    assert_eq!(common::page_count(&output), 4);

    // Fixed type order: arrival page, then bill, then customer pages in
    // scan order.
    assert!(common::page_text(&output, 1).contains("arrival notice"));
    assert!(common::page_text(&output, 2).contains("bill of lading"));
    assert!(common::page_text(&output, 3).contains("first page"));
    assert!(common::page_text(&output, 4).contains("second page"));
}

// A manifest entry nothing matches: the run succeeds with zero merged
// clients for it, a warning, and no output file.
#[tokio::test]
async fn test_manifest_entry_without_documents() {
    let dir = tempdir().unwrap();
    let config = common::test_config(dir.path(), &[("111/222/333", "John Smith")]);

    let summary = dossier::run(&config).await.unwrap();

    assert!(summary.success);
    assert_eq!(summary.stats.merged_clients, 0);
    assert!(summary.message.as_deref().unwrap().contains("warning"));

    let entries: Vec<_> = std::fs::read_dir(&config.output_folder)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "pdf"))
        .collect();
    assert!(entries.is_empty(), "no dossier for an unmatched client");
}

#[tokio::test]
async fn test_second_arrival_notice_is_excluded() {
    let dir = tempdir().unwrap();
    let config = common::test_config(dir.path(), &[("000/527/962", "Jane Doe")]);

    // Discovery order is file-name order: "Advice of Arrival A" first.
    common::create_pdf(
        &common::input_path(&config, "Advice of Arrival A.pdf"),
        &["Cust Ref: 000/527/962 from the first notice"],
    );
    common::create_pdf(
        &common::input_path(&config, "Advice of Arrival B.pdf"),
        &["Cust Ref: 000/527/962 from the second notice"],
    );

    let summary = dossier::run(&config).await.unwrap();
    assert_eq!(summary.stats.merged_clients, 1);

    let output = config.output_folder.join("Jane_Doe_000_527_962.pdf");
    assert_eq!(common::page_count(&output), 1);
    assert!(common::page_text(&output, 1).contains("first notice"));
}

#[tokio::test]
async fn test_customer_document_content_fallback() {
    let dir = tempdir().unwrap();
    let config = common::test_config(dir.path(), &[("111/222/333", "John Smith")]);

    // Filename carries no reference; page two does.
    common::create_pdf(
        &common::input_path(&config, "packing_list_scan.pdf"),
        &["packing list", "consignee reference 111-222-333"],
    );

    let summary = dossier::run(&config).await.unwrap();

    assert_eq!(summary.stats.merged_clients, 1);
    let output = config.output_folder.join("John_Smith_111_222_333.pdf");
    assert_eq!(common::page_count(&output), 2);
}

#[tokio::test]
async fn test_unmatched_document_excluded_without_failing() {
    let dir = tempdir().unwrap();
    let config = common::test_config(
        dir.path(),
        &[("000/527/962", "Jane Doe"), ("111/222/333", "John Smith")],
    );

    common::create_pdf(
        &common::input_path(&config, "000-527-962_Document.pdf"),
        &["belongs to Jane"],
    );
    common::create_pdf(
        &common::input_path(&config, "mystery_scan.pdf"),
        &["no reference anywhere"],
    );

    let summary = dossier::run(&config).await.unwrap();

    assert!(summary.success);
    assert_eq!(summary.stats.processed_files, 2);
    assert_eq!(summary.stats.merged_clients, 1);
}

// Exit-code-0-with-zero-merges: an empty input folder is structural
// success, not a failure.
#[tokio::test]
async fn test_empty_input_folder_is_structural_success() {
    let dir = tempdir().unwrap();
    let config = common::test_config(dir.path(), &[("000/527/962", "Jane Doe")]);

    let summary = dossier::run(&config).await.unwrap();

    assert!(summary.success);
    assert_eq!(summary.stats.processed_files, 0);
    assert_eq!(summary.stats.merged_clients, 0);
}

#[tokio::test]
async fn test_json_line_shape() {
    let dir = tempdir().unwrap();
    let config = common::test_config(dir.path(), &[("000/527/962", "Jane Doe")]);

    common::create_pdf(
        &common::input_path(&config, "000-527-962_Document.pdf"),
        &["one page"],
    );

    let summary = dossier::run(&config).await.unwrap();
    let json = summary.to_json_line();

    assert!(!json.contains('\n'));
    assert!(json.contains("\"success\":true"));
    assert!(json.contains("\"merged_clients\":1"));
    assert!(json.contains("\"tax_alerts\""));
}
