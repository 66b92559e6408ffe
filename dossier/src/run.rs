//! The per-run pipeline.
//!
//! A run is fully sequential: manifest load -> classify all files ->
//! attribute all pages -> merge all clients -> audit all merges -> reports.
//! All mutable state (warnings, failed clients, open handles) is owned by
//! this function and passed by reference through the stages; nothing
//! outlives the run.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::attribute::{ClassifiedFile, PageAttributor};
use crate::audit::PostMergeAuditor;
use crate::classify::classify_filename;
use crate::config::RunConfig;
use crate::error::{DossierError, Result};
use crate::io::DocumentArena;
use crate::manifest::ManifestLoader;
use crate::matcher::ReferenceMatcher;
use crate::merge::MergeEngine;
use crate::report::{
    RunReport, RunWarning, persist_reports, render_compression_report, render_tax_alert_report,
};
use crate::summary::{RenderedReports, RunStats, RunSummary, TaxAlertGroup};

/// Execute one assembly run.
///
/// Returns a structured summary on structural success - including runs
/// that merged zero clients - and an error only for fatal preconditions
/// or unrecoverable I/O failures. All source handles are released before
/// this function returns, on every path.
pub async fn run(config: &RunConfig) -> Result<RunSummary> {
    config
        .validate()
        .map_err(|err| DossierError::invalid_config(err.to_string()))?;

    if !config.input_folder.is_dir() {
        return Err(DossierError::input_folder_missing(
            config.input_folder.clone(),
        ));
    }

    let mut report = RunReport::new();

    // Manifest first: an empty mapping is a fatal precondition and must
    // fail before any output is produced.
    let loader = ManifestLoader::new();
    let manifest = loader.load(&config.manifest_sources, &config.mapping_export, &mut report)?;

    let matcher = ReferenceMatcher::new();
    let classified: Vec<ClassifiedFile> = discover_input_files(&config.input_folder)?
        .into_iter()
        .map(|path| {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let classification = classify_filename(&file_name, &matcher);
            if classification.defaulted {
                report.warn(RunWarning::Unclassified {
                    file_name: file_name.clone(),
                });
            }
            ClassifiedFile {
                path,
                file_name,
                kind: classification.kind,
            }
        })
        .collect();
    let processed_files = classified.len();

    let mut arena = DocumentArena::new();
    let attributor = PageAttributor::new();
    let bundles = attributor
        .attribute(&classified, &manifest, &mut arena, &mut report)
        .await?;

    let engine = MergeEngine::new();
    let mut outcomes = engine
        .merge_all(&manifest, &bundles, &mut arena, &config.output_folder, &mut report)
        .await?;

    let auditor = PostMergeAuditor::new(&config.optimize);
    let (compression_entries, optimization_stats) =
        auditor.audit_all(&mut outcomes, &mut report).await;

    let tax_alerts: Vec<TaxAlertGroup> = outcomes
        .iter()
        .map(|outcome| TaxAlertGroup {
            client_name: outcome.full_name.clone(),
            client_ref: outcome.reference.clone(),
            alerts: outcome.keyword_alerts.clone(),
        })
        .collect();

    let job_id = config.job_id.as_deref();
    let reports = RenderedReports {
        compression: render_compression_report(
            &compression_entries,
            optimization_stats.as_ref(),
            job_id,
        ),
        tax_alerts: render_tax_alert_report(&tax_alerts, job_id),
    };
    persist_reports(&config.output_folder, &reports.compression, &reports.tax_alerts).await?;

    let merged_clients = outcomes.len();
    let mut message = format!(
        "Merged {merged_clients} client(s) from {processed_files} input file(s)"
    );
    if !report.warnings().is_empty() {
        message.push_str(&format!(" ({} warning(s))", report.warnings().len()));
    }
    if !report.failed_clients().is_empty() {
        message.push_str(&format!(
            "; {} client(s) failed to merge",
            report.failed_clients().len()
        ));
    }

    Ok(RunSummary::success(
        message,
        config.output_folder.display().to_string(),
        RunStats {
            processed_files,
            merged_clients,
            optimization: optimization_stats,
        },
        tax_alerts,
        reports,
    ))
}

/// Discover input PDFs in deterministic order.
///
/// Only the folder's top level is scanned; entries are ordered by file
/// name so "discovery order" (which decides the single arrival notice) is
/// stable regardless of directory enumeration order.
pub fn discover_input_files(input_folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(input_folder)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = entry.map_err(|err| DossierError::other(err.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_pdf = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
