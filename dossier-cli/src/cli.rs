//! CLI argument parsing for dossier.
//!
//! This module defines the command-line interface structure using `clap`
//! and converts parsed arguments into a validated run configuration.

use clap::Parser;
use std::path::PathBuf;

use dossier::config::{DEFAULT_MAPPING_FILE, ManifestSource, OptimizeSettings, RunConfig};
use dossier::error::{DossierError, Result};

/// Assemble per-client shipment dossiers from loose shipping PDFs.
///
/// dossier attributes every page of the input folder's PDFs to a client
/// from the reference manifest and merges each client's pages, in the
/// order arrival notice, bill of lading, customer documents, into one
/// output file per client.
#[derive(Parser, Debug)]
#[command(name = "dossier")]
#[command(version)]
#[command(about = "Assemble per-client shipment dossiers from shipping PDFs", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Folder containing the loose input PDFs
    #[arg(long, value_name = "DIR")]
    pub input_folder: PathBuf,

    /// Folder the merged dossiers and reports are written to
    #[arg(long, value_name = "DIR")]
    pub output_folder: PathBuf,

    /// EDI workbook (.xls/.xlsx) holding the reference manifest
    ///
    /// Takes priority over --reference-doc and --manifest-file.
    #[arg(long, value_name = "FILE")]
    pub edi_file: Option<PathBuf>,

    /// PDF reference document to recover the manifest from
    ///
    /// Used when no EDI workbook is given (or it fails to load). Names
    /// recovered from free text are validated against a person-name
    /// heuristic.
    #[arg(long, value_name = "FILE")]
    pub reference_doc: Option<PathBuf>,

    /// Previously saved two-column mapping file (reference, full name)
    ///
    /// Lowest-priority manifest source. When omitted, the default mapping
    /// file from an earlier run is used as a last resort if present.
    #[arg(long, value_name = "FILE")]
    pub manifest_file: Option<PathBuf>,

    /// Enable post-merge optimization (the default)
    #[arg(long, conflicts_with = "disable_optimization")]
    pub enable_optimization: bool,

    /// Disable post-merge optimization
    #[arg(long)]
    pub disable_optimization: bool,

    /// Target size in megabytes for optimized dossiers
    #[arg(long, value_name = "MB", default_value_t = 1.2)]
    pub target_size: f64,

    /// Optimization quality (0-100); lower allows more aggressive pruning
    #[arg(long, value_name = "N", default_value_t = 85)]
    pub quality: u8,

    /// Opaque job tag used only for log/report naming
    #[arg(long, value_name = "TAG")]
    pub job_id: Option<String>,

    /// Emit a single-line structured JSON result instead of human text
    #[arg(long)]
    pub json_output: bool,

    /// Where to persist the derived reference mapping
    ///
    /// Defaults to a fixed file name so consecutive runs can reuse it.
    #[arg(long, value_name = "FILE")]
    pub mapping_export: Option<PathBuf>,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose output - show per-file detail
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Convert CLI arguments into a validated [`RunConfig`].
    ///
    /// Manifest sources are ordered EDI workbook > reference document >
    /// mapping file; the default mapping file is appended as a final
    /// fallback when it exists and was not explicitly given.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting configuration fails validation.
    pub fn to_config(&self) -> Result<RunConfig> {
        let mapping_export = self
            .mapping_export
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MAPPING_FILE));

        let mut manifest_sources = Vec::new();
        if let Some(ref path) = self.edi_file {
            manifest_sources.push(ManifestSource::EdiWorkbook(path.clone()));
        }
        if let Some(ref path) = self.reference_doc {
            manifest_sources.push(ManifestSource::ReferenceDocument(path.clone()));
        }
        if let Some(ref path) = self.manifest_file {
            manifest_sources.push(ManifestSource::MappingFile(path.clone()));
        } else if mapping_export.exists() {
            manifest_sources.push(ManifestSource::MappingFile(mapping_export.clone()));
        }

        let config = RunConfig {
            input_folder: self.input_folder.clone(),
            output_folder: self.output_folder.clone(),
            manifest_sources,
            mapping_export,
            optimize: OptimizeSettings {
                enabled: !self.disable_optimization,
                target_size_mb: self.target_size,
                quality: self.quality,
            },
            job_id: self.job_id.clone(),
            json_output: self.json_output,
            quiet: self.quiet,
            verbose: self.verbose,
        };

        config.validate().map_err(|err| {
            DossierError::invalid_config(format!("Configuration validation failed: {err}"))
        })?;

        Ok(config)
    }

    /// Validate CLI arguments before processing.
    ///
    /// Performs early validation that doesn't require file I/O.
    ///
    /// # Errors
    ///
    /// Returns an error if no manifest source is available or a numeric
    /// argument is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.quality > 100 {
            return Err(DossierError::invalid_config(format!(
                "Quality must be between 0 and 100, got {}",
                self.quality
            )));
        }

        if self.target_size <= 0.0 {
            return Err(DossierError::invalid_config(format!(
                "Target size must be positive, got {}",
                self.target_size
            )));
        }

        let default_mapping_exists = self
            .mapping_export
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MAPPING_FILE))
            .exists();
        if self.edi_file.is_none()
            && self.reference_doc.is_none()
            && self.manifest_file.is_none()
            && !default_mapping_exists
        {
            return Err(DossierError::invalid_config(
                "No manifest source: supply --edi-file, --reference-doc or --manifest-file",
            ));
        }

        Ok(())
    }
}
