//! Configuration module for dossier.
//!
//! This module transforms CLI arguments into a validated, normalized
//! configuration that drives a single assembly run. It handles:
//! - Validation of argument combinations
//! - Ordered manifest-source priority (EDI > reference document > mapping file)
//! - Application of defaults

use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

/// Default target size for optimized output, in megabytes.
pub const DEFAULT_TARGET_SIZE_MB: f64 = 1.2;

/// Default optimization quality (0-100).
pub const DEFAULT_QUALITY: u8 = 85;

/// Default file name for the persisted reference mapping.
///
/// The mapping is written outside the output folder and keeps the same name
/// across runs so a later run can pick it up as a fallback manifest source.
pub const DEFAULT_MAPPING_FILE: &str = "client_manifest.csv";

/// One source the client manifest can be loaded from.
///
/// Sources form an explicit ordered strategy list; the loader tries each in
/// turn until one yields a non-empty mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    /// An EDI workbook (`.xls`/`.xlsx`) with reference and name columns.
    /// Trusted as authoritative; no name-validity filtering is applied.
    EdiWorkbook(PathBuf),

    /// A PDF reference document. References and names are recovered from
    /// free text and names are validated against a person-name heuristic.
    ReferenceDocument(PathBuf),

    /// A previously saved two-column mapping file (reference, full name).
    MappingFile(PathBuf),
}

impl ManifestSource {
    /// Path to the underlying file.
    pub fn path(&self) -> &Path {
        match self {
            Self::EdiWorkbook(p) | Self::ReferenceDocument(p) | Self::MappingFile(p) => p,
        }
    }

    /// Short human-readable label for logs and reports.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::EdiWorkbook(_) => "EDI workbook",
            Self::ReferenceDocument(_) => "reference document",
            Self::MappingFile(_) => "mapping file",
        }
    }
}

/// Settings for the post-merge optimization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeSettings {
    /// Whether optimization runs at all.
    pub enabled: bool,

    /// Target size in megabytes; files already under this are left alone.
    pub target_size_mb: f64,

    /// Quality knob (0-100). Lower values allow more aggressive pruning.
    pub quality: u8,
}

impl Default for OptimizeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            target_size_mb: DEFAULT_TARGET_SIZE_MB,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl OptimizeSettings {
    /// Target size converted to bytes.
    pub fn target_size_bytes(&self) -> u64 {
        (self.target_size_mb * 1024.0 * 1024.0) as u64
    }
}

/// Complete configuration for one assembly run.
///
/// This structure contains all settings needed to perform a run, derived
/// and validated from CLI arguments.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Folder containing the loose input PDFs.
    pub input_folder: PathBuf,

    /// Folder merged dossiers and reports are written to.
    pub output_folder: PathBuf,

    /// Manifest sources in priority order.
    pub manifest_sources: Vec<ManifestSource>,

    /// Where to persist the derived reference mapping for later runs.
    pub mapping_export: PathBuf,

    /// Optimization settings.
    pub optimize: OptimizeSettings,

    /// Opaque tag used only for log/report naming.
    pub job_id: Option<String>,

    /// Emit a single-line structured result instead of human text.
    pub json_output: bool,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,

    /// Verbose output mode.
    pub verbose: bool,
}

impl RunConfig {
    /// Create a configuration with defaults for everything but the folders.
    pub fn new(input_folder: PathBuf, output_folder: PathBuf) -> Self {
        Self {
            input_folder,
            output_folder,
            manifest_sources: Vec::new(),
            mapping_export: PathBuf::from(DEFAULT_MAPPING_FILE),
            optimize: OptimizeSettings::default(),
            job_id: None,
            json_output: false,
            quiet: false,
            verbose: false,
        }
    }

    /// Validate the configuration.
    ///
    /// Checks for logical inconsistencies and invalid combinations.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No manifest source is configured
    /// - Verbose and quiet modes are both enabled
    /// - The optimization target size is not positive
    /// - The output folder equals the input folder
    pub fn validate(&self) -> Result<()> {
        if self.manifest_sources.is_empty() {
            bail!("No manifest source configured");
        }

        if self.verbose && self.quiet {
            bail!("Cannot use both --verbose and --quiet");
        }

        if self.optimize.target_size_mb <= 0.0 {
            bail!(
                "Target size must be positive, got {}",
                self.optimize.target_size_mb
            );
        }

        if self.input_folder == self.output_folder {
            bail!(
                "Output folder cannot be the same as the input folder: {}",
                self.output_folder.display()
            );
        }

        Ok(())
    }

    /// Check if output should be displayed.
    pub fn should_print(&self) -> bool {
        !self.quiet && !self.json_output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RunConfig {
        let mut config = RunConfig::new(PathBuf::from("in"), PathBuf::from("out"));
        config.manifest_sources = vec![ManifestSource::EdiWorkbook(PathBuf::from("edi.xls"))];
        config
    }

    #[test]
    fn test_manifest_source_describe() {
        assert_eq!(
            ManifestSource::EdiWorkbook(PathBuf::from("a.xls")).describe(),
            "EDI workbook"
        );
        assert_eq!(
            ManifestSource::ReferenceDocument(PathBuf::from("a.pdf")).describe(),
            "reference document"
        );
        assert_eq!(
            ManifestSource::MappingFile(PathBuf::from("a.csv")).describe(),
            "mapping file"
        );
    }

    #[test]
    fn test_optimize_settings_defaults() {
        let settings = OptimizeSettings::default();
        assert!(settings.enabled);
        assert_eq!(settings.quality, DEFAULT_QUALITY);
        assert_eq!(settings.target_size_bytes(), (1.2 * 1024.0 * 1024.0) as u64);
    }

    #[test]
    fn test_config_validation() {
        let mut config = test_config();
        assert!(config.validate().is_ok());

        // No manifest sources
        config.manifest_sources.clear();
        assert!(config.validate().is_err());
        config.manifest_sources = vec![ManifestSource::MappingFile(PathBuf::from("m.csv"))];

        // Verbose + quiet conflict
        config.verbose = true;
        config.quiet = true;
        assert!(config.validate().is_err());
        config.verbose = false;
        config.quiet = false;

        // Non-positive target size
        config.optimize.target_size_mb = 0.0;
        assert!(config.validate().is_err());
        config.optimize.target_size_mb = 1.2;

        // Output same as input
        config.output_folder = PathBuf::from("in");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_should_print() {
        let mut config = test_config();
        assert!(config.should_print());

        config.quiet = true;
        assert!(!config.should_print());
        config.quiet = false;

        config.json_output = true;
        assert!(!config.should_print());
    }
}
