//! The Optimizer collaborator.
//!
//! Narrow contract: `optimize(input, output)` shrinks a merged dossier
//! toward the target size and reports what happened. It is idempotent -
//! re-running on an already-optimized file reports `optimized: false` -
//! and never leaves the output larger than the input.

use std::path::Path;

use lopdf::Document;
use serde::Serialize;

use crate::config::OptimizeSettings;
use crate::error::{DossierError, Result};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Result of one optimization attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationOutcome {
    /// Whether the file was actually rewritten.
    pub optimized: bool,

    /// Why optimization was skipped, when it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Input size in megabytes.
    pub original_size_mb: f64,

    /// Output size in megabytes.
    pub final_size_mb: f64,

    /// Original bytes divided by final bytes.
    pub compression_ratio: f64,

    /// Megabytes saved.
    pub savings_mb: f64,
}

impl OptimizationOutcome {
    fn skipped(size_bytes: u64, reason: &str) -> Self {
        let size_mb = size_bytes as f64 / BYTES_PER_MB;
        Self {
            optimized: false,
            reason: Some(reason.to_string()),
            original_size_mb: size_mb,
            final_size_mb: size_mb,
            compression_ratio: 1.0,
            savings_mb: 0.0,
        }
    }
}

/// Shrinks a PDF toward a target size.
pub trait Optimizer {
    /// Optimize `input` into `output` (the two may be the same path).
    ///
    /// # Errors
    ///
    /// Returns [`DossierError::OptimizationFailed`] when the file cannot
    /// be processed; the caller treats this as "optimization skipped" and
    /// keeps the original.
    fn optimize(&self, input: &Path, output: &Path) -> Result<OptimizationOutcome>;
}

/// Optimizer backed by lopdf stream compression and object pruning.
#[derive(Debug, Clone)]
pub struct PdfOptimizer {
    target_size_bytes: u64,
    quality: u8,
}

impl PdfOptimizer {
    /// Build an optimizer from run settings.
    pub fn from_settings(settings: &OptimizeSettings) -> Self {
        Self {
            target_size_bytes: settings.target_size_bytes(),
            quality: settings.quality,
        }
    }
}

impl Optimizer for PdfOptimizer {
    fn optimize(&self, input: &Path, output: &Path) -> Result<OptimizationOutcome> {
        let original_size = std::fs::metadata(input)
            .map_err(|err| {
                DossierError::optimization_failed(input.to_path_buf(), err.to_string())
            })?
            .len();

        if original_size <= self.target_size_bytes {
            if output != input {
                std::fs::copy(input, output).map_err(|err| {
                    DossierError::optimization_failed(input.to_path_buf(), err.to_string())
                })?;
            }
            return Ok(OptimizationOutcome::skipped(
                original_size,
                "File already under target size",
            ));
        }

        let mut document = Document::load(input).map_err(|err| {
            DossierError::optimization_failed(input.to_path_buf(), err.to_string())
        })?;

        document.compress();
        if self.quality < 90 {
            // More aggressive cleanup once the caller accepts quality loss.
            document.prune_objects();
        }
        document.renumber_objects();

        // Write to a temp sibling first: if the rewrite did not shrink the
        // file, the original must be kept untouched.
        let temp = output.with_extension("opt.tmp");
        document.save(&temp).map_err(|err| {
            DossierError::optimization_failed(input.to_path_buf(), err.to_string())
        })?;

        let final_size = std::fs::metadata(&temp).map(|m| m.len()).unwrap_or(u64::MAX);

        if final_size >= original_size {
            let _ = std::fs::remove_file(&temp);
            if output != input {
                std::fs::copy(input, output).map_err(|err| {
                    DossierError::optimization_failed(input.to_path_buf(), err.to_string())
                })?;
            }
            return Ok(OptimizationOutcome::skipped(
                original_size,
                "Optimization did not reduce file size",
            ));
        }

        std::fs::rename(&temp, output).map_err(|err| {
            DossierError::optimization_failed(output.to_path_buf(), err.to_string())
        })?;

        Ok(OptimizationOutcome {
            optimized: true,
            reason: None,
            original_size_mb: original_size as f64 / BYTES_PER_MB,
            final_size_mb: final_size as f64 / BYTES_PER_MB,
            compression_ratio: original_size as f64 / final_size as f64,
            savings_mb: (original_size - final_size) as f64 / BYTES_PER_MB,
        })
    }
}
