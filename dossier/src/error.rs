//! Error types for dossier.
//!
//! This module defines all error types that can occur while assembling
//! client dossiers. The taxonomy follows the run model:
//!
//! - **Fatal preconditions**: missing input folder, no usable manifest -
//!   abort the run with a non-zero exit code.
//! - **Per-file errors**: a source document fails to open or a page fails
//!   text extraction - the file/page is skipped, the run continues.
//! - **Per-client errors**: merge or save failure for one client - that
//!   client is marked failed, the run continues.
//! - **Optimizer failures**: optimization is skipped for that file.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for dossier operations.
pub type Result<T> = std::result::Result<T, DossierError>;

/// Main error type for dossier operations.
#[derive(Debug)]
pub enum DossierError {
    /// Input folder does not exist or is not a directory.
    InputFolderMissing {
        /// Path that was expected to be the input folder.
        path: PathBuf,
    },

    /// No manifest could be loaded from any configured source.
    ///
    /// The merge engine refuses to run with an empty reference mapping,
    /// so this is a fatal precondition.
    ManifestUnavailable {
        /// Why every manifest source failed.
        reason: String,
    },

    /// A single manifest source could not be used.
    ///
    /// Recoverable: the loader falls through to the next source.
    ManifestSourceFailed {
        /// Path to the source that failed.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Failed to load a source PDF.
    FailedToLoadPdf {
        /// Path to the PDF file.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Text extraction failed for a single page.
    PageTextExtraction {
        /// Path to the PDF file.
        path: PathBuf,
        /// Zero-based index of the page.
        page_index: usize,
        /// Reason for the failure.
        reason: String,
    },

    /// Merging one client's bundle failed.
    MergeFailed {
        /// Reference code of the client.
        reference: String,
        /// Description of what went wrong.
        reason: String,
    },

    /// Failed to create an output file or directory.
    FailedToCreateOutput {
        /// Path where output should be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to write to an output file.
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The optimizer collaborator failed on one file.
    OptimizationFailed {
        /// Path to the file being optimized.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Invalid configuration.
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// Generic I/O error.
    Io {
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Generic error with a custom message.
    Other {
        /// Error message.
        message: String,
    },
}

impl fmt::Display for DossierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputFolderMissing { path } => {
                write!(f, "Input folder not found: {}", path.display())
            }
            Self::ManifestUnavailable { reason } => {
                write!(
                    f,
                    "No usable client manifest: {reason}\n  \
                     Hint: supply --edi-file, --reference-doc or --manifest-file"
                )
            }
            Self::ManifestSourceFailed { path, reason } => {
                write!(
                    f,
                    "Manifest source unusable: {}\n  Reason: {}",
                    path.display(),
                    reason
                )
            }
            Self::FailedToLoadPdf { path, reason } => {
                write!(
                    f,
                    "Failed to load PDF: {}\n  Reason: {}",
                    path.display(),
                    reason
                )
            }
            Self::PageTextExtraction {
                path,
                page_index,
                reason,
            } => {
                write!(
                    f,
                    "Failed to extract text from page {} of {}\n  Reason: {}",
                    page_index + 1,
                    path.display(),
                    reason
                )
            }
            Self::MergeFailed { reference, reason } => {
                write!(f, "Merge failed for client {reference}: {reason}")
            }
            Self::FailedToCreateOutput { path, source } => {
                write!(
                    f,
                    "Failed to create output: {}\n  Reason: {}",
                    path.display(),
                    source
                )
            }
            Self::FailedToWrite { path, source } => {
                write!(
                    f,
                    "Failed to write to output file: {}\n  Reason: {}",
                    path.display(),
                    source
                )
            }
            Self::OptimizationFailed { path, reason } => {
                write!(
                    f,
                    "Optimization failed for: {}\n  Reason: {}",
                    path.display(),
                    reason
                )
            }
            Self::InvalidConfig { message } => {
                write!(f, "Invalid configuration: {message}")
            }
            Self::Io { source } => {
                write!(f, "I/O error: {source}")
            }
            Self::Other { message } => {
                write!(f, "{message}")
            }
        }
    }
}

impl std::error::Error for DossierError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FailedToCreateOutput { source, .. } => Some(source),
            Self::FailedToWrite { source, .. } => Some(source),
            Self::Io { source } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for DossierError {
    fn from(err: io::Error) -> Self {
        Self::Io { source: err }
    }
}

impl From<lopdf::Error> for DossierError {
    fn from(err: lopdf::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl From<anyhow::Error> for DossierError {
    fn from(err: anyhow::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl DossierError {
    /// Create an InputFolderMissing error.
    pub fn input_folder_missing(path: PathBuf) -> Self {
        Self::InputFolderMissing { path }
    }

    /// Create a ManifestUnavailable error.
    pub fn manifest_unavailable(reason: impl Into<String>) -> Self {
        Self::ManifestUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a ManifestSourceFailed error.
    pub fn manifest_source_failed(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::ManifestSourceFailed {
            path,
            reason: reason.into(),
        }
    }

    /// Create a FailedToLoadPdf error.
    pub fn failed_to_load_pdf(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::FailedToLoadPdf {
            path,
            reason: reason.into(),
        }
    }

    /// Create a MergeFailed error.
    pub fn merge_failed(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MergeFailed {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Create an OptimizationFailed error.
    pub fn optimization_failed(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::OptimizationFailed {
            path,
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable (the run can continue).
    ///
    /// Recoverable errors are absorbed locally: the affected file, page or
    /// client is skipped and reflected in the run report.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ManifestSourceFailed { .. }
                | Self::FailedToLoadPdf { .. }
                | Self::PageTextExtraction { .. }
                | Self::MergeFailed { .. }
                | Self::OptimizationFailed { .. }
        )
    }

    /// Check if this error is a fatal precondition.
    ///
    /// Fatal errors abort the run immediately with a non-zero exit code.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InputFolderMissing { .. }
                | Self::ManifestUnavailable { .. }
                | Self::InvalidConfig { .. }
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InputFolderMissing { .. } => 2,
            Self::ManifestUnavailable { .. } => 3,
            Self::ManifestSourceFailed { .. } => 3,
            Self::FailedToLoadPdf { .. } => 4,
            Self::PageTextExtraction { .. } => 4,
            Self::MergeFailed { .. } => 6,
            Self::FailedToCreateOutput { .. } => 5,
            Self::FailedToWrite { .. } => 5,
            Self::OptimizationFailed { .. } => 6,
            Self::InvalidConfig { .. } => 1,
            Self::Io { .. } => 5,
            Self::Other { .. } => 1,
        }
    }
}
