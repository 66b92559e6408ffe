//! Source-document I/O.
//!
//! Attribution and merging are separate stages that share the same open
//! source documents - one arrival notice feeds many client bundles - so
//! documents live in an arena keyed by source path, acquired during
//! attribution and released only after every bundle has been merged.

pub mod arena;
pub mod writer;

pub use arena::{DocumentArena, SourceDocument};
pub use writer::PdfWriter;
