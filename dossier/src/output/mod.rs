//! Console output for the CLI layer.
//!
//! The engine itself never prints; warnings accumulate in the run report
//! and the CLI renders them through the formatter.

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter};
