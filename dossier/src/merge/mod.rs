//! Per-client dossier merging.
//!
//! For every manifest client with at least one attributed page, the merge
//! engine concatenates that client's pages in the fixed type order
//! Arrival Notice -> Bill of Lading -> Customer Document (scan order within
//! each group) into a new output document.

pub mod merger;
pub mod pages;

pub use merger::{MergeEngine, MergeOutcome, PageCounts};
