//! Filename-based document classification.
//!
//! Every input file is bucketed into one of three document types by its
//! name alone - no content inspection - so classification is O(1) per file
//! and independent of page count. Rules are evaluated in order, first
//! match wins, with CustomerDocument as the deterministic fallback bucket.

use std::fmt;

use serde::Serialize;

use crate::matcher::ReferenceMatcher;

/// Marker phrase an arrival notice filename begins with.
const ARRIVAL_MARKER: &str = "advice of arrival";

/// Suffix marking a bill-of-lading file.
const BILL_SUFFIX: &str = "_hbl.pdf";

/// Suffix marking a generic customer document.
const DOCUMENT_SUFFIX: &str = "_document.pdf";

/// The three document-type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DocumentKind {
    /// A multi-client arrival notice; pages may belong to different clients.
    ArrivalNotice,
    /// A multi-client bill of lading.
    BillOfLading,
    /// A single-client customer document; all pages belong to one client.
    CustomerDocument,
}

impl DocumentKind {
    /// Position of this kind in the fixed merge order.
    pub fn merge_rank(&self) -> u8 {
        match self {
            Self::ArrivalNotice => 0,
            Self::BillOfLading => 1,
            Self::CustomerDocument => 2,
        }
    }

    /// Whether pages of this kind may belong to different clients.
    pub fn is_multi_client(&self) -> bool {
        matches!(self, Self::ArrivalNotice | Self::BillOfLading)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArrivalNotice => write!(f, "Arrival Notice"),
            Self::BillOfLading => write!(f, "Bill of Lading"),
            Self::CustomerDocument => write!(f, "Customer Document"),
        }
    }
}

/// Outcome of classifying one filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// The assigned document type.
    pub kind: DocumentKind,
    /// True when no rule matched and the default bucket was used.
    pub defaulted: bool,
}

/// Classify a filename into a document type.
///
/// Rules, in order, first match wins:
/// 1. begins with the arrival marker phrase -> ArrivalNotice
/// 2. ends with the bill-of-lading suffix -> BillOfLading
/// 3. ends with the generic-document suffix -> CustomerDocument
/// 4. contains an embedded reference-code pattern -> CustomerDocument
/// 5. otherwise -> CustomerDocument, flagged as defaulted
pub fn classify_filename(file_name: &str, matcher: &ReferenceMatcher) -> Classification {
    let lower = file_name.to_lowercase();

    if lower.starts_with(ARRIVAL_MARKER) {
        return Classification {
            kind: DocumentKind::ArrivalNotice,
            defaulted: false,
        };
    }
    if lower.ends_with(BILL_SUFFIX) {
        return Classification {
            kind: DocumentKind::BillOfLading,
            defaulted: false,
        };
    }
    if lower.ends_with(DOCUMENT_SUFFIX) {
        return Classification {
            kind: DocumentKind::CustomerDocument,
            defaulted: false,
        };
    }
    if matcher.contains_reference(file_name) {
        return Classification {
            kind: DocumentKind::CustomerDocument,
            defaulted: false,
        };
    }

    Classification {
        kind: DocumentKind::CustomerDocument,
        defaulted: true,
    }
}
