//! Reference-code extraction and tolerant resolution.
//!
//! Client reference codes are 3-group, 3-digit identifiers such as
//! `000/527/962`. Source documents write them with `/`, `-` or whitespace
//! separators, sometimes with trailing suffix characters appended by the
//! EDI export. This module scans arbitrary text (page text or filenames)
//! for candidate codes, normalizes the separators to `/`, and resolves
//! candidates against the loaded manifest using an 11-character prefix
//! comparison so suffix variation on either side never blocks a match.

use regex::Regex;

use crate::manifest::Manifest;

/// Length of the normalized `NNN/NNN/NNN` prefix used for comparison.
pub const REFERENCE_PREFIX_LEN: usize = 11;

/// Ordered reference-code patterns, most specific separator first.
const REFERENCE_PATTERNS: &[&str] = &[
    r"\d{3}/\d{3}/\d{3}",
    r"\d{3}-\d{3}-\d{3}",
    r"\d{3}\s+\d{3}\s+\d{3}",
];

/// Scanner for client reference codes.
pub struct ReferenceMatcher {
    patterns: Vec<Regex>,
}

impl ReferenceMatcher {
    /// Create a matcher with the standard pattern list compiled.
    pub fn new() -> Self {
        let patterns = REFERENCE_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("reference pattern is valid"))
            .collect();
        Self { patterns }
    }

    /// Find the first reference-code candidate in `text`, normalized.
    ///
    /// Patterns are tried in order; the first hit of the first matching
    /// pattern wins. Returns `None` if no pattern matches.
    pub fn find_reference(&self, text: &str) -> Option<String> {
        for pattern in &self.patterns {
            if let Some(found) = pattern.find(text) {
                return Some(normalize_reference(found.as_str()));
            }
        }
        None
    }

    /// Check whether `text` contains any reference-code pattern at all.
    pub fn contains_reference(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
    }

    /// Resolve the first candidate in `text` that matches a manifest entry.
    ///
    /// Every candidate produced by the ordered pattern list is normalized
    /// and compared against manifest keys on the first
    /// [`REFERENCE_PREFIX_LEN`] characters; for a given candidate the first
    /// manifest key (insertion order) whose prefix matches wins. Returns
    /// `None` when no candidate resolves - there is no fallback guess.
    pub fn resolve<'m>(&self, text: &str, manifest: &'m Manifest) -> Option<(&'m str, &'m str)> {
        for pattern in &self.patterns {
            for found in pattern.find_iter(text) {
                let candidate = normalize_reference(found.as_str());
                if let Some((reference, name)) = resolve_candidate(&candidate, manifest) {
                    return Some((reference, name));
                }
            }
        }
        None
    }

    /// Scan `text` for any manifest reference appearing verbatim.
    ///
    /// Used as the content-scan fallback for single-client documents:
    /// each manifest reference is searched as an exact substring, in both
    /// its `/`-separated and `-`-separated forms. The first manifest entry
    /// (insertion order) found anywhere in the text wins.
    pub fn scan_verbatim<'m>(&self, text: &str, manifest: &'m Manifest) -> Option<(&'m str, &'m str)> {
        for entry in manifest.iter() {
            let slashed = entry.reference.as_str();
            let dashed = slashed.replace('/', "-");
            if text.contains(slashed) || text.contains(&dashed) {
                return Some((entry.reference.as_str(), entry.full_name.as_str()));
            }
        }
        None
    }
}

impl Default for ReferenceMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a raw reference code: group separators (`-`, whitespace runs)
/// become `/`. Characters outside the separator set are kept as-is, so a
/// trailing suffix survives normalization.
pub fn normalize_reference(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_separator = false;
    for ch in raw.trim().chars() {
        if ch == '/' || ch == '-' || ch.is_whitespace() {
            if !in_separator {
                out.push('/');
            }
            in_separator = true;
        } else {
            out.push(ch);
            in_separator = false;
        }
    }
    out
}

/// Compare a normalized candidate against manifest keys on the 11-character
/// prefix; first key in manifest insertion order wins.
fn resolve_candidate<'m>(candidate: &str, manifest: &'m Manifest) -> Option<(&'m str, &'m str)> {
    let candidate_prefix = prefix(candidate)?;
    for entry in manifest.iter() {
        if let Some(key_prefix) = prefix(&entry.reference)
            && key_prefix == candidate_prefix
        {
            return Some((entry.reference.as_str(), entry.full_name.as_str()));
        }
    }
    None
}

/// First [`REFERENCE_PREFIX_LEN`] characters, or `None` for short strings.
fn prefix(reference: &str) -> Option<&str> {
    reference.get(..REFERENCE_PREFIX_LEN)
}
