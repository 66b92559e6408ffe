//! Manifest loading strategies.
//!
//! The manifest can come from three kinds of source, tried in priority
//! order as an explicit strategy list: an EDI workbook, a PDF reference
//! document, or a previously saved two-column mapping file. Each strategy
//! has a clear success/failure signal; the first one that yields a
//! non-empty mapping wins, and failures fall through to the next source.
//!
//! The EDI path trusts its source unconditionally (no name filtering).
//! The reference-document path recovers names from free text and therefore
//! validates them against a person-name heuristic. The two paths are kept
//! as distinct named strategies on purpose.

use std::fs;
use std::io::Write;
use std::path::Path;

use calamine::{DataType, Reader};

use crate::config::ManifestSource;
use crate::error::{DossierError, Result};
use crate::manifest::Manifest;
use crate::matcher::{ReferenceMatcher, normalize_reference};
use crate::report::{RunReport, RunWarning};

/// Header written to (and expected in) the persisted mapping file.
const MAPPING_HEADER: &str = "ConsigneeRef,FullName";

/// Cell values treated as "no data" when reading tabular sources.
const EMPTY_MARKERS: &[&str] = &["", "empty", "n/a", "-"];

/// Words that disqualify a free-text name candidate. Company boilerplate,
/// not person names.
const EXCLUDED_NAME_WORDS: &[&str] = &[
    "LIMITED",
    "LTD",
    "PLC",
    "SHIPPING",
    "WORLDWIDE",
    "FREIGHT",
    "LOGISTICS",
    "SERVICES",
    "CONTAINER",
    "INTERNATIONAL",
    "COMPANY",
    "CARGO",
];

/// Failure of a single manifest source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The workbook could not be opened or read.
    #[error("failed to read workbook: {0}")]
    Workbook(String),

    /// No header row with a reference column and a name column was found.
    #[error("required columns not found (need a reference and a name column)")]
    ColumnsMissing,

    /// The source was readable but produced no usable rows.
    #[error("source produced no usable mapping rows")]
    Empty,

    /// The mapping file could not be read.
    #[error("failed to read mapping file: {0}")]
    Io(#[from] std::io::Error),

    /// The reference document could not be loaded or extracted.
    #[error("failed to read reference document: {0}")]
    Pdf(String),
}

/// Loads the manifest from an ordered list of sources.
pub struct ManifestLoader {
    matcher: ReferenceMatcher,
}

impl ManifestLoader {
    /// Create a loader.
    pub fn new() -> Self {
        Self {
            matcher: ReferenceMatcher::new(),
        }
    }

    /// Try each source in order until one yields a non-empty manifest.
    ///
    /// When the winning source is an EDI workbook or a reference document,
    /// the derived mapping is persisted to `mapping_export` so later runs
    /// can use it as a fallback; a persistence failure is a warning, not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`DossierError::ManifestUnavailable`] if every source fails
    /// or yields an empty mapping - a fatal precondition for the run.
    pub fn load(
        &self,
        sources: &[ManifestSource],
        mapping_export: &Path,
        report: &mut RunReport,
    ) -> Result<Manifest> {
        let mut failures = Vec::new();

        for source in sources {
            let loaded = match source {
                ManifestSource::EdiWorkbook(path) => self.load_edi_workbook(path),
                ManifestSource::ReferenceDocument(path) => self.load_reference_document(path),
                ManifestSource::MappingFile(path) => self.load_mapping_file(path),
            };

            match loaded {
                Ok(manifest) if !manifest.is_empty() => {
                    if !matches!(source, ManifestSource::MappingFile(_))
                        && let Err(err) = save_mapping_file(&manifest, mapping_export)
                    {
                        report.warn(RunWarning::MappingExportFailed {
                            path: mapping_export.to_path_buf(),
                            reason: err.to_string(),
                        });
                    }
                    return Ok(manifest);
                }
                Ok(_) => {
                    let reason = SourceError::Empty.to_string();
                    report.warn(RunWarning::ManifestSourceSkipped {
                        path: source.path().to_path_buf(),
                        reason: reason.clone(),
                    });
                    failures.push(format!("{}: {reason}", source.describe()));
                }
                Err(err) => {
                    report.warn(RunWarning::ManifestSourceSkipped {
                        path: source.path().to_path_buf(),
                        reason: err.to_string(),
                    });
                    failures.push(format!("{}: {err}", source.describe()));
                }
            }
        }

        Err(DossierError::manifest_unavailable(if failures.is_empty() {
            "no manifest source configured".to_string()
        } else {
            failures.join("; ")
        }))
    }

    /// Load the manifest from an EDI workbook (`.xls`/`.xlsx`).
    ///
    /// The first worksheet is scanned for a header row naming a reference
    /// column (`Consignees Reference` or `Reference`) and a name column
    /// (`Consignees Name` or `Name`); rows missing either field or holding
    /// sentinel empty markers are skipped silently. The source is treated
    /// as authoritative: no name-validity filtering is applied.
    fn load_edi_workbook(&self, path: &Path) -> std::result::Result<Manifest, SourceError> {
        let mut workbook = calamine::open_workbook_auto(path)
            .map_err(|err| SourceError::Workbook(err.to_string()))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| SourceError::Workbook("workbook has no sheets".to_string()))?;

        let range = match workbook.worksheet_range(&sheet_name) {
            Some(Ok(range)) => range,
            Some(Err(err)) => return Err(SourceError::Workbook(err.to_string())),
            None => return Err(SourceError::Workbook("worksheet missing".to_string())),
        };

        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect::<Vec<Vec<String>>>();

        manifest_from_rows(&rows)
    }

    /// Load the manifest from a previously saved two-column mapping file.
    fn load_mapping_file(&self, path: &Path) -> std::result::Result<Manifest, SourceError> {
        let content = fs::read_to_string(path)?;
        let mut manifest = Manifest::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.eq_ignore_ascii_case(MAPPING_HEADER) {
                continue;
            }
            if let Some((reference, full_name)) = parse_mapping_line(line)
                && !is_empty_marker(&reference)
                && !is_empty_marker(&full_name)
            {
                manifest.insert(normalize_reference(&reference), full_name);
            }
        }

        if manifest.is_empty() {
            return Err(SourceError::Empty);
        }
        Ok(manifest)
    }

    /// Recover a manifest from a PDF reference document.
    ///
    /// Free-text extraction is unreliable, so unlike the EDI path each
    /// recovered name must pass [`is_likely_person_name`].
    fn load_reference_document(&self, path: &Path) -> std::result::Result<Manifest, SourceError> {
        let document =
            lopdf::Document::load(path).map_err(|err| SourceError::Pdf(err.to_string()))?;

        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
        let text = document
            .extract_text(&page_numbers)
            .map_err(|err| SourceError::Pdf(err.to_string()))?;

        let mut manifest = Manifest::new();
        for line in text.lines() {
            let Some(candidate) = self.matcher.find_reference(line) else {
                continue;
            };
            let Some(name) = name_candidate_after_reference(line) else {
                continue;
            };
            if is_likely_person_name(&name) {
                manifest.insert(candidate, name);
            }
        }

        if manifest.is_empty() {
            return Err(SourceError::Empty);
        }
        Ok(manifest)
    }
}

impl Default for ManifestLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Persist the manifest as the reusable two-column mapping file.
pub fn save_mapping_file(manifest: &Manifest, path: &Path) -> Result<()> {
    let mut out = String::new();
    out.push_str(MAPPING_HEADER);
    out.push('\n');
    for entry in manifest.iter() {
        out.push_str(&entry.reference);
        out.push(',');
        out.push_str(&quote_csv_field(&entry.full_name));
        out.push('\n');
    }

    let mut file = fs::File::create(path).map_err(|source| DossierError::FailedToCreateOutput {
        path: path.to_path_buf(),
        source,
    })?;
    file.write_all(out.as_bytes())
        .map_err(|source| DossierError::FailedToWrite {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(())
}

/// Build a manifest from in-memory tabular rows.
///
/// Split out from the workbook reader so header location and row filtering
/// are testable without an actual `.xls` fixture.
fn manifest_from_rows(rows: &[Vec<String>]) -> std::result::Result<Manifest, SourceError> {
    let Some((header_index, reference_col, name_col)) = locate_columns(rows) else {
        return Err(SourceError::ColumnsMissing);
    };

    let mut manifest = Manifest::new();
    for row in rows.iter().skip(header_index + 1) {
        let reference = row.get(reference_col).map(|s| s.trim()).unwrap_or("");
        let full_name = row.get(name_col).map(|s| s.trim()).unwrap_or("");
        if is_empty_marker(reference) || is_empty_marker(full_name) {
            continue;
        }
        manifest.insert(normalize_reference(reference), full_name.to_string());
    }

    if manifest.is_empty() {
        return Err(SourceError::Empty);
    }
    Ok(manifest)
}

/// Find the header row and the reference/name column positions.
fn locate_columns(rows: &[Vec<String>]) -> Option<(usize, usize, usize)> {
    for (row_index, row) in rows.iter().enumerate() {
        let mut reference_col = None;
        let mut name_col = None;
        for (col, cell) in row.iter().enumerate() {
            let cell = cell.trim().to_lowercase();
            if reference_col.is_none() && cell.contains("reference") {
                reference_col = Some(col);
            } else if name_col.is_none() && cell.contains("name") {
                name_col = Some(col);
            }
        }
        if let (Some(reference), Some(name)) = (reference_col, name_col) {
            return Some((row_index, reference, name));
        }
    }
    None
}

/// Render a calamine cell as trimmed text.
fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.trim().to_string(),
        DataType::Float(v) => format!("{v}"),
        DataType::Int(v) => format!("{v}"),
        DataType::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        DataType::DateTime(v) => format!("{v}"),
        DataType::DateTimeIso(s) => s.clone(),
        DataType::Duration(v) => format!("{v}"),
        DataType::DurationIso(s) => s.clone(),
        DataType::Error(e) => format!("#{e:?}"),
        DataType::Empty => String::new(),
    }
}

/// Whether a cell value counts as "no data".
fn is_empty_marker(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    EMPTY_MARKERS.contains(&value.as_str())
}

/// Split a mapping-file line into (reference, name), honoring a quoted
/// name field.
fn parse_mapping_line(line: &str) -> Option<(String, String)> {
    let (reference, rest) = line.split_once(',')?;
    let name = rest.trim();
    let name = if name.len() >= 2 && name.starts_with('"') && name.ends_with('"') {
        name[1..name.len() - 1].replace("\"\"", "\"")
    } else {
        name.to_string()
    };
    Some((reference.trim().to_string(), name))
}

/// Quote a CSV field when it needs it.
fn quote_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// The text following the reference code on the same line, as a name
/// candidate: leading separators stripped, at most four words.
fn name_candidate_after_reference(line: &str) -> Option<String> {
    // The code itself is digits and separators; the name starts after the
    // last digit run.
    let after = line.rfind(|c: char| c.is_ascii_digit()).map(|i| &line[i + 1..])?;
    let after = after.trim_start_matches(|c: char| {
        c.is_whitespace() || c == ':' || c == '-' || c == ','
    });
    let words: Vec<&str> = after.split_whitespace().take(4).collect();
    if words.is_empty() {
        return None;
    }
    Some(
        words
            .join(" ")
            .trim_end_matches(['.', ',', ';'])
            .to_string(),
    )
}

/// Heuristic for person names recovered from free text: two to four
/// capitalized words, letters only (apostrophes and hyphens allowed), none
/// of them on the exclusion list.
fn is_likely_person_name(name: &str) -> bool {
    let words: Vec<&str> = name.split_whitespace().collect();
    if !(2..=4).contains(&words.len()) {
        return false;
    }
    words.iter().all(|word| {
        let mut chars = word.chars();
        let leading_upper = chars.next().is_some_and(|c| c.is_uppercase());
        let body_ok = chars.all(|c| c.is_alphabetic() || c == '\'' || c == '-');
        let excluded = EXCLUDED_NAME_WORDS
            .iter()
            .any(|excl| word.eq_ignore_ascii_case(excl));
        leading_upper && body_ok && !excluded
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_manifest_from_rows_edi_headers() {
        let rows = rows(&[
            &["Consignees Reference", "Consignees Name"],
            &["000/527/962", "Jane Doe"],
            &["111-222-333", "John Smith"],
        ]);

        let manifest = manifest_from_rows(&rows).unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.get("000/527/962"), Some("Jane Doe"));
        // Dashed references are normalized on ingestion.
        assert_eq!(manifest.get("111/222/333"), Some("John Smith"));
    }

    #[test]
    fn test_manifest_from_rows_short_headers() {
        let rows = rows(&[
            &["Reference", "Name"],
            &["000/527/962", "Jane Doe"],
        ]);

        let manifest = manifest_from_rows(&rows).unwrap();
        assert_eq!(manifest.get("000/527/962"), Some("Jane Doe"));
    }

    #[test]
    fn test_manifest_from_rows_skips_sentinels() {
        let rows = rows(&[
            &["Reference", "Name"],
            &["000/527/962", "Jane Doe"],
            &["", "Nobody Home"],
            &["222/333/444", "empty"],
            &["333/444/555", "n/a"],
        ]);

        let manifest = manifest_from_rows(&rows).unwrap();
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn test_manifest_from_rows_no_name_filtering() {
        // The EDI source is authoritative: company-looking names pass.
        let rows = rows(&[
            &["Reference", "Name"],
            &["000/527/962", "ACME SHIPPING LTD"],
        ]);

        let manifest = manifest_from_rows(&rows).unwrap();
        assert_eq!(manifest.get("000/527/962"), Some("ACME SHIPPING LTD"));
    }

    #[test]
    fn test_manifest_from_rows_missing_columns() {
        let rows = rows(&[&["Container", "Vessel"], &["A", "B"]]);
        assert!(matches!(
            manifest_from_rows(&rows),
            Err(SourceError::ColumnsMissing)
        ));
    }

    #[test]
    fn test_manifest_from_rows_last_write_wins() {
        let rows = rows(&[
            &["Reference", "Name"],
            &["000/527/962", "Jane Doe"],
            &["000/527/962", "Jane A Doe"],
        ]);

        let manifest = manifest_from_rows(&rows).unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.get("000/527/962"), Some("Jane A Doe"));
    }

    #[test]
    fn test_mapping_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("client_manifest.csv");

        let mut manifest = Manifest::new();
        manifest.insert("000/527/962".to_string(), "Jane Doe".to_string());
        manifest.insert("111/222/333".to_string(), "Smith, John".to_string());

        save_mapping_file(&manifest, &path).unwrap();

        let loader = ManifestLoader::new();
        let loaded = loader.load_mapping_file(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("000/527/962"), Some("Jane Doe"));
        assert_eq!(loaded.get("111/222/333"), Some("Smith, John"));
    }

    #[test]
    fn test_load_mapping_file_missing() {
        let loader = ManifestLoader::new();
        let result = loader.load_mapping_file(Path::new("/nonexistent/mapping.csv"));
        assert!(matches!(result, Err(SourceError::Io(_))));
    }

    #[test]
    fn test_strategy_fallthrough_to_mapping_file() {
        let dir = tempdir().unwrap();
        let mapping = dir.path().join("client_manifest.csv");
        fs::write(&mapping, "ConsigneeRef,FullName\n000/527/962,Jane Doe\n").unwrap();

        let sources = vec![
            ManifestSource::EdiWorkbook(dir.path().join("missing.xls")),
            ManifestSource::MappingFile(mapping),
        ];

        let loader = ManifestLoader::new();
        let mut report = RunReport::new();
        let manifest = loader
            .load(&sources, &dir.path().join("export.csv"), &mut report)
            .unwrap();

        assert_eq!(manifest.get("000/527/962"), Some("Jane Doe"));
        // The failed EDI source is surfaced as a warning, not an error.
        assert_eq!(report.warnings().len(), 1);
    }

    #[test]
    fn test_all_sources_failing_is_fatal() {
        let dir = tempdir().unwrap();
        let sources = vec![ManifestSource::MappingFile(dir.path().join("missing.csv"))];

        let loader = ManifestLoader::new();
        let mut report = RunReport::new();
        let result = loader.load(&sources, &dir.path().join("export.csv"), &mut report);

        assert!(matches!(
            result,
            Err(DossierError::ManifestUnavailable { .. })
        ));
    }

    #[test]
    fn test_is_likely_person_name() {
        assert!(is_likely_person_name("Jane Doe"));
        assert!(is_likely_person_name("Mary-Jane O'Brien"));
        assert!(!is_likely_person_name("Jane"));
        assert!(!is_likely_person_name("jane doe"));
        assert!(!is_likely_person_name("ACME SHIPPING"));
        assert!(!is_likely_person_name("One Two Three Four Five"));
    }

    #[test]
    fn test_name_candidate_after_reference() {
        assert_eq!(
            name_candidate_after_reference("000/527/962: Jane Doe").as_deref(),
            Some("Jane Doe")
        );
        assert_eq!(
            name_candidate_after_reference("Ref 000-527-962 - John Smith, London").as_deref(),
            Some("John Smith, London")
        );
        assert_eq!(name_candidate_after_reference("000/527/962"), None);
    }
}
