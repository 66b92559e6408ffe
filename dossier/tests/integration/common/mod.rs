//! Integration-test fixtures.
//!
//! PDFs are generated with lopdf and carry real text content streams, so
//! the engine's page-level text extraction works on them.

use lopdf::{Document, Object, Stream, dictionary};
use std::path::{Path, PathBuf};

use dossier::config::{ManifestSource, RunConfig};

/// Build a PDF at `path` with one page per entry in `page_texts`.
pub fn create_pdf(path: &Path, page_texts: &[&str]) {
    let mut doc = Document::with_version("1.5");

    let font_id = doc.add_object(Object::Dictionary(dictionary! {
        "Type" => Object::Name(b"Font".to_vec()),
        "Subtype" => Object::Name(b"Type1".to_vec()),
        "BaseFont" => Object::Name(b"Helvetica".to_vec()),
    }));

    let resources_id = doc.add_object(Object::Dictionary(dictionary! {
        "Font" => Object::Dictionary(dictionary! {
            "F1" => Object::Reference(font_id),
        }),
        "ProcSet" => Object::Array(vec![
            Object::Name(b"PDF".to_vec()),
            Object::Name(b"Text".to_vec()),
        ]),
    }));

    let mut kids = Vec::new();
    for text in page_texts {
        let escaped = text.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)");
        let content = format!("BT /F1 12 Tf 72 720 Td ({escaped}) Tj ET");
        let content_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! {},
            content.into_bytes(),
        )));

        let page_id = doc.add_object(Object::Dictionary(dictionary! {
            "Type" => Object::Name(b"Page".to_vec()),
            "MediaBox" => Object::Array(vec![0.into(), 0.into(), 595.0.into(), 842.0.into()]),
            "Resources" => Object::Reference(resources_id),
            "Contents" => Object::Reference(content_id),
        }));
        kids.push(Object::Reference(page_id));
    }

    let pages_id = doc.add_object(Object::Dictionary(dictionary! {
        "Type" => Object::Name(b"Pages".to_vec()),
        "Kids" => Object::Array(kids),
        "Count" => Object::Integer(page_texts.len() as i64),
    }));

    let catalog_id = doc.add_object(Object::Dictionary(dictionary! {
        "Type" => Object::Name(b"Catalog".to_vec()),
        "Pages" => Object::Reference(pages_id),
    }));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    for (_, page_id) in doc.get_pages() {
        if let Some(Object::Dictionary(page_dict)) = doc.objects.get_mut(&page_id) {
            page_dict.set("Parent", Object::Reference(pages_id));
        }
    }

    doc.save(path).expect("fixture PDF saves");
}

/// Write a two-column mapping file usable as a manifest source.
pub fn write_mapping_file(path: &Path, entries: &[(&str, &str)]) {
    let mut content = String::from("ConsigneeRef,FullName\n");
    for (reference, name) in entries {
        content.push_str(&format!("{reference},{name}\n"));
    }
    std::fs::write(path, content).expect("mapping file writes");
}

/// A run configuration over temp folders, quiet, manifest from a mapping
/// file written from `entries`.
pub fn test_config(root: &Path, entries: &[(&str, &str)]) -> RunConfig {
    let input = root.join("in");
    let output = root.join("out");
    std::fs::create_dir_all(&input).expect("input folder");

    let mapping = root.join("manifest.csv");
    write_mapping_file(&mapping, entries);

    let mut config = RunConfig::new(input, output);
    config.manifest_sources = vec![ManifestSource::MappingFile(mapping)];
    config.mapping_export = root.join("client_manifest.csv");
    config.quiet = true;
    config
}

/// Path of a file inside the configured input folder.
pub fn input_path(config: &RunConfig, name: &str) -> PathBuf {
    config.input_folder.join(name)
}

/// Extract one page's text from a written PDF.
pub fn page_text(path: &Path, page_number: u32) -> String {
    let doc = Document::load(path).expect("output PDF loads");
    doc.extract_text(&[page_number]).expect("page text extracts")
}

/// Page count of a written PDF.
pub fn page_count(path: &Path) -> usize {
    Document::load(path).expect("output PDF loads").get_pages().len()
}
