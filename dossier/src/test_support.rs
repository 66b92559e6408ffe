//! Shared helpers for unit tests: minimal PDF fixtures built with lopdf.
//!
//! Generated documents have a valid Catalog/Pages tree and real text
//! content streams, so page-level text extraction works on them.

use lopdf::{Document, Object, Stream, dictionary};
use std::path::Path;

use crate::error::Result;

/// Build an in-memory document with one page per entry in `page_texts`.
pub fn build_test_document(page_texts: &[&str]) -> Document {
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

    let mut pages_kids = Vec::new();
    for text in page_texts {
        let content = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", escape_pdf_text(text));
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
        pages_kids.push(Object::Reference(page_id));
    }

    let pages_id = doc.add_object(Object::Dictionary(dictionary! {
        "Type" => Object::Name(b"Pages".to_vec()),
        "Kids" => Object::Array(pages_kids),
        "Count" => Object::Integer(page_texts.len() as i64),
    }));

    let catalog_id = doc.add_object(Object::Dictionary(dictionary! {
        "Type" => Object::Name(b"Catalog".to_vec()),
        "Pages" => Object::Reference(pages_id),
    }));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    // Link pages back to the tree root.
    for (_, page_id) in doc.get_pages() {
        if let Some(Object::Dictionary(page_dict)) = doc.objects.get_mut(&page_id) {
            page_dict.set("Parent", Object::Reference(pages_id));
        }
    }

    doc
}

/// Write a test PDF with the given page texts to `path`.
pub fn create_test_pdf(path: &Path, page_texts: &[&str]) -> Result<()> {
    let mut doc = build_test_document(page_texts);
    doc.save(path)
        .map_err(|err| crate::error::DossierError::other(err.to_string()))?;
    Ok(())
}

/// Escape characters that delimit PDF literal strings.
fn escape_pdf_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}
