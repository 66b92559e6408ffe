//! Page-copy primitives for building merged documents.
//!
//! Copying a page between lopdf documents means copying the page
//! dictionary plus every object it references, without dragging the
//! source's whole page tree along through the `Parent` link. Inheritable
//! page attributes (resources, boxes, rotation) are resolved down onto the
//! page first so the copy is self-contained.

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};

use crate::error::{DossierError, Result};

/// Page-dictionary keys inheritable from the page-tree ancestors.
const INHERITABLE_KEYS: &[&[u8]] = &[b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Create an empty output document: catalog plus a pages tree with no kids.
///
/// Returns the document and the object id of the pages-tree root.
pub fn new_output_document() -> (Document, ObjectId) {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.add_object(Object::Dictionary(dictionary! {
        "Type" => Object::Name(b"Pages".to_vec()),
        "Kids" => Object::Array(Vec::new()),
        "Count" => Object::Integer(0),
    }));

    let catalog_id = doc.add_object(Object::Dictionary(dictionary! {
        "Type" => Object::Name(b"Catalog".to_vec()),
        "Pages" => Object::Reference(pages_id),
    }));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    (doc, pages_id)
}

/// Copy one page from `source` into `output`.
///
/// The source document must already be renumbered past `output.max_id` so
/// copied object ids cannot collide. Returns the page's object id in the
/// output document.
pub fn copy_page(
    output: &mut Document,
    source: &Document,
    page_id: ObjectId,
    pages_root: ObjectId,
) -> Result<ObjectId> {
    let mut page_dict = source
        .get_dictionary(page_id)
        .map_err(|err| DossierError::other(format!("page object missing: {err}")))?
        .clone();

    resolve_inherited_attributes(source, &mut page_dict);
    page_dict.remove(b"Parent");

    for (_, value) in page_dict.iter() {
        copy_references(output, source, value);
    }

    page_dict.set("Parent", Object::Reference(pages_root));
    output.objects.insert(page_id, Object::Dictionary(page_dict));
    if page_id.0 > output.max_id {
        output.max_id = page_id.0;
    }

    Ok(page_id)
}

/// Attach the collected page ids to the pages tree and normalize the
/// document for saving.
pub fn finalize_output(output: &mut Document, pages_root: ObjectId, kids: &[ObjectId]) -> Result<()> {
    let pages_dict = output
        .get_object_mut(pages_root)
        .map_err(|err| DossierError::other(format!("pages tree missing: {err}")))?;

    let Object::Dictionary(dict) = pages_dict else {
        return Err(DossierError::other("pages tree is not a dictionary"));
    };

    dict.set(
        "Kids",
        Object::Array(kids.iter().map(|&id| Object::Reference(id)).collect()),
    );
    dict.set("Count", Object::Integer(kids.len() as i64));

    output.renumber_objects();
    output.compress();
    Ok(())
}

/// Pull inheritable attributes down from the page-tree ancestors onto the
/// page dictionary, so the page survives being detached from its tree.
fn resolve_inherited_attributes(source: &Document, page_dict: &mut Dictionary) {
    let mut parent = page_dict
        .get(b"Parent")
        .ok()
        .and_then(|obj| obj.as_reference().ok());

    while let Some(parent_id) = parent {
        let Ok(parent_dict) = source.get_dictionary(parent_id) else {
            break;
        };
        for &key in INHERITABLE_KEYS {
            if !page_dict.has(key)
                && let Ok(value) = parent_dict.get(key)
            {
                page_dict.set(key, value.clone());
            }
        }
        parent = parent_dict
            .get(b"Parent")
            .ok()
            .and_then(|obj| obj.as_reference().ok());
    }
}

/// Copy object references from one document to another.
///
/// If `obj` is a reference, walks the structure recursively and inserts
/// missing referenced objects into `target`, so every object the copied
/// page needs exists in the final document.
pub fn copy_references(target: &mut Document, source: &Document, obj: &Object) {
    match obj {
        Object::Reference(ref_id) => {
            if !target.objects.contains_key(ref_id)
                && let Ok(referenced_obj) = source.get_object(*ref_id)
            {
                target.objects.insert(*ref_id, referenced_obj.clone());
                if ref_id.0 > target.max_id {
                    target.max_id = ref_id.0;
                }
                copy_references(target, source, referenced_obj);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter() {
                copy_references(target, source, value);
            }
        }
        Object::Array(arr) => {
            for item in arr {
                copy_references(target, source, item);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter() {
                copy_references(target, source, value);
            }
        }
        _ => {}
    }
}
