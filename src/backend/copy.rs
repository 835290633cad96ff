//! Deep page copy into a fresh, unprotected document.

use std::collections::HashMap;

use lopdf::{dictionary, Dictionary, Document as LopdfDocument, Object, ObjectId};

use super::lopdf_backend::inherited;
use crate::error::{Error, Result};

/// Page attributes that may live on an ancestor `/Pages` node.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Back-references that would drag the source page tree along.
const SKIPPED_KEYS: [&[u8]; 2] = [b"Parent", b"P"];

/// Copy every page of `source`, with its resources and the document info
/// dictionary, into a new document. The source's encryption dictionary,
/// outlines and other catalog-level structures are left behind.
pub(crate) fn copy_pages(source: &LopdfDocument) -> Result<LopdfDocument> {
    let mut target = LopdfDocument::with_version(source.version.clone());
    let pages_id = target.new_object_id();
    let mut copier = Copier {
        source,
        ids: HashMap::new(),
    };

    let mut kids = Vec::new();
    for (number, page_id) in source.get_pages() {
        let page = source
            .get_dictionary(page_id)
            .map_err(|e| Error::Redaction(format!("page {}: {}", number, e)))?;

        let mut dict = copier.copy_dict(&mut target, page);
        for key in INHERITABLE {
            if dict.has(key) {
                continue;
            }
            if let Some(value) = inherited(source, page, key) {
                let value = copier.copy(&mut target, value);
                dict.set(key, value);
            }
        }
        dict.set("Parent", pages_id);
        kids.push(Object::Reference(target.add_object(dict)));
    }

    let count = kids.len() as i64;
    target.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = target.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    target.trailer.set("Root", catalog_id);

    if let Ok(info) = source.trailer.get(b"Info") {
        let info = copier.copy(&mut target, info);
        target.trailer.set("Info", info);
    }

    log::debug!(
        "Copied {} pages into {} objects",
        count,
        target.objects.len()
    );
    Ok(target)
}

struct Copier<'a> {
    source: &'a LopdfDocument,
    ids: HashMap<ObjectId, ObjectId>,
}

impl Copier<'_> {
    fn copy(&mut self, target: &mut LopdfDocument, obj: &Object) -> Object {
        match obj {
            Object::Reference(id) => {
                if let Some(new_id) = self.ids.get(id) {
                    return Object::Reference(*new_id);
                }
                let Ok(resolved) = self.source.get_object(*id) else {
                    return Object::Null;
                };
                // Reserve first so cycles resolve to the same id
                let new_id = target.new_object_id();
                self.ids.insert(*id, new_id);
                let copied = self.copy(target, resolved);
                target.objects.insert(new_id, copied);
                Object::Reference(new_id)
            }
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dict(target, dict)),
            Object::Array(items) => {
                Object::Array(items.iter().map(|o| self.copy(target, o)).collect())
            }
            Object::Stream(stream) => {
                let mut copied = stream.clone();
                copied.dict = self.copy_dict(target, &stream.dict);
                Object::Stream(copied)
            }
            other => other.clone(),
        }
    }

    fn copy_dict(&mut self, target: &mut LopdfDocument, dict: &Dictionary) -> Dictionary {
        let mut out = Dictionary::new();
        for (key, value) in dict.iter() {
            if SKIPPED_KEYS.contains(&key.as_slice()) {
                continue;
            }
            let value = self.copy(target, value);
            out.set(key.clone(), value);
        }
        out
    }
}
