//! [`PdfBackend`] backed by `lopdf`.

use std::io::Write;
use std::sync::Arc;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::xref::XrefType;
use lopdf::{dictionary, Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use super::copy::copy_pages;
use super::metrics::StandardMetrics;
use super::rewrite::{open_states, overlay_content, strip_literals, SAVE_STATE};
use super::text::{resolve, TextWalker};
use super::{LoadMode, PdfBackend, PdfDocument, SaveStrategy};
use crate::detect::has_encrypt_marker;
use crate::error::{Error, Result};
use crate::model::{parse_pdf_date, DocumentInfo, Protection, Rect, Rgb, TextRun};

/// Letter size, used when a page carries no usable box.
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Stream-only keys a trailer inherits when read from a cross-reference stream.
const XREF_STREAM_KEYS: [&[u8]; 6] = [b"Type", b"Filter", b"DecodeParms", b"Length", b"W", b"Index"];

/// Limit on `/Parent` hops when resolving inherited page attributes.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Concrete [`PdfBackend`] producing [`LopdfPdf`] documents.
#[derive(Debug, Clone)]
pub struct LopdfBackend {
    metrics: Arc<StandardMetrics>,
}

impl LopdfBackend {
    /// Create a backend with freshly built font metrics.
    pub fn new() -> Self {
        Self::with_metrics(Arc::new(StandardMetrics::new()))
    }

    /// Create a backend sharing existing metrics.
    pub fn with_metrics(metrics: Arc<StandardMetrics>) -> Self {
        Self { metrics }
    }
}

impl Default for LopdfBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfBackend for LopdfBackend {
    fn open(&self, data: &[u8], mode: LoadMode) -> Result<Box<dyn PdfDocument>> {
        let pdf = LopdfPdf::load(data, mode, Arc::clone(&self.metrics))?;
        Ok(Box::new(pdf))
    }
}

/// A document loaded with `lopdf`.
pub struct LopdfPdf {
    doc: LopdfDocument,
    metrics: Arc<StandardMetrics>,
    protection: Protection,
}

impl LopdfPdf {
    /// Parse `data` according to `mode`.
    pub fn load(data: &[u8], mode: LoadMode, metrics: Arc<StandardMetrics>) -> Result<Self> {
        let marked = has_encrypt_marker(data);

        let mut doc = match LopdfDocument::load_mem(data) {
            Ok(doc) => doc,
            Err(e) => {
                let protected = matches!(e, lopdf::Error::Decryption(_)) || marked;
                if !protected {
                    return Err(e.into());
                }
                log::debug!("Load failed on protected document: {}", e);
                return Err(match mode {
                    LoadMode::Strict => Error::Encrypted,
                    LoadMode::Tolerant => Error::PasswordProtected,
                });
            }
        };

        let protection = if doc.is_encrypted() {
            match mode {
                LoadMode::Strict => return Err(Error::Encrypted),
                LoadMode::Tolerant => match doc.decrypt("") {
                    Ok(()) => Protection::Recoverable,
                    Err(e) => {
                        log::debug!("Empty-password decryption failed: {}", e);
                        Protection::Locked
                    }
                },
            }
        } else if doc.encryption_state.is_some() {
            // Already decrypted by the loader with the empty password
            match mode {
                LoadMode::Strict => return Err(Error::Encrypted),
                LoadMode::Tolerant => Protection::Recoverable,
            }
        } else {
            Protection::None
        };

        Ok(Self {
            doc,
            metrics,
            protection,
        })
    }

    /// Wrap an in-memory document.
    pub fn from_document(doc: LopdfDocument, metrics: Arc<StandardMetrics>) -> Self {
        Self {
            doc,
            metrics,
            protection: Protection::None,
        }
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        let pages = self.doc.get_pages();
        pages
            .get(&page)
            .copied()
            .ok_or(Error::PageOutOfRange(page, pages.len() as u32))
    }

    /// Concatenated, decoded content of a page and the number of array
    /// entries that could not be decoded. Pages without `/Contents` yield an
    /// empty stream.
    fn page_content(&self, page_id: ObjectId) -> Result<(Vec<u8>, usize)> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => resolve(&self.doc, contents),
            Err(_) => return Ok((Vec::new(), 0)),
        };

        match contents {
            Object::Stream(s) => Ok((stream_bytes(s)?, 0)),
            Object::Array(arr) => {
                let mut content = Vec::new();
                let mut skipped = 0;
                for obj in arr {
                    if let Object::Stream(s) = resolve(&self.doc, obj) {
                        match stream_bytes(s) {
                            Ok(data) => {
                                content.extend_from_slice(&data);
                                content.push(b' ');
                            }
                            Err(e) => {
                                log::warn!("Skipping unreadable content stream: {}", e);
                                skipped += 1;
                            }
                        }
                    }
                }
                Ok((content, skipped))
            }
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    /// Current `/Contents` entries as a list of references.
    fn content_refs(&self, page_id: ObjectId) -> Result<Vec<Object>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let refs = match page_dict.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(arr)) => arr.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(arr)) => arr.clone(),
            Ok(Object::Stream(s)) => vec![Object::Stream(s.clone())],
            _ => Vec::new(),
        };
        Ok(refs)
    }

    fn set_contents(&mut self, page_id: ObjectId, contents: Object) -> Result<()> {
        let page = self
            .doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| Error::Redaction(e.to_string()))?;
        page.set("Contents", contents);
        Ok(())
    }

    /// Add a Flate-compressed content stream.
    fn add_stream(&mut self, content: &[u8]) -> Result<ObjectId> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content)?;
        let compressed = encoder.finish()?;

        let stream = Stream::new(dictionary! { "Filter" => "FlateDecode" }, compressed)
            .with_compression(false);
        Ok(self.doc.add_object(stream))
    }

    fn page_box(&self, page_id: ObjectId, key: &[u8]) -> Option<(f32, f32)> {
        let page = self.doc.get_dictionary(page_id).ok()?;
        let array = resolve(&self.doc, inherited(&self.doc, page, key)?)
            .as_array()
            .ok()?;
        if array.len() < 4 {
            return None;
        }
        let n: Vec<f32> = array
            .iter()
            .map(|o| resolve(&self.doc, o).as_float().unwrap_or(0.0))
            .collect();
        Some(((n[2] - n[0]).abs(), (n[3] - n[1]).abs()))
    }
}

impl PdfDocument for LopdfPdf {
    fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    fn protection(&self) -> Protection {
        self.protection
    }

    fn info(&self) -> DocumentInfo {
        let mut info = DocumentInfo {
            pdf_version: self.doc.version.to_string(),
            page_count: self.page_count(),
            protection: self.protection,
            ..Default::default()
        };

        let dict = self
            .doc
            .trailer
            .get(b"Info")
            .ok()
            .map(|o| resolve(&self.doc, o))
            .and_then(|o| o.as_dict().ok());
        if let Some(dict) = dict {
            info.title = get_string_from_dict(dict, b"Title");
            info.author = get_string_from_dict(dict, b"Author");
            info.creator = get_string_from_dict(dict, b"Creator");
            info.producer = get_string_from_dict(dict, b"Producer");
            info.created =
                get_string_from_dict(dict, b"CreationDate").and_then(|s| parse_pdf_date(&s));
            info.modified = get_string_from_dict(dict, b"ModDate").and_then(|s| parse_pdf_date(&s));
        }

        info
    }

    fn page_size(&self, page: u32) -> Result<(f32, f32)> {
        let page_id = self.page_id(page)?;
        Ok(self
            .page_box(page_id, b"CropBox")
            .or_else(|| self.page_box(page_id, b"MediaBox"))
            .unwrap_or(DEFAULT_PAGE_SIZE))
    }

    fn text_runs(&self, page: u32) -> Result<Vec<TextRun>> {
        let page_id = self.page_id(page)?;
        let fonts = self
            .doc
            .get_page_fonts(page_id)
            .map_err(|e| Error::TextExtract(e.to_string()))?;
        let (content, _) = self.page_content(page_id)?;
        TextWalker::new(&self.doc, &fonts, &self.metrics).walk(&content)
    }

    fn strip_text(&mut self, page: u32, literals: &[&str]) -> Result<usize> {
        let page_id = self.page_id(page)?;
        let (content, skipped) = self.page_content(page_id)?;
        if skipped > 0 {
            // Replacing /Contents would drop the streams we could not read
            return Err(Error::ContentStream(format!(
                "{} content streams on page {} could not be decoded",
                skipped, page
            )));
        }
        let (rewritten, removed) = strip_literals(&content, literals)?;
        if removed > 0 {
            let id = self.add_stream(&rewritten)?;
            self.set_contents(page_id, Object::Reference(id))?;
        }
        Ok(removed)
    }

    fn fill_rects(&mut self, page: u32, rects: &[Rect], color: Rgb) -> Result<()> {
        if rects.is_empty() {
            return Ok(());
        }
        let page_id = self.page_id(page)?;
        let existing = self.content_refs(page_id)?;
        let open = match self.page_content(page_id).and_then(|(c, _)| open_states(&c)) {
            Ok(open) => open,
            Err(e) => {
                log::warn!("Cannot count open graphics states on page {}: {}", page, e);
                0
            }
        };

        let save_id = self.add_stream(SAVE_STATE)?;
        let overlay_id = self.add_stream(&overlay_content(rects, color, open)?)?;

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(save_id));
        contents.extend(existing);
        contents.push(Object::Reference(overlay_id));
        self.set_contents(page_id, Object::Array(contents))
    }

    fn unprotected_copy(&self) -> Result<Box<dyn PdfDocument>> {
        let doc = copy_pages(&self.doc)?;
        Ok(Box::new(LopdfPdf::from_document(
            doc,
            Arc::clone(&self.metrics),
        )))
    }

    fn save(&self, strategy: SaveStrategy) -> Result<Vec<u8>> {
        let mut doc = self.doc.clone();
        match strategy {
            SaveStrategy::Classic => {
                doc.reference_table.cross_reference_type = XrefType::CrossReferenceTable;
                // Entries left over from a cross-reference stream dictionary
                for key in XREF_STREAM_KEYS {
                    doc.trailer.remove(key);
                }
            }
            SaveStrategy::Compressed => doc.compress(),
            SaveStrategy::Compacted => {
                let pruned = doc.prune_objects();
                log::debug!("Pruned {} unreachable objects", pruned.len());
                doc.renumber_objects();
                doc.compress();
                if doc.version.as_str() < "1.5" {
                    doc.version = "1.5".to_string();
                }
                doc.reference_table.cross_reference_type = XrefType::CrossReferenceStream;
            }
        }

        let mut buf = Vec::new();
        doc.save_to(&mut buf)
            .map_err(|e| Error::Redaction(e.to_string()))?;
        Ok(buf)
    }
}

/// Look up a page attribute, following `/Parent` links for inheritable keys.
pub(super) fn inherited<'d>(
    doc: &'d LopdfDocument,
    page: &'d Dictionary,
    key: &[u8],
) -> Option<&'d Object> {
    let mut current = page;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Decoded bytes of a stream; unfiltered streams are returned as stored.
fn stream_bytes(stream: &Stream) -> Result<Vec<u8>> {
    if stream.dict.has(b"Filter") {
        stream
            .decompressed_content()
            .map_err(|e| Error::PdfParse(e.to_string()))
    } else {
        Ok(stream.content.clone())
    }
}

/// Helper to get a string from a PDF dictionary.
fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => {
            // UTF-16BE with BOM
            if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
                let utf16: Vec<u16> = bytes[2..]
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16(&utf16).ok()
            } else {
                String::from_utf8(bytes.clone())
                    .ok()
                    .or_else(|| Some(bytes.iter().map(|&b| b as char).collect()))
            }
        }
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}
