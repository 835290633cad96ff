//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for the document operations the
//! pipeline needs, isolating the concrete PDF library (lopdf) from
//! extraction, redaction and validation logic.

mod copy;
mod lopdf_backend;
mod metrics;
mod rewrite;
mod text;

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::Result;
use crate::model::{DocumentInfo, Protection, Rect, Rgb, TextRun};

pub use lopdf_backend::{LopdfBackend, LopdfPdf};
pub use metrics::{StandardFamily, StandardMetrics, DEFAULT_GLYPH_WIDTH};
pub use rewrite::strip_literals;

/// How protection markers are treated on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Refuse documents carrying an encryption dictionary
    #[default]
    Strict,
    /// Open protected documents, decrypting with the empty password when
    /// possible
    Tolerant,
}

/// One rung of the save fallback ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStrategy {
    /// Classic cross-reference table, streams left as they are
    Classic,
    /// Encoder defaults: streams Flate-compressed, cross-reference format
    /// kept from the source
    Compressed,
    /// Unreachable objects pruned, objects renumbered, streams compressed,
    /// cross-reference stream
    Compacted,
}

impl SaveStrategy {
    /// Strategies in the order they are attempted.
    pub const LADDER: [SaveStrategy; 3] = [
        SaveStrategy::Classic,
        SaveStrategy::Compressed,
        SaveStrategy::Compacted,
    ];
}

impl fmt::Display for SaveStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveStrategy::Classic => f.write_str("classic"),
            SaveStrategy::Compressed => f.write_str("compressed"),
            SaveStrategy::Compacted => f.write_str("compacted"),
        }
    }
}

/// Entry point for loading documents.
pub trait PdfBackend: Send + Sync {
    /// Parse `data` into a mutable document.
    ///
    /// In [`LoadMode::Strict`] a protected document yields
    /// [`Error::Encrypted`](crate::Error::Encrypted). In
    /// [`LoadMode::Tolerant`] it loads, reporting its state through
    /// [`PdfDocument::protection`].
    fn open(&self, data: &[u8], mode: LoadMode) -> Result<Box<dyn PdfDocument>>;
}

/// A loaded document.
///
/// Pages are addressed by 1-based page number.
pub trait PdfDocument: Send {
    /// Number of pages.
    fn page_count(&self) -> u32;

    /// Protection state observed on load.
    fn protection(&self) -> Protection;

    /// Metadata and structure summary.
    fn info(&self) -> DocumentInfo;

    /// Page `(width, height)` of the visible box at scale 1.0.
    fn page_size(&self, page: u32) -> Result<(f32, f32)>;

    /// Positioned text runs in content-stream order.
    fn text_runs(&self, page: u32) -> Result<Vec<TextRun>>;

    /// Remove every occurrence of `literals` from the page's text-showing
    /// operators. Returns the number of removals.
    fn strip_text(&mut self, page: u32, literals: &[&str]) -> Result<usize>;

    /// Paint opaque rectangles (page-native coordinates) over the page.
    fn fill_rects(&mut self, page: u32, rects: &[Rect], color: Rgb) -> Result<()>;

    /// Copy every page into a fresh document without protection.
    fn unprotected_copy(&self) -> Result<Box<dyn PdfDocument>>;

    /// Serialize using one strategy.
    fn save(&self, strategy: SaveStrategy) -> Result<Vec<u8>>;
}

/// Process-wide backend, initialized on first use.
pub fn shared() -> Arc<dyn PdfBackend> {
    static SHARED: OnceLock<Arc<LopdfBackend>> = OnceLock::new();
    let backend: Arc<LopdfBackend> = SHARED
        .get_or_init(|| {
            log::debug!("Initializing shared PDF backend");
            Arc::new(LopdfBackend::new())
        })
        .clone();
    backend
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // Try UTF-16BE first (BOM marker)
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    // Try UTF-8
    if let Ok(s) = String::from_utf8(bytes.to_vec()) {
        return s;
    }

    // Fallback: Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_simple_utf8() {
        assert_eq!(decode_text_simple(b"Hello"), "Hello");
    }

    #[test]
    fn test_decode_text_simple_latin1() {
        // 0xE9 = 'é' in Latin-1
        let bytes = vec![0x48, 0x65, 0x6C, 0x6C, 0xE9];
        assert_eq!(decode_text_simple(&bytes), "Hellé");
    }

    #[test]
    fn test_decode_text_simple_utf16be() {
        let bytes = vec![0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_text_simple(&bytes), "Hi");
    }

    #[test]
    fn test_shared_is_initialized_once() {
        let a = shared();
        let b = shared();
        assert_eq!(
            Arc::as_ptr(&a) as *const (),
            Arc::as_ptr(&b) as *const ()
        );
    }

    #[test]
    fn test_ladder_order() {
        assert_eq!(SaveStrategy::LADDER[0], SaveStrategy::Classic);
        assert_eq!(SaveStrategy::LADDER[2].to_string(), "compacted");
    }
}
