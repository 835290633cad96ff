//! Post-write structural checks.

use std::sync::Arc;

use crate::backend::{LoadMode, PdfBackend};
use crate::error::{Error, Result};

/// Smallest plausible serialized document.
pub const MIN_DOCUMENT_BYTES: usize = 200;

/// Checks that rewritten bytes are a sound document.
pub struct Validator {
    backend: Arc<dyn PdfBackend>,
}

impl Validator {
    /// Create a validator over `backend`.
    pub fn new(backend: Arc<dyn PdfBackend>) -> Self {
        Self { backend }
    }

    /// Validate `output` against the source page count.
    ///
    /// Checks run in order and stop at the first failure: minimum size,
    /// reload (protection tolerated), non-zero page count, non-zero page
    /// dimensions. A page-count mismatch is logged, not reported.
    pub fn validate(&self, output: &[u8], original_page_count: u32) -> Result<()> {
        if output.len() < MIN_DOCUMENT_BYTES {
            return Err(Error::Validation(format!(
                "output is {} bytes, expected at least {}",
                output.len(),
                MIN_DOCUMENT_BYTES
            )));
        }

        let doc = self
            .backend
            .open(output, LoadMode::Tolerant)
            .map_err(|e| Error::Validation(format!("output does not reload: {}", e)))?;

        let page_count = doc.page_count();
        if page_count == 0 {
            return Err(Error::Validation("output has no pages".to_string()));
        }

        if page_count != original_page_count {
            log::warn!(
                "Page count changed during redaction: {} -> {}",
                original_page_count,
                page_count
            );
        }

        for page in 1..=page_count {
            let (width, height) = doc
                .page_size(page)
                .map_err(|e| Error::Validation(format!("page {}: {}", page, e)))?;
            if width <= 0.0 || height <= 0.0 {
                return Err(Error::Validation(format!(
                    "page {} has zero size ({} x {})",
                    page, width, height
                )));
            }
        }

        log::debug!("Validated {} pages, {} bytes", page_count, output.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{PdfDocument, SaveStrategy};
    use crate::model::{DocumentInfo, Protection, Rect, Rgb, TextRun};

    struct Pages(Vec<(f32, f32)>);

    impl PdfDocument for Pages {
        fn page_count(&self) -> u32 {
            self.0.len() as u32
        }
        fn protection(&self) -> Protection {
            Protection::None
        }
        fn info(&self) -> DocumentInfo {
            DocumentInfo::default()
        }
        fn page_size(&self, page: u32) -> Result<(f32, f32)> {
            Ok(self.0[page as usize - 1])
        }
        fn text_runs(&self, _page: u32) -> Result<Vec<TextRun>> {
            Ok(Vec::new())
        }
        fn strip_text(&mut self, _page: u32, _literals: &[&str]) -> Result<usize> {
            Ok(0)
        }
        fn fill_rects(&mut self, _page: u32, _rects: &[Rect], _color: Rgb) -> Result<()> {
            Ok(())
        }
        fn unprotected_copy(&self) -> Result<Box<dyn PdfDocument>> {
            Ok(Box::new(Pages(self.0.clone())))
        }
        fn save(&self, _strategy: SaveStrategy) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    /// Backend that returns fixed pages, or a parse failure when empty.
    struct Fixed(Option<Vec<(f32, f32)>>);

    impl PdfBackend for Fixed {
        fn open(&self, _data: &[u8], _mode: LoadMode) -> Result<Box<dyn PdfDocument>> {
            match &self.0 {
                Some(pages) => Ok(Box::new(Pages(pages.clone()))),
                None => Err(Error::PdfParse("trailer not found".into())),
            }
        }
    }

    fn validator(pages: Option<Vec<(f32, f32)>>) -> Validator {
        Validator::new(Arc::new(Fixed(pages)))
    }

    const BYTES: [u8; 256] = [b' '; 256];

    #[test]
    fn test_valid_output() {
        let v = validator(Some(vec![(612.0, 792.0), (612.0, 792.0)]));
        assert!(v.validate(&BYTES, 2).is_ok());
    }

    #[test]
    fn test_too_small() {
        let v = validator(Some(vec![(612.0, 792.0)]));
        let err = v.validate(&BYTES[..199], 1).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(v.validate(&BYTES[..200], 1).is_ok());
    }

    #[test]
    fn test_reload_failure() {
        let err = validator(None).validate(&BYTES, 1).unwrap_err();
        assert_eq!(err.category(), crate::ErrorCategory::Validation);
    }

    #[test]
    fn test_no_pages() {
        assert!(validator(Some(vec![])).validate(&BYTES, 1).is_err());
    }

    #[test]
    fn test_page_count_mismatch_is_not_an_error() {
        let v = validator(Some(vec![(612.0, 792.0)]));
        assert!(v.validate(&BYTES, 3).is_ok());
    }

    #[test]
    fn test_zero_sized_page() {
        let v = validator(Some(vec![(612.0, 792.0), (612.0, 0.0)]));
        let err = v.validate(&BYTES, 2).unwrap_err();
        assert!(err.to_string().contains("page 2"));
    }
}
