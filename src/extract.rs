//! Text & coordinate extraction.
//!
//! Opens a document, walks its pages in order and tags every text run that
//! contains PII with a top-left-origin bounding box.

use std::sync::Arc;

use crate::backend::{LoadMode, PdfBackend, PdfDocument};
use crate::error::{Error, Result};
use crate::model::{PageRedactionSet, PiiMatch, PiiType, Protection, TextRun};
use crate::pattern;

/// Extraction result for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Pages in the source document
    pub page_count: u32,
    /// One set per page with at least one match, in page order
    pub sets: Vec<PageRedactionSet>,
}

impl Extraction {
    /// Whether no page had a match.
    pub fn is_clean(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Finds PII in documents.
pub struct Extractor {
    backend: Arc<dyn PdfBackend>,
}

impl Extractor {
    /// Create an extractor over `backend`.
    pub fn new(backend: Arc<dyn PdfBackend>) -> Self {
        Self { backend }
    }

    /// Extract matches from document bytes.
    ///
    /// Documents readable with the empty password are scanned; documents
    /// that stay locked fail with [`Error::PasswordProtected`].
    pub fn extract(&self, data: &[u8]) -> Result<Extraction> {
        let doc = self.backend.open(data, LoadMode::Tolerant)?;
        if doc.protection() == Protection::Locked {
            return Err(Error::PasswordProtected);
        }

        let sets = scan_document(doc.as_ref())?;
        log::info!(
            "Extracted {} matches on {} of {} pages",
            sets.iter().map(|s| s.items.len()).sum::<usize>(),
            sets.len(),
            doc.page_count()
        );

        Ok(Extraction {
            page_count: doc.page_count(),
            sets,
        })
    }

    /// Extract only the per-page redaction sets.
    pub fn extract_matches(&self, data: &[u8]) -> Result<Vec<PageRedactionSet>> {
        self.extract(data).map(|e| e.sets)
    }
}

/// Scan every page of an open document.
pub fn scan_document(doc: &dyn PdfDocument) -> Result<Vec<PageRedactionSet>> {
    let mut sets = Vec::new();

    for page in 1..=doc.page_count() {
        let (width, height) = doc.page_size(page)?;
        let runs = doc.text_runs(page).map_err(|e| match e {
            Error::TextExtract(_) => e,
            other => Error::TextExtract(format!("page {}: {}", page, other)),
        })?;

        let items = page_matches(page, &runs, height);
        log::debug!(
            "Page {}: {} text runs, {} matches",
            page,
            runs.len(),
            items.len()
        );

        if let Some(set) = PageRedactionSet::new(page, items, width, height) {
            sets.push(set);
        }
    }

    Ok(sets)
}

/// Matches for one page's runs.
///
/// Every match from the same run shares the run's box. The run origin is
/// flipped to top-left coordinates with `y = page_height - ty - height`.
pub fn page_matches(page_number: u32, runs: &[TextRun], page_height: f32) -> Vec<PiiMatch> {
    let mut items = Vec::new();

    for run in runs {
        let text = run.text.trim();
        if text.is_empty() || !pattern::contains_pii(text) {
            continue;
        }

        let x = run.origin_x();
        let y = page_height - run.origin_y() - run.height;

        let emails = pattern::find_emails(text)
            .into_iter()
            .map(|t| (t, PiiType::Email));
        let phones = pattern::find_phones(text)
            .into_iter()
            .map(|t| (t, PiiType::Phone));

        for (text, kind) in emails.chain(phones) {
            items.push(PiiMatch {
                text,
                kind,
                page_number,
                x,
                y,
                width: run.width,
                height: run.height,
            });
        }
    }

    items
}
