//! Redaction engine.
//!
//! Paints an opaque box over every match, strips the matched literals from
//! the page's text-showing operators when possible, serializes through the
//! save ladder and finally applies the permission lock.
//!
//! Protected documents that open with the empty password are copied page by
//! page into a fresh document first, so the output carries no encryption
//! dictionary of the source.

mod lock;

use std::sync::Arc;

pub use lock::{LopdfLock, PermissionLock, QpdfLock, LOCK_PERMISSIONS};

use crate::backend::{LoadMode, PdfBackend, PdfDocument, SaveStrategy};
use crate::error::{Error, Result};
use crate::model::{PageRedactionSet, PiiMatch, Protection, Rect, Rgb};
use crate::validate::MIN_DOCUMENT_BYTES;

/// Options for redacting documents.
#[derive(Debug, Clone)]
pub struct RedactOptions {
    /// Return output without the permission lock
    pub skip_permission_lock: bool,

    /// Padding added on every side of a match box
    pub padding: f32,

    /// Overlay fill color
    pub fill: Rgb,

    /// Remove matched literals from text-showing operators
    pub strip_text: bool,
}

impl RedactOptions {
    /// Create new redact options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the permission lock step.
    pub fn with_skip_permission_lock(mut self, skip: bool) -> Self {
        self.skip_permission_lock = skip;
        self
    }

    /// Skip the permission lock.
    pub fn unlocked(mut self) -> Self {
        self.skip_permission_lock = true;
        self
    }

    /// Set box padding.
    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    /// Set overlay fill color.
    pub fn with_fill(mut self, fill: Rgb) -> Self {
        self.fill = fill;
        self
    }

    /// Enable or disable literal stripping.
    pub fn with_strip_text(mut self, strip: bool) -> Self {
        self.strip_text = strip;
        self
    }

    /// Overlay only, leave text operators untouched.
    pub fn overlay_only(mut self) -> Self {
        self.strip_text = false;
        self
    }
}

impl Default for RedactOptions {
    fn default() -> Self {
        Self {
            skip_permission_lock: false,
            padding: 2.0,
            fill: Rgb::LIGHT_GRAY,
            strip_text: true,
        }
    }
}

/// A redacted document.
#[derive(Debug, Clone)]
pub struct Redaction {
    /// Serialized output
    pub bytes: Vec<u8>,
    /// Save strategy that produced `bytes`
    pub strategy: SaveStrategy,
    /// Whether the permission lock was applied
    pub lock_applied: bool,
    /// Literal occurrences removed from content streams
    pub tokens_removed: usize,
}

/// Rewrites documents to hide matches.
pub struct Redactor {
    backend: Arc<dyn PdfBackend>,
    lock: Arc<dyn PermissionLock>,
    options: RedactOptions,
}

impl Redactor {
    /// Create a redactor with default options.
    pub fn new(backend: Arc<dyn PdfBackend>, lock: Arc<dyn PermissionLock>) -> Self {
        Self {
            backend,
            lock,
            options: RedactOptions::default(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: RedactOptions) -> Self {
        self.options = options;
        self
    }

    /// Current options.
    pub fn options(&self) -> &RedactOptions {
        &self.options
    }

    /// Redact `data` using the per-page match sets.
    pub fn redact(&self, data: &[u8], sets: &[PageRedactionSet]) -> Result<Redaction> {
        let mut doc = self.open_working_copy(data)?;

        let mut tokens_removed = 0;
        for set in sets {
            if self.options.strip_text {
                match doc.strip_text(set.page_number, &set.literals()) {
                    Ok(removed) => tokens_removed += removed,
                    Err(e) => log::warn!(
                        "Text stripping skipped on page {}: {}",
                        set.page_number,
                        e
                    ),
                }
            }

            let rects: Vec<Rect> = set
                .items
                .iter()
                .map(|m| overlay_rect(m, set.page_height, self.options.padding))
                .collect();
            doc.fill_rects(set.page_number, &rects, self.options.fill)
                .map_err(|e| Error::Redaction(format!("page {}: {}", set.page_number, e)))?;
            log::debug!(
                "Page {}: {} boxes painted",
                set.page_number,
                rects.len()
            );
        }

        let (bytes, strategy) = save_with_ladder(doc.as_ref())?;
        log::info!("Saved redacted document ({} strategy, {} bytes)", strategy, bytes.len());

        let (bytes, lock_applied) = if self.options.skip_permission_lock {
            (bytes, false)
        } else {
            match self.lock.lock(&bytes) {
                Ok(locked) => (locked, true),
                Err(e) => {
                    log::warn!("Permission lock not applied: {}", e);
                    (bytes, false)
                }
            }
        };

        Ok(Redaction {
            bytes,
            strategy,
            lock_applied,
            tokens_removed,
        })
    }

    /// Open for mutation, copying protected-but-readable documents into a
    /// fresh unprotected document.
    fn open_working_copy(&self, data: &[u8]) -> Result<Box<dyn PdfDocument>> {
        match self.backend.open(data, LoadMode::Strict) {
            Err(Error::Encrypted) => {
                let doc = self.backend.open(data, LoadMode::Tolerant)?;
                if doc.protection() == Protection::Locked {
                    return Err(Error::PasswordProtected);
                }
                log::info!("Copying {} pages out of protected document", doc.page_count());
                doc.unprotected_copy()
            }
            other => other,
        }
    }
}

/// Overlay rectangle in page-native coordinates for a top-left-origin match.
pub fn overlay_rect(m: &PiiMatch, page_height: f32, padding: f32) -> Rect {
    Rect::new(m.x, page_height - m.y - m.height, m.width, m.height).expand(padding)
}

/// Try each [`SaveStrategy`] in ladder order and return the first output of
/// plausible size.
pub fn save_with_ladder(doc: &dyn PdfDocument) -> Result<(Vec<u8>, SaveStrategy)> {
    let mut failures = Vec::new();

    for strategy in SaveStrategy::LADDER {
        let failure = match doc.save(strategy) {
            Ok(bytes) if bytes.len() >= MIN_DOCUMENT_BYTES => return Ok((bytes, strategy)),
            Ok(bytes) => format!("{}: output too small ({} bytes)", strategy, bytes.len()),
            Err(e) => format!("{}: {}", strategy, e),
        };
        log::warn!("Save attempt failed, {}", failure);
        failures.push(failure);
    }

    Err(Error::SaveExhausted(failures.join("; ")))
}
