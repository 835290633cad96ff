//! # pdfscrub
//!
//! Find emails and phone numbers in PDF documents and produce redacted
//! copies.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfscrub::{RedactOutcome, Scrubber};
//!
//! fn main() -> pdfscrub::Result<()> {
//!     let data = std::fs::read("statement.pdf")?;
//!
//!     match Scrubber::new().redact(&data)? {
//!         RedactOutcome::Redacted(doc) => {
//!             std::fs::write("statement.redacted.pdf", &doc.bytes)?;
//!             println!("{} redactions", doc.statistics.total_redactions);
//!         }
//!         RedactOutcome::Clean(report) => println!("{}", report.message),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - **Pre-flight**: header and protection markers are checked before parsing
//! - **Extraction**: positioned text runs are matched against the pattern set
//! - **Redaction**: matches are painted over and their text removed from the
//!   content stream where possible, then the document is saved through a
//!   fallback ladder and permission-locked
//! - **Validation**: the output is reloaded and checked before it is returned

pub mod backend;
pub mod detect;
pub mod error;
pub mod extract;
pub mod model;
pub mod pattern;
pub mod redact;
pub mod validate;

// Re-export commonly used types
pub use backend::{LoadMode, PdfBackend, PdfDocument, SaveStrategy};
pub use detect::{preflight, PdfFormat};
pub use error::{Error, ErrorCategory, ErrorReport, Result};
pub use extract::{Extraction, Extractor};
pub use model::{
    AnalysisReport, DocumentInfo, JsonFormat, PageRedactionSet, PiiMatch, PiiType, Protection,
    Rect, Rgb, Statistics, TextPolicy, TextRun,
};
pub use pattern::{
    classify, contains_pii, find_emails, find_phones, is_email, is_phone, Classification,
    MatchRule,
};
pub use redact::{LopdfLock, PermissionLock, QpdfLock, RedactOptions, Redaction, Redactor};
pub use validate::Validator;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Message returned when a document has nothing to redact.
pub const NO_MATCHES_MESSAGE: &str = "No PII found in document";

/// Redacted document with its statistics.
#[derive(Debug, Clone)]
pub struct RedactedDocument {
    /// Output bytes
    pub bytes: Vec<u8>,
    /// Counts of what was redacted
    pub statistics: Statistics,
    /// Wall-clock time of the whole pipeline
    pub processing_time_ms: u64,
    /// Whether the permission lock was applied
    pub lock_applied: bool,
    /// Literal occurrences removed from content streams
    pub tokens_removed: usize,
    /// Save strategy that produced the output
    pub strategy: SaveStrategy,
}

/// Response for documents without matches. No output document is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoMatches {
    pub message: String,
    /// All-zero statistics
    pub redactions: Statistics,
    #[serde(rename = "processingTime")]
    pub processing_time_ms: u64,
}

/// Result of [`Scrubber::redact`].
#[derive(Debug, Clone)]
pub enum RedactOutcome {
    /// At least one match was redacted
    Redacted(RedactedDocument),
    /// Nothing matched; the document was not rewritten
    Clean(NoMatches),
}

impl RedactOutcome {
    /// Statistics for either outcome.
    pub fn statistics(&self) -> &Statistics {
        match self {
            RedactOutcome::Redacted(doc) => &doc.statistics,
            RedactOutcome::Clean(report) => &report.redactions,
        }
    }

    /// Output bytes, if a redacted document was produced.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            RedactOutcome::Redacted(doc) => Some(&doc.bytes),
            RedactOutcome::Clean(_) => None,
        }
    }

    /// Whether the document had nothing to redact.
    pub fn is_clean(&self) -> bool {
        matches!(self, RedactOutcome::Clean(_))
    }
}

/// Builder and entry point for the scan/redact pipeline.
///
/// # Example
///
/// ```no_run
/// use pdfscrub::{Scrubber, TextPolicy};
///
/// let data = std::fs::read("form.pdf")?;
/// let report = Scrubber::new()
///     .with_text_policy(TextPolicy::Include)
///     .analyze(&data)?;
/// println!("{} matches", report.statistics.total_redactions);
/// # Ok::<(), pdfscrub::Error>(())
/// ```
#[derive(Clone)]
pub struct Scrubber {
    backend: Arc<dyn PdfBackend>,
    lock: Arc<dyn PermissionLock>,
    redact_options: RedactOptions,
    text_policy: TextPolicy,
    expose_error_detail: bool,
}

impl Scrubber {
    /// Create a scrubber using the shared backend and the in-process lock.
    pub fn new() -> Self {
        Self {
            backend: backend::shared(),
            lock: Arc::new(LopdfLock::new()),
            redact_options: RedactOptions::default(),
            text_policy: TextPolicy::default(),
            expose_error_detail: false,
        }
    }

    /// Use another document backend.
    pub fn with_backend(mut self, backend: Arc<dyn PdfBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Use another permission lock.
    pub fn with_lock(mut self, lock: Arc<dyn PermissionLock>) -> Self {
        self.lock = lock;
        self
    }

    /// Lock with a qpdf executable instead of the in-process lock.
    pub fn with_qpdf(mut self, program: impl Into<PathBuf>) -> Self {
        self.lock = Arc::new(QpdfLock::with_program(program));
        self
    }

    /// Set redact options.
    pub fn with_redact_options(mut self, options: RedactOptions) -> Self {
        self.redact_options = options;
        self
    }

    /// Return output without the permission lock.
    pub fn skip_permission_lock(mut self) -> Self {
        self.redact_options = self.redact_options.unlocked();
        self
    }

    /// Set how matched text appears in analysis reports.
    pub fn with_text_policy(mut self, policy: TextPolicy) -> Self {
        self.text_policy = policy;
        self
    }

    /// Attach low-level error messages to error reports.
    pub fn expose_error_detail(mut self, expose: bool) -> Self {
        self.expose_error_detail = expose;
        self
    }

    /// Current redact options.
    pub fn redact_options(&self) -> &RedactOptions {
        &self.redact_options
    }

    /// Current text policy.
    pub fn text_policy(&self) -> TextPolicy {
        self.text_policy
    }

    /// Caller-facing payload for an error, honoring the detail setting.
    pub fn report_error(&self, err: &Error) -> ErrorReport {
        err.to_report(self.expose_error_detail)
    }

    /// Summarize a document without scanning it.
    pub fn inspect(&self, data: &[u8]) -> Result<DocumentInfo> {
        detect::preflight(data)?;
        let doc = self.backend.open(data, LoadMode::Tolerant)?;
        Ok(doc.info())
    }

    /// Scan a document and report its matches.
    pub fn analyze(&self, data: &[u8]) -> Result<AnalysisReport> {
        let format = detect::preflight(data)?;
        log::debug!("Analyzing {}", format);

        let extraction = Extractor::new(Arc::clone(&self.backend)).extract(data)?;
        Ok(AnalysisReport::from_sets(&extraction.sets, self.text_policy))
    }

    /// Run the full pipeline on one document.
    pub fn redact(&self, data: &[u8]) -> Result<RedactOutcome> {
        let started = Instant::now();
        let format = detect::preflight(data)?;
        log::debug!("Redacting {}", format);

        let extraction = Extractor::new(Arc::clone(&self.backend)).extract(data)?;
        if extraction.is_clean() {
            log::info!("No matches in {} pages, nothing to redact", extraction.page_count);
            return Ok(RedactOutcome::Clean(NoMatches {
                message: NO_MATCHES_MESSAGE.to_string(),
                redactions: Statistics::zero(),
                processing_time_ms: elapsed_ms(started),
            }));
        }

        let statistics = Statistics::from_sets(&extraction.sets);
        let redaction = Redactor::new(Arc::clone(&self.backend), Arc::clone(&self.lock))
            .with_options(self.redact_options.clone())
            .redact(data, &extraction.sets)?;

        Validator::new(Arc::clone(&self.backend))
            .validate(&redaction.bytes, extraction.page_count)?;

        log::info!(
            "Redacted {} matches ({} emails, {} phones) on {} pages",
            statistics.total_redactions,
            statistics.emails,
            statistics.phones,
            statistics.pages_affected
        );

        Ok(RedactOutcome::Redacted(RedactedDocument {
            bytes: redaction.bytes,
            statistics,
            processing_time_ms: elapsed_ms(started),
            lock_applied: redaction.lock_applied,
            tokens_removed: redaction.tokens_removed,
            strategy: redaction.strategy,
        }))
    }

    /// Redact a file, writing the result to `output` when anything matched.
    pub fn redact_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<RedactOutcome> {
        let data = std::fs::read(input)?;
        let outcome = self.redact(&data)?;
        if let Some(bytes) = outcome.bytes() {
            std::fs::write(output, bytes)?;
        }
        Ok(outcome)
    }

    /// Redact many documents in parallel, one document per worker.
    ///
    /// Results are returned in input order.
    pub fn redact_batch<D>(&self, documents: &[D]) -> Vec<Result<RedactOutcome>>
    where
        D: AsRef<[u8]> + Sync,
    {
        documents
            .par_iter()
            .map(|data| self.redact(data.as_ref()))
            .collect()
    }

    /// [`Scrubber::redact`] on the blocking thread pool.
    #[cfg(feature = "async")]
    pub async fn redact_async(&self, data: Vec<u8>) -> Result<RedactOutcome> {
        let scrubber = self.clone();
        tokio::task::spawn_blocking(move || scrubber.redact(&data))
            .await
            .map_err(|e| Error::Other(format!("Blocking task failed: {}", e)))?
    }

    /// [`Scrubber::analyze`] on the blocking thread pool.
    #[cfg(feature = "async")]
    pub async fn analyze_async(&self, data: Vec<u8>) -> Result<AnalysisReport> {
        let scrubber = self.clone();
        tokio::task::spawn_blocking(move || scrubber.analyze(&data))
            .await
            .map_err(|e| Error::Other(format!("Blocking task failed: {}", e)))?
    }
}

impl Default for Scrubber {
    fn default() -> Self {
        Self::new()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Scan document bytes with default settings.
///
/// # Example
///
/// ```no_run
/// let data = std::fs::read("form.pdf").unwrap();
/// let report = pdfscrub::analyze_bytes(&data).unwrap();
/// println!("found: {}", report.found);
/// ```
pub fn analyze_bytes(data: &[u8]) -> Result<AnalysisReport> {
    Scrubber::new().analyze(data)
}

/// Redact document bytes with default settings.
pub fn redact_bytes(data: &[u8]) -> Result<RedactOutcome> {
    Scrubber::new().redact(data)
}

/// Redact a file with default settings.
///
/// # Example
///
/// ```no_run
/// let outcome = pdfscrub::redact_file("in.pdf", "out.pdf").unwrap();
/// println!("{} redactions", outcome.statistics().total_redactions);
/// ```
pub fn redact_file<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<RedactOutcome> {
    Scrubber::new().redact_file(input, output)
}

/// Summarize document bytes.
pub fn inspect_bytes(data: &[u8]) -> Result<DocumentInfo> {
    Scrubber::new().inspect(data)
}

/// Summarize a file.
pub fn inspect_file<P: AsRef<Path>>(path: P) -> Result<DocumentInfo> {
    let data = std::fs::read(path)?;
    inspect_bytes(&data)
}
