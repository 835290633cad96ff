//! End-to-end tests for extraction, redaction and validation.

mod common;

use std::sync::{Arc, Mutex};

use common::{page_texts, pdf_with_contents, pdf_with_pages};
use pdfscrub::error::Result;
use pdfscrub::{
    backend, ErrorCategory, Extractor, PermissionLock, PiiType, RedactOutcome, Scrubber,
    TextPolicy, Validator,
};

/// Lock that records calls and optionally fails.
struct RecordingLock {
    calls: Mutex<usize>,
    fail: bool,
}

impl RecordingLock {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(0),
            fail,
        })
    }
}

impl PermissionLock for RecordingLock {
    fn lock(&self, data: &[u8]) -> Result<Vec<u8>> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            return Err(pdfscrub::Error::Lock("qpdf missing".into()));
        }
        Ok(data.to_vec())
    }
}

fn unlocked() -> Scrubber {
    Scrubber::new().skip_permission_lock()
}

#[test]
fn test_clean_document_has_no_sets() {
    let data = pdf_with_pages(&[&["This is a test document with no personal information."]]);
    let sets = Extractor::new(backend::shared())
        .extract_matches(&data)
        .unwrap();
    assert!(sets.is_empty());
}

#[test]
fn test_single_character_run_has_no_matches() {
    let data = pdf_with_pages(&[&["X"]]);
    let report = unlocked().analyze(&data).unwrap();
    assert!(!report.found);
}

#[test]
fn test_two_pages_two_sets() {
    let data = pdf_with_pages(&[&["Mail jane@example.com"], &["Call 555-123-4567"]]);
    let sets = Extractor::new(backend::shared())
        .extract_matches(&data)
        .unwrap();

    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0].page_number, 1);
    assert_eq!(sets[0].items.len(), 1);
    assert_eq!(sets[0].items[0].kind, PiiType::Email);
    assert_eq!(sets[1].page_number, 2);
    assert_eq!(sets[1].items.len(), 1);
    assert_eq!(sets[1].items[0].kind, PiiType::Phone);
}

#[test]
fn test_absolute_page_numbers() {
    let data = pdf_with_pages(&[&["nothing"], &["nothing"], &["jane@example.com"]]);
    let sets = Extractor::new(backend::shared())
        .extract_matches(&data)
        .unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].page_number, 3);
    assert_eq!(sets[0].items[0].page_number, 3);
}

#[test]
fn test_match_coordinates() {
    let data = pdf_with_contents(&[b"BT /F1 12 Tf 72 700 Td (jane@example.com) Tj ET"]);
    let sets = Extractor::new(backend::shared())
        .extract_matches(&data)
        .unwrap();

    let item = &sets[0].items[0];
    assert_eq!(item.x, 72.0);
    assert_eq!(item.y, 80.0);
    assert_eq!(item.height, 12.0);
    assert!(item.width > 0.0);
    assert_eq!(sets[0].page_height, 792.0);
    assert_eq!(sets[0].page_width, 612.0);
}

#[test]
fn test_clean_document_short_circuits() {
    let data = pdf_with_pages(&[&["Quarterly numbers only: 42"]]);
    let lock = RecordingLock::new(false);
    let outcome = Scrubber::new().with_lock(lock.clone()).redact(&data).unwrap();

    assert!(outcome.is_clean());
    assert!(outcome.bytes().is_none());
    assert_eq!(outcome.statistics().total_redactions, 0);
    assert_eq!(*lock.calls.lock().unwrap(), 0);
}

#[test]
fn test_redaction_removes_text_and_keeps_pages() {
    let data = pdf_with_pages(&[
        &["Contact: jane@example.com", "Phone 555-123-4567"],
        &["Page two has no PII"],
    ]);

    let outcome = unlocked().redact(&data).unwrap();
    let RedactOutcome::Redacted(doc) = outcome else {
        panic!("expected a redacted document");
    };

    assert_eq!(doc.statistics.emails, 1);
    assert_eq!(doc.statistics.phones, 1);
    assert_eq!(doc.statistics.total_redactions, 2);
    assert_eq!(doc.statistics.pages_affected, 1);
    assert_eq!(doc.tokens_removed, 2);
    assert!(!doc.lock_applied);

    let texts = page_texts(&doc.bytes);
    assert_eq!(texts.len(), 2);
    assert!(texts[0].contains("Contact:"));
    assert!(!texts[0].contains("jane@example.com"));
    assert!(!texts[0].contains("555-123-4567"));
    assert_eq!(texts[1], "Page two has no PII");

    let rescan = unlocked().analyze(&doc.bytes).unwrap();
    assert!(!rescan.found);
}

#[test]
fn test_overlay_only_keeps_text() {
    let data = pdf_with_pages(&[&["jane@example.com"]]);
    let scrubber = Scrubber::new().with_redact_options(
        pdfscrub::RedactOptions::new()
            .unlocked()
            .overlay_only(),
    );
    let outcome = scrubber.redact(&data).unwrap();
    let bytes = outcome.bytes().unwrap();

    assert!(page_texts(bytes)[0].contains("jane@example.com"));
    let content = String::from_utf8_lossy(bytes);
    assert!(content.contains("/Contents"));
}

#[test]
fn test_lock_applied_when_available() {
    let data = pdf_with_pages(&[&["jane@example.com"]]);
    let lock = RecordingLock::new(false);
    let outcome = Scrubber::new().with_lock(lock.clone()).redact(&data).unwrap();

    let RedactOutcome::Redacted(doc) = outcome else {
        panic!("expected a redacted document");
    };
    assert!(doc.lock_applied);
    assert_eq!(*lock.calls.lock().unwrap(), 1);
}

#[test]
fn test_lock_failure_still_returns_document() {
    let data = pdf_with_pages(&[&["jane@example.com"]]);
    let lock = RecordingLock::new(true);
    let outcome = Scrubber::new().with_lock(lock.clone()).redact(&data).unwrap();

    let RedactOutcome::Redacted(doc) = outcome else {
        panic!("expected a redacted document");
    };
    assert!(!doc.lock_applied);
    assert!(doc.bytes.starts_with(b"%PDF-"));
    assert_eq!(*lock.calls.lock().unwrap(), 1);
}

#[test]
fn test_output_validates() {
    let data = pdf_with_pages(&[&["a"], &["jane@example.com"], &["b"]]);
    let outcome = unlocked().redact(&data).unwrap();
    let bytes = outcome.bytes().unwrap();

    Validator::new(backend::shared()).validate(bytes, 3).unwrap();
    assert_eq!(page_texts(bytes).len(), 3);
}

#[test]
fn test_analysis_hides_text_by_default() {
    let data = pdf_with_pages(&[&["Write to jane@example.com"]]);

    let hidden = unlocked().analyze(&data).unwrap();
    let json = hidden.to_json(pdfscrub::JsonFormat::Compact).unwrap();
    assert!(!json.contains("jane@example.com"));
    assert!(json.contains("\"textLength\":16"));

    let shown = unlocked()
        .with_text_policy(TextPolicy::Include)
        .analyze(&data)
        .unwrap();
    let json = shown.to_json(pdfscrub::JsonFormat::Compact).unwrap();
    assert!(json.contains("jane@example.com"));
}

#[test]
fn test_batch() {
    let docs = vec![
        pdf_with_pages(&[&["jane@example.com"]]),
        pdf_with_pages(&[&["nothing to see"]]),
        Vec::new(),
    ];
    let results = unlocked().redact_batch(&docs);

    assert!(!results[0].as_ref().unwrap().is_clean());
    assert!(results[1].as_ref().unwrap().is_clean());
    assert_eq!(
        results[2].as_ref().unwrap_err().category(),
        ErrorCategory::Input
    );
}

#[test]
fn test_inspect() {
    let data = pdf_with_pages(&[&["one"], &["two"]]);
    let info = pdfscrub::inspect_bytes(&data).unwrap();
    assert_eq!(info.page_count, 2);
    assert_eq!(info.pdf_version, "1.5");
    assert!(!info.protection.is_protected());
}

#[test]
fn test_redact_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.pdf");
    let output = dir.path().join("out.pdf");
    std::fs::write(&input, pdf_with_pages(&[&["jane@example.com"]])).unwrap();

    let outcome = unlocked().redact_file(&input, &output).unwrap();
    assert!(!outcome.is_clean());
    assert!(output.exists());

    let clean_input = dir.path().join("clean.pdf");
    let clean_output = dir.path().join("clean.out.pdf");
    std::fs::write(&clean_input, pdf_with_pages(&[&["nothing"]])).unwrap();
    let outcome = unlocked().redact_file(&clean_input, &clean_output).unwrap();
    assert!(outcome.is_clean());
    assert!(!clean_output.exists());
}
