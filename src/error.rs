//! Error types for pdfscrub.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for pdfscrub operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while scanning or redacting a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No input bytes were supplied.
    #[error("No document data was provided")]
    EmptyInput,

    /// The input is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF structure is corrupted or malformed.
    #[error("Corrupted PDF structure: {0}")]
    Corrupted(String),

    /// The document carries protection markers and was opened in strict mode.
    #[error("Document is encrypted")]
    Encrypted,

    /// The document is protected and could not be opened even when tolerating
    /// protection markers.
    #[error("Document is password-protected, cannot process")]
    PasswordProtected,

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Error extracting positioned text.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// A page content stream could not be rewritten.
    #[error("Content stream error: {0}")]
    ContentStream(String),

    /// Every save strategy failed.
    #[error("Could not serialize redacted document: {0}")]
    SaveExhausted(String),

    /// Error while rewriting the document.
    #[error("Redaction error: {0}")]
    Redaction(String),

    /// The permission lock could not be applied.
    #[error("Permission lock failed: {0}")]
    Lock(String),

    /// The rewritten document failed a structural check.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

/// Failure category surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Missing or empty input.
    Input,
    /// Not a valid document, or corrupt.
    Format,
    /// Password or encryption prevents processing.
    Protection,
    /// Text or position enumeration failed.
    Extraction,
    /// The redacted document could not be produced.
    Redaction,
    /// The redacted document failed post-write checks.
    Validation,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Input => "input_error",
            ErrorCategory::Format => "format_error",
            ErrorCategory::Protection => "protection_error",
            ErrorCategory::Extraction => "extraction_error",
            ErrorCategory::Redaction => "redaction_error",
            ErrorCategory::Validation => "validation_error",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::EmptyInput => ErrorCategory::Input,
            Error::Io(_)
            | Error::UnknownFormat
            | Error::UnsupportedVersion(_)
            | Error::PdfParse(_)
            | Error::Corrupted(_) => ErrorCategory::Format,
            Error::Encrypted | Error::PasswordProtected => ErrorCategory::Protection,
            Error::PageOutOfRange(..) | Error::TextExtract(_) => ErrorCategory::Extraction,
            Error::ContentStream(_)
            | Error::SaveExhausted(_)
            | Error::Redaction(_)
            | Error::Lock(_)
            | Error::Other(_) => ErrorCategory::Redaction,
            Error::Validation(_) => ErrorCategory::Validation,
        }
    }

    /// Human-readable remediation hint for the error's category.
    pub fn hint(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Upload a non-empty PDF document and retry.",
            ErrorCategory::Format => {
                "The file is not a valid PDF or is corrupted. Re-export it from the source application and retry."
            }
            ErrorCategory::Protection => "Remove password protection and retry.",
            ErrorCategory::Extraction => {
                "Text could not be read from the document. Scanned pages need OCR before redaction."
            }
            ErrorCategory::Redaction => {
                "The redacted document could not be written. Try re-saving the PDF with another tool and retry."
            }
            ErrorCategory::Validation => {
                "The redacted output failed integrity checks and was withheld. Retry or contact support."
            }
        }
    }

    /// Structured payload for the caller.
    ///
    /// The low-level message is attached as `detail` only when
    /// `expose_detail` is set.
    pub fn to_report(&self, expose_detail: bool) -> ErrorReport {
        let category = self.category();
        ErrorReport {
            category,
            message: category_message(category).to_string(),
            hint: self.hint().to_string(),
            detail: expose_detail.then(|| self.to_string()),
        }
    }
}

fn category_message(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::Input => "No document was provided",
        ErrorCategory::Format => "Invalid or corrupted PDF document",
        ErrorCategory::Protection => "Document is password-protected",
        ErrorCategory::Extraction => "Failed to extract text from the document",
        ErrorCategory::Redaction => "Failed to produce the redacted document",
        ErrorCategory::Validation => "Redacted document failed validation",
    }
}

/// Error payload safe to hand to a transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Failure category.
    pub category: ErrorCategory,
    /// Category-level message.
    pub message: String,
    /// Remediation hint.
    pub hint: String,
    /// Lower-level diagnostic, suppressed in hardened deployments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PasswordProtected;
        assert_eq!(
            err.to_string(),
            "Document is password-protected, cannot process"
        );

        let err = Error::PageOutOfRange(10, 5);
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_categories() {
        assert_eq!(Error::EmptyInput.category(), ErrorCategory::Input);
        assert_eq!(Error::UnknownFormat.category(), ErrorCategory::Format);
        assert_eq!(Error::Encrypted.category(), ErrorCategory::Protection);
        assert_eq!(
            Error::TextExtract("x".into()).category(),
            ErrorCategory::Extraction
        );
        assert_eq!(
            Error::SaveExhausted("x".into()).category(),
            ErrorCategory::Redaction
        );
        assert_eq!(
            Error::Validation("x".into()).category(),
            ErrorCategory::Validation
        );
    }

    #[test]
    fn test_report_hides_detail_when_hardened() {
        let err = Error::PdfParse("xref offset 1234 invalid".into());

        let hardened = err.to_report(false);
        assert_eq!(hardened.category, ErrorCategory::Format);
        assert!(hardened.detail.is_none());

        let verbose = err.to_report(true);
        assert!(verbose.detail.unwrap().contains("xref offset"));
    }

    #[test]
    fn test_protection_hint() {
        let report = Error::PasswordProtected.to_report(false);
        assert!(report.hint.contains("password"));
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"category\":\"protection\""));
        assert!(!json.contains("detail"));
    }
}
