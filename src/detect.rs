//! Pre-flight structural sniff.
//!
//! Runs before any full parse so that obviously wrong input (empty data,
//! non-PDF bytes) is rejected with a precise category, and so that
//! protection markers are known up front.

use crate::error::{Error, Result};

/// PDF format information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
    /// Whether an `/Encrypt` marker appears in the file
    pub encrypted: bool,
}

impl std::fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)?;
        if self.encrypted {
            write!(f, " (encrypted)")?;
        }
        Ok(())
    }
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_MAGIC_LEN: usize = 5;
const VERSION_LEN: usize = 3; // e.g., "1.7"
const ENCRYPT_MARKER: &[u8] = b"/Encrypt";

/// Check the header of a document and look for protection markers.
///
/// # Errors
/// * `Error::EmptyInput` if `data` is empty
/// * `Error::UnknownFormat` if the data does not start with a PDF header
/// * `Error::UnsupportedVersion` if the header version is malformed
pub fn preflight(data: &[u8]) -> Result<PdfFormat> {
    if data.is_empty() {
        return Err(Error::EmptyInput);
    }

    let version = detect_version(data)?;
    let encrypted = has_encrypt_marker(data);

    Ok(PdfFormat { version, encrypted })
}

/// Extract the version string from the `%PDF-x.y` header.
pub fn detect_version(data: &[u8]) -> Result<String> {
    if data.len() < PDF_MAGIC_LEN + VERSION_LEN {
        return Err(Error::UnknownFormat);
    }

    if !data.starts_with(PDF_MAGIC) {
        return Err(Error::UnknownFormat);
    }

    let version_bytes = &data[PDF_MAGIC_LEN..PDF_MAGIC_LEN + VERSION_LEN];
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    Ok(version)
}

/// Whether an `/Encrypt` marker appears anywhere in `data`.
pub fn has_encrypt_marker(data: &[u8]) -> bool {
    contains(data, ENCRYPT_MARKER)
}

/// Check if a version string is valid.
fn is_valid_version(version: &str) -> bool {
    if version.len() != 3 {
        return false;
    }

    let chars: Vec<char> = version.chars().collect();
    chars[0].is_ascii_digit() && chars[1] == '.' && chars[2].is_ascii_digit()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
