//! Document-level facts reported by inspection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Protection state of a loaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protection {
    /// No encryption dictionary
    #[default]
    None,
    /// Encrypted, but readable with an empty password
    Recoverable,
    /// Encrypted and unreadable without a password
    Locked,
}

impl Protection {
    /// Whether any protection marker is present.
    pub fn is_protected(&self) -> bool {
        !matches!(self, Protection::None)
    }
}

/// Document metadata and structure summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// PDF version (e.g., "1.7")
    pub pdf_version: String,

    /// Total number of pages
    pub page_count: u32,

    /// Protection state
    pub protection: Protection,

    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Creator application
    pub creator: Option<String>,

    /// PDF producer
    pub producer: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSSOHH'mm').
pub fn parse_pdf_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);

    // At minimum we need YYYY
    if s.len() < 4 {
        return None;
    }

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month: u32 = s.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(1);
    let day: u32 = s.get(6..8).and_then(|d| d.parse().ok()).unwrap_or(1);
    let hour: u32 = s.get(8..10).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minute: u32 = s.get(10..12).and_then(|m| m.parse().ok()).unwrap_or(0);
    let second: u32 = s.get(12..14).and_then(|s| s.parse().ok()).unwrap_or(0);

    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
}
