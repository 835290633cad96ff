//! Data model shared by extraction, redaction and reporting.
//!
//! Coordinates in [`TextRun`] are page-native (origin bottom-left, Y up).
//! Coordinates in [`PiiMatch`] are normalized to top-left origin with Y
//! increasing downward.

mod document;
mod matches;
mod report;
mod stats;
mod text_run;

pub use document::{parse_pdf_date, DocumentInfo, Protection};
pub use matches::{PageRedactionSet, PiiMatch, PiiType, Rect, Rgb};
pub use report::{AnalysisReport, DetailItem, ItemContent, JsonFormat, PageDetail, TextPolicy};
pub use stats::Statistics;
pub use text_run::{Matrix, TextRun};
