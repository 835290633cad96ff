//! Caller-facing analysis output.

use serde::{Deserialize, Serialize};

use super::{PageRedactionSet, PiiType, Rect, Statistics};
use crate::error::{Error, Result};

/// Whether matched text is echoed back in analysis details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextPolicy {
    /// Report only the length of each match
    #[default]
    LengthOnly,
    /// Report the matched text itself
    Include,
}

/// Matched content as exposed to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemContent {
    /// Raw matched text
    Text { text: String },
    /// Character count only
    #[serde(rename_all = "camelCase")]
    Length { text_length: usize },
}

/// One match in an analysis report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailItem {
    #[serde(rename = "type")]
    pub kind: PiiType,
    #[serde(flatten)]
    pub content: ItemContent,
    /// Top-left origin box
    pub coordinates: Rect,
}

/// Matches on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDetail {
    pub page: u32,
    pub items: Vec<DetailItem>,
}

/// Result of scanning a document without modifying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Whether any match was found
    pub found: bool,
    pub statistics: Statistics,
    pub details: Vec<PageDetail>,
}

impl AnalysisReport {
    /// Build a report from extraction output.
    pub fn from_sets(sets: &[PageRedactionSet], policy: TextPolicy) -> Self {
        let statistics = Statistics::from_sets(sets);
        let details = sets
            .iter()
            .map(|set| PageDetail {
                page: set.page_number,
                items: set
                    .items
                    .iter()
                    .map(|item| DetailItem {
                        kind: item.kind,
                        content: match policy {
                            TextPolicy::Include => ItemContent::Text {
                                text: item.text.clone(),
                            },
                            TextPolicy::LengthOnly => ItemContent::Length {
                                text_length: item.text.chars().count(),
                            },
                        },
                        coordinates: item.bounds(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            found: !statistics.is_empty(),
            statistics,
            details,
        }
    }

    /// Render as JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        let result = match format {
            JsonFormat::Pretty => serde_json::to_string_pretty(self),
            JsonFormat::Compact => serde_json::to_string(self),
        };

        result.map_err(|e| Error::Other(format!("JSON serialization error: {}", e)))
    }
}

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}
