//! Aggregated match counts.

use serde::{Deserialize, Serialize};

use super::{PageRedactionSet, PiiType};

/// Match counts for client-facing telemetry.
///
/// Always recomputed from a collection of [`PageRedactionSet`]s, so
/// `total_redactions == emails + phones` holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// One per match
    pub total_redactions: u32,
    /// Email matches
    pub emails: u32,
    /// Phone matches
    pub phones: u32,
    /// Number of pages with at least one match
    pub pages_affected: u32,
}

impl Statistics {
    /// All-zero statistics.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Fold over every match of every set.
    pub fn from_sets(sets: &[PageRedactionSet]) -> Self {
        let mut stats = Statistics {
            pages_affected: sets.len() as u32,
            ..Self::default()
        };

        for item in sets.iter().flat_map(|set| &set.items) {
            stats.total_redactions += 1;
            match item.kind {
                PiiType::Email => stats.emails += 1,
                PiiType::Phone => stats.phones += 1,
            }
        }

        stats
    }

    /// Whether nothing was found.
    pub fn is_empty(&self) -> bool {
        self.total_redactions == 0
    }
}
