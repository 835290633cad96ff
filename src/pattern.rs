//! Pattern engine for emails and phone numbers.
//!
//! Classification is a pure function over a string. Phone numbers are found
//! by an ordered list of independent [`MatchRule`]s whose results are merged
//! by literal substring, first-seen wins. Overlapping rules are expected: one
//! number may be matched by several rules, and two differently formatted
//! substrings of the same number are reported separately.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Minimum digit count for a phone candidate.
const MIN_PHONE_DIGITS: usize = 7;

/// Result of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    /// Text contains at least one email address
    pub is_email: bool,
    /// Text contains at least one phone number
    pub is_phone: bool,
}

impl Classification {
    /// Whether anything was found.
    pub fn any(&self) -> bool {
        self.is_email || self.is_phone
    }
}

/// A single matching rule.
///
/// Phone rules are evaluated in [`MatchRule::PHONE_RULES`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// `local@domain.tld`
    Email,
    /// Optional `+`, 1-3 digit country code, digit groups, optional
    /// parenthesized area code.
    International,
    /// Optional `(NN..NNNN)` followed by 3-4 digit groups.
    Parenthesized,
    /// `NNN-NNN-NNNN` with space, dot or dash separators.
    Separated,
    /// `00` prefix, 1-3 digit country code, up to three digit groups.
    DoubleZero,
    /// 10-15 contiguous digits.
    Compact,
}

impl MatchRule {
    /// Phone rules in evaluation order.
    pub const PHONE_RULES: [MatchRule; 5] = [
        MatchRule::International,
        MatchRule::Parenthesized,
        MatchRule::Separated,
        MatchRule::DoubleZero,
        MatchRule::Compact,
    ];

    fn source(self) -> &'static str {
        match self {
            MatchRule::Email => r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}",
            MatchRule::International => {
                r"\+?\d{1,3}[\s.\-]?(?:\(\d{1,4}\)[\s.\-]?)?\d{1,4}(?:[\s.\-]\d{1,4}){2,3}"
            }
            MatchRule::Parenthesized => {
                r"(?:\(\d{2,4}\)\s?)?\d{3,4}[\s.\-]?\d{3,4}(?:[\s.\-]?\d{3,4})?"
            }
            MatchRule::Separated => r"\b\d{3}[\s.\-]\d{3}[\s.\-]\d{4}\b",
            MatchRule::DoubleZero => r"\b00\d{1,3}(?:[\s.\-]?\d{1,4}){1,3}",
            MatchRule::Compact => r"\b\d{10,15}\b",
        }
    }

    /// Compiled regex for this rule, built on first use.
    pub fn regex(self) -> &'static Regex {
        static EMAIL: OnceLock<Regex> = OnceLock::new();
        static INTERNATIONAL: OnceLock<Regex> = OnceLock::new();
        static PARENTHESIZED: OnceLock<Regex> = OnceLock::new();
        static SEPARATED: OnceLock<Regex> = OnceLock::new();
        static DOUBLE_ZERO: OnceLock<Regex> = OnceLock::new();
        static COMPACT: OnceLock<Regex> = OnceLock::new();

        let cell = match self {
            MatchRule::Email => &EMAIL,
            MatchRule::International => &INTERNATIONAL,
            MatchRule::Parenthesized => &PARENTHESIZED,
            MatchRule::Separated => &SEPARATED,
            MatchRule::DoubleZero => &DOUBLE_ZERO,
            MatchRule::Compact => &COMPACT,
        };
        // Sources are constants covered by tests.
        cell.get_or_init(|| Regex::new(self.source()).expect("static pattern compiles"))
    }

    /// All accepted matches of this rule, in text order.
    pub fn find_all(self, text: &str) -> Vec<&str> {
        self.regex()
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|m| self.accepts(m))
            .collect()
    }

    fn accepts(self, candidate: &str) -> bool {
        match self {
            MatchRule::Email => true,
            _ => candidate.chars().filter(char::is_ascii_digit).count() >= MIN_PHONE_DIGITS,
        }
    }
}

/// Merge rule outputs into one ordered sequence without duplicate literals.
fn merge_first_seen<'t>(rules: &[MatchRule], text: &'t str) -> Vec<&'t str> {
    let mut merged: Vec<&str> = Vec::new();
    for rule in rules {
        for candidate in rule.find_all(text) {
            if !merged.contains(&candidate) {
                merged.push(candidate);
            }
        }
    }
    merged
}

/// Find email addresses in `text`, in order of appearance.
pub fn find_emails(text: &str) -> Vec<String> {
    merge_first_seen(&[MatchRule::Email], text)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Find phone numbers in `text`.
///
/// Rules run in fixed order; a literal substring appears once.
pub fn find_phones(text: &str) -> Vec<String> {
    merge_first_seen(&MatchRule::PHONE_RULES, text)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Whether `text` contains an email address.
pub fn is_email(text: &str) -> bool {
    !MatchRule::Email.find_all(text).is_empty()
}

/// Whether `text` contains a phone number.
pub fn is_phone(text: &str) -> bool {
    MatchRule::PHONE_RULES
        .iter()
        .any(|rule| !rule.find_all(text).is_empty())
}

/// Classify `text` as containing emails and/or phone numbers.
pub fn classify(text: &str) -> Classification {
    Classification {
        is_email: is_email(text),
        is_phone: is_phone(text),
    }
}

/// Whether `text` contains any email or phone number.
pub fn contains_pii(text: &str) -> bool {
    classify(text).any()
}
