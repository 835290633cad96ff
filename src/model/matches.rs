//! Matches and the per-page unit of redaction work.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of personally identifiable substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PiiType {
    /// Email address
    Email,
    /// Phone number
    Phone,
}

impl fmt::Display for PiiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PiiType::Email => f.write_str("email"),
            PiiType::Phone => f.write_str("phone"),
        }
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a rectangle.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Grow by `padding` on all four sides.
    pub fn expand(&self, padding: f32) -> Rect {
        Rect {
            x: self.x - padding,
            y: self.y - padding,
            width: self.width + 2.0 * padding,
            height: self.height + 2.0 * padding,
        }
    }
}

/// An RGB fill color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    /// Light gray, `#D3D3D3`.
    pub const LIGHT_GRAY: Rgb = Rgb {
        r: 211.0 / 255.0,
        g: 211.0 / 255.0,
        b: 211.0 / 255.0,
    };

    /// Build from a `0xRRGGBB` value.
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as f32 / 255.0,
            g: ((hex >> 8) & 0xFF) as f32 / 255.0,
            b: (hex & 0xFF) as f32 / 255.0,
        }
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::LIGHT_GRAY
    }
}

/// One matched substring with its placement.
///
/// `x`/`y` use top-left origin with Y increasing downward. Every match found
/// in the same text run carries the run's full box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PiiMatch {
    /// Matched literal
    pub text: String,
    /// Kind of match
    #[serde(rename = "type")]
    pub kind: PiiType,
    /// 1-based page number
    pub page_number: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PiiMatch {
    /// Bounding box of the match.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// All matches found on one page.
///
/// Only pages with at least one match get a set, so `items` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRedactionSet {
    /// 1-based absolute page number
    pub page_number: u32,
    /// Matches on the page
    pub items: Vec<PiiMatch>,
    /// Page height in page units
    pub page_height: f32,
    /// Page width in page units
    pub page_width: f32,
}

impl PageRedactionSet {
    /// Build a set, returning `None` when there are no items.
    pub fn new(
        page_number: u32,
        items: Vec<PiiMatch>,
        page_width: f32,
        page_height: f32,
    ) -> Option<Self> {
        if items.is_empty() {
            return None;
        }
        Some(Self {
            page_number,
            items,
            page_height,
            page_width,
        })
    }

    /// Distinct matched literals on the page, in first-seen order.
    pub fn literals(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for item in &self.items {
            if !out.contains(&item.text.as_str()) {
                out.push(&item.text);
            }
        }
        out
    }
}
