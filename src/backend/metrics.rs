//! Built-in glyph widths for standard fonts without a `/Widths` array.

/// Helvetica widths for codes 32..=126, in 1/1000 text space units.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 32-47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 48-63
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 64-79
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 80-95
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 96-111
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 112-126
];

/// Times-Roman widths for codes 32..=126.
const TIMES: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278, // 32-47
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444, // 48-63
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722, // 64-79
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500, // 80-95
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500, // 96-111
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541, // 112-126
];

const COURIER_WIDTH: f32 = 600.0;

/// Fallback glyph width when nothing better is known.
pub const DEFAULT_GLYPH_WIDTH: f32 = 500.0;

/// Family of a standard font, resolved from its base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFamily {
    Helvetica,
    Times,
    Courier,
    Other,
}

/// Read-only width tables for the standard fonts.
///
/// Built once per process and shared by every document.
#[derive(Debug)]
pub struct StandardMetrics {
    helvetica: Vec<f32>,
    times: Vec<f32>,
}

impl StandardMetrics {
    /// Build the tables.
    pub fn new() -> Self {
        Self {
            helvetica: HELVETICA.iter().map(|&w| w as f32).collect(),
            times: TIMES.iter().map(|&w| w as f32).collect(),
        }
    }

    /// Resolve a `/BaseFont` name, ignoring any subset prefix.
    pub fn family(base_font: &str) -> StandardFamily {
        let name = match base_font.split_once('+') {
            Some((prefix, rest)) if prefix.len() == 6 => rest,
            _ => base_font,
        };
        let lower = name.to_ascii_lowercase();
        if lower.starts_with("helvetica") || lower.starts_with("arial") {
            StandardFamily::Helvetica
        } else if lower.starts_with("times") {
            StandardFamily::Times
        } else if lower.starts_with("courier") {
            StandardFamily::Courier
        } else {
            StandardFamily::Other
        }
    }

    /// Width of a single-byte code in 1/1000 text space units.
    pub fn width(&self, family: StandardFamily, code: u8) -> f32 {
        match family {
            StandardFamily::Courier => COURIER_WIDTH,
            StandardFamily::Helvetica => match code {
                32..=126 => self.helvetica[(code - 32) as usize],
                _ => DEFAULT_GLYPH_WIDTH,
            },
            StandardFamily::Times => match code {
                32..=126 => self.times[(code - 32) as usize],
                _ => DEFAULT_GLYPH_WIDTH,
            },
            StandardFamily::Other => DEFAULT_GLYPH_WIDTH,
        }
    }
}

impl Default for StandardMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family() {
        assert_eq!(
            StandardMetrics::family("Helvetica-Bold"),
            StandardFamily::Helvetica
        );
        assert_eq!(
            StandardMetrics::family("ABCDEF+Arial"),
            StandardFamily::Helvetica
        );
        assert_eq!(
            StandardMetrics::family("Courier-Oblique"),
            StandardFamily::Courier
        );
        assert_eq!(StandardMetrics::family("Times-Roman"), StandardFamily::Times);
        assert_eq!(
            StandardMetrics::family("XYZABC+TimesNewRomanPSMT"),
            StandardFamily::Times
        );
        assert_eq!(StandardMetrics::family("Symbol"), StandardFamily::Other);
    }

    #[test]
    fn test_widths() {
        let metrics = StandardMetrics::new();
        assert_eq!(metrics.width(StandardFamily::Helvetica, b' '), 278.0);
        assert_eq!(metrics.width(StandardFamily::Helvetica, b'@'), 1015.0);
        assert_eq!(metrics.width(StandardFamily::Helvetica, b'~'), 584.0);
        assert_eq!(metrics.width(StandardFamily::Times, b' '), 250.0);
        assert_eq!(metrics.width(StandardFamily::Times, b'@'), 921.0);
        assert_eq!(metrics.width(StandardFamily::Times, b'm'), 778.0);
        assert_eq!(metrics.width(StandardFamily::Courier, b'W'), 600.0);
        assert_eq!(metrics.width(StandardFamily::Other, b'a'), DEFAULT_GLYPH_WIDTH);
    }
}
