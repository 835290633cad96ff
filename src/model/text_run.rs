//! Positioned text as reported by the content-stream walker.

use serde::{Deserialize, Serialize};

/// A 2D affine transform `[a b c d e f]` in PDF notation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    /// X translation
    pub e: f32,
    /// Y translation
    pub f: f32,
}

impl Matrix {
    /// Identity transform.
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Create a matrix from its six components.
    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Pure translation.
    pub fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`: apply `self` first, then `other`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Length of the transformed X unit vector.
    pub fn x_scale(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    /// Length of the transformed Y unit vector.
    pub fn y_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One text-showing operation with its placement.
///
/// Coordinates are in the page's native space (origin bottom-left, Y up).
/// Only the translation and axis scales of `transform` are meaningful to
/// the rest of the pipeline; rotated or skewed text is placed as if it were
/// upright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Decoded text
    pub text: String,
    /// Text rendering matrix at the start of the run
    pub transform: Matrix,
    /// Advance width in page units
    pub width: f32,
    /// Effective font size in page units
    pub height: f32,
}

impl TextRun {
    /// Create a text run.
    pub fn new(text: impl Into<String>, transform: Matrix, width: f32, height: f32) -> Self {
        Self {
            text: text.into(),
            transform,
            width,
            height,
        }
    }

    /// X of the run origin (`transform.e`).
    pub fn origin_x(&self) -> f32 {
        self.transform.e
    }

    /// Y of the run baseline in native space (`transform.f`).
    pub fn origin_y(&self) -> f32 {
        self.transform.f
    }
}
