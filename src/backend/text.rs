//! Content-stream walker producing positioned text runs.
//!
//! Tracks the graphics state stack (`q`/`Q`/`cm`), text state and the text
//! and line matrices, and emits one [`TextRun`] per text-showing operator.
//! Form XObjects are not entered.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use lopdf::{Dictionary, Document as LopdfDocument, Object};

use super::metrics::{StandardFamily, StandardMetrics};
use super::decode_text_simple;
use crate::error::{Error, Result};
use crate::model::{Matrix, TextRun};

/// TJ adjustment (thousandths of an em) treated as a word break.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Width source for one font resource.
#[derive(Debug, Clone)]
struct FontWidths {
    first_char: i64,
    widths: Vec<f32>,
    missing_width: f32,
    family: StandardFamily,
    two_byte: bool,
    default_cid_width: f32,
}

impl FontWidths {
    fn from_dict(doc: &LopdfDocument, font: &Dictionary) -> Self {
        let base_font = font
            .get(b"BaseFont")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string())
            .unwrap_or_default();
        let two_byte = font
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| n == b"Type0")
            .unwrap_or(false);

        let first_char = font
            .get(b"FirstChar")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(0);
        let widths = font
            .get(b"Widths")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_array().ok())
            .map(|arr| {
                arr.iter()
                    .map(|w| get_number(resolve(doc, w)).unwrap_or(0.0))
                    .collect()
            })
            .unwrap_or_default();
        let missing_width = font
            .get(b"FontDescriptor")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok())
            .and_then(|d| d.get(b"MissingWidth").ok())
            .and_then(|o| get_number(resolve(doc, o)))
            .unwrap_or(0.0);
        let default_cid_width = font
            .get(b"DescendantFonts")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_array().ok())
            .and_then(|arr| arr.first())
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok())
            .and_then(|d| d.get(b"DW").ok())
            .and_then(|o| get_number(resolve(doc, o)))
            .unwrap_or(1000.0);

        Self {
            first_char,
            widths,
            missing_width,
            family: StandardMetrics::family(&base_font),
            two_byte,
            default_cid_width,
        }
    }

    fn unknown() -> Self {
        Self {
            first_char: 0,
            widths: Vec::new(),
            missing_width: 0.0,
            family: StandardFamily::Other,
            two_byte: false,
            default_cid_width: 1000.0,
        }
    }

    /// Width of one code in 1/1000 text space units.
    fn glyph_width(&self, code: u32, metrics: &StandardMetrics) -> f32 {
        if self.two_byte {
            return self.default_cid_width;
        }
        let index = code as i64 - self.first_char;
        if index >= 0 && (index as usize) < self.widths.len() {
            return self.widths[index as usize];
        }
        if !self.widths.is_empty() && self.missing_width > 0.0 {
            return self.missing_width;
        }
        metrics.width(self.family, code as u8)
    }
}

#[derive(Debug, Clone)]
struct TextState {
    font: Vec<u8>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: Vec::new(),
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct GraphicsState {
    ctm: Matrix,
    text: TextState,
}

/// Piece of a text-showing operand.
enum Piece<'o> {
    Bytes(&'o [u8]),
    Adjust(f32),
}

/// Walks one page's content stream.
pub(crate) struct TextWalker<'a> {
    doc: &'a LopdfDocument,
    fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>,
    metrics: &'a StandardMetrics,
    widths: RefCell<HashMap<Vec<u8>, FontWidths>>,
}

impl<'a> TextWalker<'a> {
    pub(crate) fn new(
        doc: &'a LopdfDocument,
        fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>,
        metrics: &'a StandardMetrics,
    ) -> Self {
        Self {
            doc,
            fonts,
            metrics,
            widths: RefCell::new(HashMap::new()),
        }
    }

    /// Decode `content` and return its text runs.
    pub(crate) fn walk(&self, content: &[u8]) -> Result<Vec<TextRun>> {
        let content = lopdf::content::Content::decode(content)
            .map_err(|e| Error::TextExtract(e.to_string()))?;

        let mut runs = Vec::new();
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut gs = GraphicsState::default();
        let mut text_matrix = Matrix::IDENTITY;
        let mut line_matrix = Matrix::IDENTITY;

        for op in &content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => stack.push(gs.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        gs = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_from(operands) {
                        gs.ctm = m.multiply(&gs.ctm);
                    }
                }
                "BT" => {
                    text_matrix = Matrix::IDENTITY;
                    line_matrix = Matrix::IDENTITY;
                }
                "Tf" => {
                    if operands.len() >= 2 {
                        if let Object::Name(name) = &operands[0] {
                            gs.text.font = name.clone();
                        }
                        gs.text.font_size = get_number(&operands[1]).unwrap_or(12.0);
                    }
                }
                "Tc" => set_number(operands, &mut gs.text.char_spacing),
                "Tw" => set_number(operands, &mut gs.text.word_spacing),
                "TL" => set_number(operands, &mut gs.text.leading),
                "Ts" => set_number(operands, &mut gs.text.rise),
                "Tz" => {
                    if let Some(scale) = operands.first().and_then(get_number) {
                        gs.text.horizontal_scale = scale / 100.0;
                    }
                }
                "Td" | "TD" => {
                    if operands.len() >= 2 {
                        let tx = get_number(&operands[0]).unwrap_or(0.0);
                        let ty = get_number(&operands[1]).unwrap_or(0.0);
                        if op.operator == "TD" {
                            gs.text.leading = -ty;
                        }
                        line_matrix = Matrix::translation(tx, ty).multiply(&line_matrix);
                        text_matrix = line_matrix;
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix_from(operands) {
                        line_matrix = m;
                        text_matrix = m;
                    }
                }
                "T*" => {
                    next_line(&gs.text, &mut line_matrix, &mut text_matrix);
                }
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        let pieces = [Piece::Bytes(bytes)];
                        self.show(&gs, &mut text_matrix, &pieces, &mut runs);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(arr)) = operands.first() {
                        let pieces: Vec<Piece> = arr
                            .iter()
                            .filter_map(|item| match item {
                                Object::String(bytes, _) => Some(Piece::Bytes(bytes)),
                                other => get_number(other).map(Piece::Adjust),
                            })
                            .collect();
                        self.show(&gs, &mut text_matrix, &pieces, &mut runs);
                    }
                }
                "'" => {
                    next_line(&gs.text, &mut line_matrix, &mut text_matrix);
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        let pieces = [Piece::Bytes(bytes)];
                        self.show(&gs, &mut text_matrix, &pieces, &mut runs);
                    }
                }
                "\"" => {
                    if operands.len() >= 3 {
                        gs.text.word_spacing = get_number(&operands[0]).unwrap_or(0.0);
                        gs.text.char_spacing = get_number(&operands[1]).unwrap_or(0.0);
                        next_line(&gs.text, &mut line_matrix, &mut text_matrix);
                        if let Object::String(bytes, _) = &operands[2] {
                            let pieces = [Piece::Bytes(bytes)];
                            self.show(&gs, &mut text_matrix, &pieces, &mut runs);
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(runs)
    }

    /// Decode and measure one text-showing operation, then advance the
    /// text matrix past it.
    fn show(
        &self,
        gs: &GraphicsState,
        text_matrix: &mut Matrix,
        pieces: &[Piece],
        runs: &mut Vec<TextRun>,
    ) {
        let state = &gs.text;
        let encoding = self
            .fonts
            .get(&state.font)
            .and_then(|f| f.get_font_encoding(self.doc).ok());

        let mut widths = self.widths.borrow_mut();
        let font_widths = widths.entry(state.font.clone()).or_insert_with(|| {
            self.fonts
                .get(&state.font)
                .map(|dict| FontWidths::from_dict(self.doc, dict))
                .unwrap_or_else(FontWidths::unknown)
        });

        let mut text = String::new();
        let mut advance = 0.0f32;

        for piece in pieces {
            match piece {
                Piece::Bytes(bytes) => {
                    let decoded = match encoding {
                        Some(ref enc) => LopdfDocument::decode_text(enc, bytes)
                            .unwrap_or_else(|_| decode_text_simple(bytes)),
                        None => decode_text_simple(bytes),
                    };
                    text.push_str(&decoded);

                    if font_widths.two_byte {
                        for code in bytes.chunks(2) {
                            let code = code.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
                            let w = font_widths.glyph_width(code, self.metrics);
                            advance += (w / 1000.0 * state.font_size + state.char_spacing)
                                * state.horizontal_scale;
                        }
                    } else {
                        for &byte in bytes.iter() {
                            let w = font_widths.glyph_width(byte as u32, self.metrics);
                            let mut tx = w / 1000.0 * state.font_size + state.char_spacing;
                            if byte == b' ' {
                                tx += state.word_spacing;
                            }
                            advance += tx * state.horizontal_scale;
                        }
                    }
                }
                Piece::Adjust(n) => {
                    advance -= n / 1000.0 * state.font_size * state.horizontal_scale;
                    if -n > TJ_SPACE_THRESHOLD && !text.is_empty() && !text.ends_with(' ') {
                        text.push(' ');
                    }
                }
            }
        }

        let placement = text_matrix.multiply(&gs.ctm);
        let transform = Matrix::translation(0.0, state.rise).multiply(&placement);
        let width = advance * placement.x_scale();
        let height = state.font_size.abs() * placement.y_scale();

        *text_matrix = Matrix::translation(advance, 0.0).multiply(text_matrix);

        if !text.trim().is_empty() {
            runs.push(TextRun::new(text, transform, width.abs(), height));
        }
    }
}

fn next_line(state: &TextState, line_matrix: &mut Matrix, text_matrix: &mut Matrix) {
    *line_matrix = Matrix::translation(0.0, -state.leading).multiply(line_matrix);
    *text_matrix = *line_matrix;
}

fn matrix_from(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let n: Vec<f32> = operands[..6]
        .iter()
        .map(|o| get_number(o).unwrap_or(0.0))
        .collect();
    Some(Matrix::new(n[0], n[1], n[2], n[3], n[4], n[5]))
}

fn set_number(operands: &[Object], target: &mut f32) {
    if let Some(value) = operands.first().and_then(get_number) {
        *target = value;
    }
}

/// Follow a reference one level.
pub(crate) fn resolve<'d>(doc: &'d LopdfDocument, obj: &'d Object) -> &'d Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Helper to extract number from PDF object.
pub(crate) fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}
