//! Content-stream text extraction with positions.
//!
//! Walks a page's content stream tracking the text matrix and the active
//! font, decodes every shown string through that font's encoding, and
//! returns positioned spans in PDF user space (bottom-left origin, baseline
//! y). Contiguous runs on the same baseline are coalesced into one span so a
//! marker drawn glyph-by-glyph still matches as a whole.

use std::collections::BTreeMap;

use lopdf::{Document, Object, ObjectId};

use crate::error::{Error, Result};

use super::content_bytes;

/// A positioned run of text in PDF user space.
#[derive(Debug, Clone)]
pub(crate) struct RawSpan {
    pub text: String,
    /// Left edge
    pub x: f32,
    /// Baseline
    pub y: f32,
    /// Estimated width
    pub width: f32,
    /// Effective font size (nominal size times the text matrix scale)
    pub font_size: f32,
}

/// Kerning adjustment (in 1/1000 text-space units) large enough to count as
/// a word space inside a TJ array.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Gap beyond which two runs on one baseline stay separate spans, in ems.
const RUN_GAP_EMS: f32 = 0.6;

pub(crate) fn extract_spans(doc: &Document, page_id: ObjectId) -> Result<Vec<RawSpan>> {
    let fonts = doc.get_page_fonts(page_id).unwrap_or_default();
    let content = content_bytes(doc, page_id)?;
    let spans = walk_content(doc, &content, &fonts)?;
    Ok(coalesce_runs(spans))
}

fn walk_content(
    doc: &Document,
    content: &[u8],
    fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
) -> Result<Vec<RawSpan>> {
    let content =
        lopdf::content::Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

    let mut spans = Vec::new();
    let mut current_font: Vec<u8> = Vec::new();
    let mut current_size: f32 = 12.0;
    let mut matrix = TextMatrix::default();
    let mut in_text_block = false;

    for op in content.operations {
        match op.operator.as_str() {
            "BT" => {
                in_text_block = true;
                matrix = TextMatrix::default();
            }
            "ET" => {
                in_text_block = false;
            }
            "Tf" => {
                if op.operands.len() >= 2 {
                    if let Object::Name(name) = &op.operands[0] {
                        current_font = name.clone();
                    }
                    current_size = get_number(&op.operands[1]).unwrap_or(12.0);
                }
            }
            "Td" | "TD" => {
                if op.operands.len() >= 2 {
                    let tx = get_number(&op.operands[0]).unwrap_or(0.0);
                    let ty = get_number(&op.operands[1]).unwrap_or(0.0);
                    matrix.translate(tx, ty);
                }
            }
            "Tm" => {
                if op.operands.len() >= 6 {
                    matrix.set(
                        get_number(&op.operands[0]).unwrap_or(1.0),
                        get_number(&op.operands[1]).unwrap_or(0.0),
                        get_number(&op.operands[2]).unwrap_or(0.0),
                        get_number(&op.operands[3]).unwrap_or(1.0),
                        get_number(&op.operands[4]).unwrap_or(0.0),
                        get_number(&op.operands[5]).unwrap_or(0.0),
                    );
                }
            }
            "T*" => {
                matrix.next_line();
            }
            "Tj" | "TJ" => {
                if in_text_block {
                    let text = decode_show_op(doc, &op, fonts, &current_font);
                    push_span(&mut spans, text, &matrix, current_size);
                }
            }
            "'" | "\"" => {
                matrix.next_line();
                if in_text_block {
                    let text_idx = if op.operator == "\"" { 2 } else { 0 };
                    if let Some(Object::String(bytes, _)) = op.operands.get(text_idx) {
                        let text = decode_bytes(doc, bytes, fonts, &current_font);
                        push_span(&mut spans, text, &matrix, current_size);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

fn push_span(spans: &mut Vec<RawSpan>, text: String, matrix: &TextMatrix, nominal_size: f32) {
    if text.trim().is_empty() {
        return;
    }
    let (x, y) = matrix.position();
    let font_size = nominal_size * matrix.scale();
    let width = estimate_width(&text, font_size);
    spans.push(RawSpan {
        text,
        x,
        y,
        width,
        font_size,
    });
}

/// Decode the string operand(s) of a Tj or TJ operation.
fn decode_show_op(
    doc: &Document,
    op: &lopdf::content::Operation,
    fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
    current_font: &[u8],
) -> String {
    if op.operator == "TJ" {
        let Some(Object::Array(items)) = op.operands.first() else {
            return String::new();
        };
        let mut combined = String::new();
        for item in items {
            match item {
                Object::String(bytes, _) => {
                    combined.push_str(&decode_bytes(doc, bytes, fonts, current_font));
                }
                Object::Integer(n) => {
                    maybe_push_space(&mut combined, -(*n as f32));
                }
                Object::Real(n) => {
                    maybe_push_space(&mut combined, -n);
                }
                _ => {}
            }
        }
        combined
    } else {
        match op.operands.first() {
            Some(Object::String(bytes, _)) => decode_bytes(doc, bytes, fonts, current_font),
            _ => String::new(),
        }
    }
}

/// A large rightward kerning adjustment usually stands in for a word space.
fn maybe_push_space(text: &mut String, adjustment: f32) {
    if adjustment <= TJ_SPACE_THRESHOLD || text.is_empty() || text.ends_with(' ') {
        return;
    }
    if let Some(c) = text.chars().last() {
        if !is_spaceless_script_char(c) {
            text.push(' ');
        }
    }
}

fn decode_bytes(
    doc: &Document,
    bytes: &[u8],
    fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
    current_font: &[u8],
) -> String {
    let encoding = fonts
        .get(current_font)
        .and_then(|font| font.get_font_encoding(doc).ok());
    match encoding {
        Some(enc) => Document::decode_text(&enc, bytes).unwrap_or_default(),
        None => decode_text_simple(bytes),
    }
}

/// Merge consecutive spans that continue the same baseline run.
fn coalesce_runs(spans: Vec<RawSpan>) -> Vec<RawSpan> {
    let mut merged: Vec<RawSpan> = Vec::with_capacity(spans.len());

    for span in spans {
        match merged.last_mut() {
            Some(prev) if continues_run(prev, &span) => {
                let gap = span.x - (prev.x + prev.width);
                let em = prev.font_size.max(span.font_size);
                let boundary_is_cjk = prev.text.chars().last().map(is_spaceless_script_char)
                    == Some(true)
                    && span.text.chars().next().map(is_spaceless_script_char) == Some(true);
                if gap > 0.25 * em && !boundary_is_cjk && !prev.text.ends_with(' ') {
                    prev.text.push(' ');
                }
                prev.text.push_str(&span.text);
                prev.width = (span.x + span.width) - prev.x;
                prev.font_size = prev.font_size.max(span.font_size);
            }
            _ => merged.push(span),
        }
    }

    merged
}

fn continues_run(prev: &RawSpan, next: &RawSpan) -> bool {
    let em = prev.font_size.max(next.font_size).max(1.0);
    let same_baseline = (prev.y - next.y).abs() < 0.1 * em;
    let gap = next.x - (prev.x + prev.width);
    same_baseline && gap.abs() < RUN_GAP_EMS * em
}

/// Estimated advance in ems: CJK glyphs occupy a full em, everything else
/// roughly half.
fn estimate_width(text: &str, font_size: f32) -> f32 {
    let ems: f32 = text
        .chars()
        .map(|c| if is_spaceless_script_char(c) { 1.0 } else { 0.5 })
        .sum();
    ems * font_size
}

#[derive(Debug, Clone, Copy)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.e = e;
        self.f = f;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.e += tx * self.a + ty * self.c;
        self.f += tx * self.b + ty * self.d;
    }

    fn next_line(&mut self) {
        // Default leading; TL is rare in drawing title blocks.
        self.translate(0.0, -12.0);
    }

    fn position(&self) -> (f32, f32) {
        (self.e, self.f)
    }

    fn scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// CJK scripts are written without word spaces.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        || (0x3040..=0x309F).contains(&code)
        || (0x30A0..=0x30FF).contains(&code)
        || (0x3000..=0x303F).contains(&code)
}

/// Decoding fallback when the font carries no usable encoding.
fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }
    bytes.iter().map(|&b| b as char).collect()
}
