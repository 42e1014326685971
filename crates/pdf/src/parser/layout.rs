//! Text extraction and line grouping.
//!
//! This module walks raw PDF content-stream operators with a small text
//! state machine and produces one [`LineGeometry`] per visual line. Every
//! function here is a pure transformation; I/O lives behind the
//! [`PdfBackend`] trait provided by the caller.
//!
//! # Pipeline
//!
//! ```text
//! content ops  ->  TextSpan[]  ->  TextLine[]  ->  LineGeometry[]
//!   (per page)      extract         group_spans      to_geometry
//! ```
//!
//! Positions are tracked in PDF user space (origin bottom-left, y up) and
//! flipped to top-down page coordinates only when a line is converted to
//! [`LineGeometry`].

use log::warn;
use outliner_core::record::LineGeometry;

use super::backend::{get_number_from_value, BackendFontInfo, PageId, PdfBackend, PdfValue};
use crate::cleanup::cleanup_span_text;
use crate::PdfError;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A single run of text at a specific position on the page.
///
/// `x`/`y` are the baseline origin in user space. `text` may begin with a
/// single space when the layout gap before it implies a word break.
#[derive(Debug, Clone)]
pub struct TextSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
    pub font_name: String,
    pub is_bold: bool,
}

/// A horizontal line of text assembled from one or more [`TextSpan`]s that
/// share (approximately) the same baseline.
#[derive(Debug, Clone, Default)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
    /// Baseline of the line in user space.
    pub baseline: f32,
}

impl TextLine {
    /// Concatenate all span texts verbatim.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Convert the line to top-down geometry on a page whose top edge sits
    /// at `page_top` in user space.
    ///
    /// Size, weight and origin come from the first (leftmost) span. Returns
    /// `None` for a line without spans.
    pub fn to_geometry(&self, page_top: f32) -> Option<LineGeometry> {
        let first = self.spans.first()?;
        let size = first.font_size;
        let top = page_top - (self.baseline + ASCENT * size);
        let bottom = page_top - (self.baseline - DESCENT * size);

        Some(LineGeometry {
            raw_text: self.text(),
            font_size: round2(size),
            bold: first.is_bold,
            origin_x: round2(first.x),
            top: round2(top),
            bottom: round2(bottom),
        })
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Two spans whose baselines differ by no more than this are treated as
/// belonging to the same line.
const Y_TOLERANCE: f32 = 1.0;

/// Approximate glyph width as a fraction of font size. No widths array is
/// consulted, so 0.5 stands in for a proportional font.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Minimum gap (in points) between adjacent spans before a space is implied.
const MIN_WORD_GAP: f32 = 1.5;

/// Font sizes closer than this are considered the same run.
const FONT_SIZE_EPSILON: f32 = 0.01;

/// Line box extents above and below the baseline, as fractions of the size.
const ASCENT: f32 = 0.8;
const DESCENT: f32 = 0.2;

/// The identity matrix `[a, b, c, d, e, f]`.
const IDENTITY_MATRIX: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

// ---------------------------------------------------------------------------
// Matrices
// ---------------------------------------------------------------------------

type Matrix = [f32; 6];

/// `lhs × rhs`: the transform that applies `lhs` first, then `rhs`.
fn multiply(lhs: &Matrix, rhs: &Matrix) -> Matrix {
    [
        lhs[0] * rhs[0] + lhs[1] * rhs[2],
        lhs[0] * rhs[1] + lhs[1] * rhs[3],
        lhs[2] * rhs[0] + lhs[3] * rhs[2],
        lhs[2] * rhs[1] + lhs[3] * rhs[3],
        lhs[4] * rhs[0] + lhs[5] * rhs[2] + rhs[4],
        lhs[4] * rhs[1] + lhs[5] * rhs[3] + rhs[5],
    ]
}

fn apply(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

fn read_matrix(operands: &[PdfValue]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let vals: Vec<f32> = operands
        .iter()
        .take(6)
        .filter_map(get_number_from_value)
        .collect();
    match vals.as_slice() {
        [a, b, c, d, e, f] => Some([*a, *b, *c, *d, *e, *f]),
        _ => None,
    }
}

fn round2(v: f32) -> f64 {
    outliner_core::text::round_to(v as f64, 2)
}

// ---------------------------------------------------------------------------
// CJK / spaceless-script helper
// ---------------------------------------------------------------------------

/// Returns `true` if `c` belongs to a script that does not use inter-word
/// spaces (CJK ideographs, kana, Hangul, Thai and neighbours).
pub fn is_spaceless_script_char(c: char) -> bool {
    matches!(
        c as u32,
        0x4E00..=0x9FFF
        | 0x3400..=0x4DBF
        | 0x20000..=0x2A6DF
        | 0xF900..=0xFAFF
        | 0x3040..=0x30FF
        | 0x31F0..=0x31FF
        | 0xAC00..=0xD7AF
        | 0x1100..=0x11FF
        | 0x3130..=0x318F
        | 0x3000..=0x303F
        | 0xFF00..=0xFFEF
        | 0x0E00..=0x0EFF
        | 0x1000..=0x109F
        | 0x1780..=0x17FF
        | 0x0F00..=0x0FFF
    )
}

// ---------------------------------------------------------------------------
// Internal: PDF text-state machine
// ---------------------------------------------------------------------------

/// Mutable state tracked while walking a page's content stream.
#[derive(Debug, Clone)]
struct TextState {
    /// Current font resource key (`F1`), not the base font name.
    font_key: Vec<u8>,
    font_name: String,
    font_size: f32,
    /// Current transformation matrix. Saved and restored by `q`/`Q`.
    ctm: Matrix,
    text_matrix: Matrix,
    /// Text line matrix, set by BT and updated by Td/TD/T*/Tm.
    line_matrix: Matrix,
    /// Horizontal scaling (Tz percent / 100).
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
    is_bold: bool,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_name: String::new(),
            font_size: 0.0,
            ctm: IDENTITY_MATRIX,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
            is_bold: false,
        }
    }
}

impl TextState {
    /// Text space to user space.
    fn render_matrix(&self) -> Matrix {
        multiply(&self.text_matrix, &self.ctm)
    }

    /// Current baseline origin in user space, including text rise.
    fn position(&self) -> (f32, f32) {
        apply(&self.render_matrix(), 0.0, self.text_rise)
    }

    /// Rendered font size: `font_size` scaled by the vertical axis of the
    /// text-to-user transform.
    fn effective_font_size(&self) -> f32 {
        let m = self.render_matrix();
        (self.font_size * (m[2].powi(2) + m[3].powi(2)).sqrt()).abs()
    }

    /// Advance the text matrix horizontally by `dx` text-space units.
    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Translate the line matrix (Td / TD / T*) and reset the text matrix to it.
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let new_tx = self.line_matrix[0] * tx + self.line_matrix[2] * ty + self.line_matrix[4];
        let new_ty = self.line_matrix[1] * tx + self.line_matrix[3] * ty + self.line_matrix[5];
        self.line_matrix[4] = new_tx;
        self.line_matrix[5] = new_ty;
        self.text_matrix = self.line_matrix;
    }

    /// Apply `Tf`: set font and size, detect weight from the base-font name.
    fn set_font(&mut self, key: Vec<u8>, base_font: &str, size: f32) {
        self.font_key = key;
        self.font_size = size;
        self.is_bold = is_bold_font_name(base_font);
        self.font_name = base_font.to_string();
    }

    /// Advance past `text` using estimated glyph widths.
    fn advance_after_show(&mut self, text: &str) {
        let mut total: f32 = 0.0;
        for ch in text.chars() {
            let mut w = self.font_size * APPROX_CHAR_WIDTH_RATIO + self.char_spacing;
            if ch == ' ' {
                w += self.word_spacing;
            }
            total += w * self.horiz_scale;
        }
        self.advance_x(total);
    }
}

/// Weight from a base font name such as `ABCDEF+Arial-BoldMT`.
pub fn is_bold_font_name(base_font: &str) -> bool {
    let upper = base_font.to_uppercase();
    upper.contains("BOLD") || upper.contains("BLACK")
}

fn resolve_font<'a>(key: &[u8], fonts: &'a [BackendFontInfo]) -> Option<&'a BackendFontInfo> {
    fonts.iter().find(|info| info.name == key)
}

/// Decode a string operand with the current font and clean it up.
fn decode_string(
    val: &PdfValue,
    backend: &dyn PdfBackend,
    fonts: &[BackendFontInfo],
    font_key: &[u8],
) -> String {
    match val {
        PdfValue::Str(bytes) => {
            let decoded = backend.decode_text(resolve_font(font_key, fonts), bytes);
            cleanup_span_text(&decoded)
        }
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Public API: span extraction
// ---------------------------------------------------------------------------

/// Walk a single page's content stream and produce a flat list of
/// [`TextSpan`]s.
///
/// | Operator | Action |
/// |----------|--------|
/// | `q` / `Q` | Save / restore graphics state |
/// | `cm`     | Concatenate the current transformation matrix |
/// | `BT`     | Begin text object, reset matrices |
/// | `Tf`     | Set font and size |
/// | `Tm`     | Set text matrix directly |
/// | `Td` / `TD` / `T*` | Move to a new line |
/// | `TL` `Tc` `Tw` `Tz` `Ts` | Text state parameters |
/// | `Tj` / `TJ` / `'` / `"` | Show text |
pub fn extract_page_spans(
    backend: &dyn PdfBackend,
    page_id: PageId,
) -> Result<Vec<TextSpan>, PdfError> {
    let raw_content = backend.page_content(page_id)?;
    let ops = backend.decode_content(&raw_content)?;
    let fonts = backend.page_fonts(page_id).unwrap_or_default();

    let mut state = TextState::default();
    let mut saved: Vec<TextState> = Vec::new();
    let mut spans: Vec<TextSpan> = Vec::new();

    for op in &ops {
        let number = |i: usize| op.operands.get(i).and_then(get_number_from_value);

        match op.operator.as_str() {
            // -- Graphics state -----------------------------------------
            "q" => saved.push(state.clone()),
            "Q" => {
                if let Some(prev) = saved.pop() {
                    // The text matrices are not part of the graphics state.
                    let (tm, lm) = (state.text_matrix, state.line_matrix);
                    state = prev;
                    state.text_matrix = tm;
                    state.line_matrix = lm;
                }
            }
            "cm" => {
                if let Some(m) = read_matrix(&op.operands) {
                    state.ctm = multiply(&m, &state.ctm);
                }
            }

            // -- Text object --------------------------------------------
            "BT" => {
                state.text_matrix = IDENTITY_MATRIX;
                state.line_matrix = IDENTITY_MATRIX;
            }
            "Tf" => handle_tf(&op.operands, &fonts, &mut state),
            "Tm" => {
                if let Some(m) = read_matrix(&op.operands) {
                    state.text_matrix = m;
                    state.line_matrix = m;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (number(0), number(1)) {
                    state.translate_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (number(0), number(1)) {
                    state.leading = -ty;
                    state.translate_line(tx, ty);
                }
            }
            "T*" => state.translate_line(0.0, -state.leading),
            "TL" => state.leading = number(0).unwrap_or(state.leading),
            "Tc" => state.char_spacing = number(0).unwrap_or(state.char_spacing),
            "Tw" => state.word_spacing = number(0).unwrap_or(state.word_spacing),
            "Tz" => {
                if let Some(v) = number(0) {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => state.text_rise = number(0).unwrap_or(state.text_rise),

            // -- Show text ----------------------------------------------
            "Tj" => {
                if let Some(first) = op.operands.first() {
                    let text = decode_string(first, backend, &fonts, &state.font_key);
                    emit_span(text, &mut state, &mut spans);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(arr)) = op.operands.first() {
                    handle_tj_array(arr, backend, &fonts, &mut state, &mut spans);
                }
            }
            "'" => {
                state.translate_line(0.0, -state.leading);
                if let Some(first) = op.operands.first() {
                    let text = decode_string(first, backend, &fonts, &state.font_key);
                    emit_span(text, &mut state, &mut spans);
                }
            }
            "\"" => {
                if op.operands.len() >= 3 {
                    state.word_spacing = number(0).unwrap_or(state.word_spacing);
                    state.char_spacing = number(1).unwrap_or(state.char_spacing);
                    state.translate_line(0.0, -state.leading);
                    let text = decode_string(&op.operands[2], backend, &fonts, &state.font_key);
                    emit_span(text, &mut state, &mut spans);
                }
            }

            _ => {}
        }
    }

    Ok(spans)
}

fn handle_tf(operands: &[PdfValue], fonts: &[BackendFontInfo], state: &mut TextState) {
    if operands.len() < 2 {
        return;
    }
    let key = match &operands[0] {
        PdfValue::Name(n) => n.clone(),
        PdfValue::Str(s) => s.clone(),
        _ => return,
    };
    let size = get_number_from_value(&operands[1]).unwrap_or(0.0);
    match resolve_font(&key, fonts).and_then(|info| info.base_font.clone()) {
        Some(base) => state.set_font(key, &base, size),
        None => {
            // Font not in the resource dict: fall back to the key itself.
            let name = String::from_utf8_lossy(&key).into_owned();
            state.set_font(key, &name, size);
        }
    }
}

/// Record `text` as a span at the current position and advance past it.
fn emit_span(text: String, state: &mut TextState, spans: &mut Vec<TextSpan>) {
    if text.is_empty() {
        return;
    }
    let (x, y) = state.position();
    state.advance_after_show(&text);
    let (end_x, _) = state.position();
    spans.push(TextSpan {
        text,
        x,
        y,
        width: end_x - x,
        font_size: state.effective_font_size(),
        font_name: state.font_name.clone(),
        is_bold: state.is_bold,
    });
}

/// Process a `TJ` array: strings to show interleaved with kerning
/// adjustments in thousandths of a text-space unit.
///
/// The whole array becomes one span; a kerning gap wide enough to look like
/// a word break becomes a space.
fn handle_tj_array(
    arr: &[PdfValue],
    backend: &dyn PdfBackend,
    fonts: &[BackendFontInfo],
    state: &mut TextState,
    spans: &mut Vec<TextSpan>,
) {
    let mut buf = String::new();
    let mut start: Option<(f32, f32)> = None;

    for elem in arr {
        match elem {
            PdfValue::Str(_) => {
                let fragment = decode_string(elem, backend, fonts, &state.font_key);
                if fragment.is_empty() {
                    continue;
                }
                if start.is_none() {
                    start = Some(state.position());
                }
                buf.push_str(&fragment);
                state.advance_after_show(&fragment);
            }
            val => {
                if let Some(adj) = get_number_from_value(val) {
                    let dx = -adj / 1000.0 * state.font_size * state.horiz_scale;
                    let gap_threshold =
                        state.font_size * APPROX_CHAR_WIDTH_RATIO * state.horiz_scale * 0.3;
                    if dx > gap_threshold && !buf.is_empty() && !buf.ends_with(' ') {
                        buf.push(' ');
                    }
                    state.advance_x(dx);
                }
            }
        }
    }

    let Some((x, y)) = start else {
        return;
    };
    let text = buf.trim_end();
    if text.is_empty() {
        return;
    }
    let (end_x, _) = state.position();
    spans.push(TextSpan {
        text: text.to_string(),
        x,
        y,
        width: end_x - x,
        font_size: state.effective_font_size(),
        font_name: state.font_name.clone(),
        is_bold: state.is_bold,
    });
}

// ---------------------------------------------------------------------------
// Public API: span -> line grouping
// ---------------------------------------------------------------------------

/// Group a flat list of [`TextSpan`]s into [`TextLine`]s ordered top to
/// bottom.
///
/// Spans whose baselines are within [`Y_TOLERANCE`] points of the line's
/// first span share a line.
pub fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    // Highest baseline first, then left to right.
    spans.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();

    for span in spans {
        let new_line = current
            .first()
            .is_some_and(|head| (span.y - head.y).abs() > Y_TOLERANCE);
        if new_line {
            lines.push(assemble_line(std::mem::take(&mut current)));
        }
        current.push(span);
    }

    if !current.is_empty() {
        lines.push(assemble_line(current));
    }

    lines
}

/// Build a [`TextLine`] from spans known to share a baseline.
///
/// Adjacent spans in the same font merge into one. Whenever the gap before
/// a span is at least [`MIN_WORD_GAP`], that span gets a leading space
/// unless the boundary is between spaceless-script characters or already
/// whitespace.
fn assemble_line(mut spans: Vec<TextSpan>) -> TextLine {
    spans.sort_by(|a, b| a.x.total_cmp(&b.x));
    let baseline = spans.first().map(|s| s.y).unwrap_or(0.0);

    let mut merged: Vec<TextSpan> = Vec::with_capacity(spans.len());

    for mut span in spans {
        if let Some(prev) = merged.last_mut() {
            let gap = span.x - (prev.x + prev.width);

            if gap >= MIN_WORD_GAP && needs_space(prev, &span) {
                span.text.insert(0, ' ');
            }

            let same_font = prev.font_name == span.font_name
                && (prev.font_size - span.font_size).abs() < FONT_SIZE_EPSILON
                && prev.is_bold == span.is_bold;

            if same_font && gap > -prev.font_size && gap < prev.font_size * 2.0 {
                prev.text.push_str(&span.text);
                prev.width = (span.x + span.width) - prev.x;
                continue;
            }
        }

        merged.push(span);
    }

    TextLine {
        spans: merged,
        baseline,
    }
}

fn needs_space(prev: &TextSpan, next: &TextSpan) -> bool {
    match (prev.text.chars().next_back(), next.text.chars().next()) {
        (Some(l), Some(f)) => {
            !l.is_whitespace()
                && !f.is_whitespace()
                && !(is_spaceless_script_char(l) && is_spaceless_script_char(f))
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Public API: page geometry
// ---------------------------------------------------------------------------

/// Default page top (US Letter height) when a page has no MediaBox.
pub const DEFAULT_PAGE_TOP: f32 = 792.0;

/// Extract every visual line of one page as top-down [`LineGeometry`].
pub fn page_geometry(
    backend: &dyn PdfBackend,
    page_id: PageId,
) -> Result<Vec<LineGeometry>, PdfError> {
    let page_top = match backend.page_box(page_id) {
        Some([_, lly, _, ury]) => ury.max(lly),
        None => {
            warn!(
                "page {:?} has no MediaBox, assuming a height of {}",
                page_id, DEFAULT_PAGE_TOP
            );
            DEFAULT_PAGE_TOP
        }
    };

    let spans = extract_page_spans(backend, page_id)?;
    Ok(group_spans_into_lines(spans)
        .iter()
        .filter_map(|line| line.to_geometry(page_top))
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
