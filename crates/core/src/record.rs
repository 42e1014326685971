//! Line records: one physical text line on one page, with its layout and
//! linguistic statistics.
//!
//! The geometry backend hands over [`LineGeometry`] values (raw text plus
//! first-span font and position). [`build_page_records`] turns one page's
//! worth of those into [`LineRecord`]s: it normalizes text, drops lines with
//! nothing alphanumeric, derives the text statistics, tags parts of speech,
//! and finally fills the spacing fields once the whole page is known.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::tagger::{PosCounts, PosTagger};
use crate::text::{self, round_to, SHORT_LINE_MAX_WORDS};

/// Raw geometry for one visual line, as read from the PDF.
///
/// Font size, bold flag and `origin_x` come from the first (leftmost) span
/// of the line. Coordinates are top-down page coordinates in points.
#[derive(Debug, Clone, PartialEq)]
pub struct LineGeometry {
    /// Span texts concatenated verbatim.
    pub raw_text: String,
    pub font_size: f64,
    pub bold: bool,
    pub origin_x: f64,
    pub top: f64,
    pub bottom: f64,
}

/// One text line with every attribute the classifier can consume.
///
/// Serialized field names are exactly the feature manifest keys plus `text`.
/// Flags serialize as `0`/`1`, which is what the training side reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    pub text: String,
    pub font_size: f64,
    #[serde(with = "flag")]
    pub bold: bool,
    /// Unset until the page's second pass runs.
    pub spacing_before: Option<f64>,
    /// Unset until the page's second pass runs.
    pub spacing_after: Option<f64>,
    pub indent: f64,
    pub length: usize,
    #[serde(with = "flag")]
    pub is_upper: bool,
    pub line_top: f64,
    pub line_bottom: f64,
    #[serde(with = "flag")]
    pub ends_with_colon: bool,
    #[serde(with = "flag")]
    pub is_short: bool,
    #[serde(with = "flag")]
    pub is_numbered: bool,
    #[serde(with = "flag")]
    pub first_page: bool,
    /// 0-based page index.
    pub page: usize,
    pub num_words: usize,
    #[serde(flatten)]
    pub pos: PosCounts,
}

impl LineRecord {
    /// Derive a record from raw line geometry.
    ///
    /// Returns `None` when the normalized text is empty or holds no
    /// alphanumeric character. A tagging failure leaves every POS count at
    /// zero.
    pub fn from_geometry(geom: &LineGeometry, page: usize, tagger: &PosTagger) -> Option<Self> {
        let text = text::normalize_text(&geom.raw_text);
        if text.is_empty() || !text::has_alphanumeric(&text) {
            return None;
        }

        let num_words = text::word_count(&text);
        let pos = tagger.counts(&text).unwrap_or_else(|e| {
            debug!("page {page}: {e}; POS counts default to zero");
            PosCounts::default()
        });

        Some(LineRecord {
            font_size: geom.font_size,
            bold: geom.bold,
            spacing_before: None,
            spacing_after: None,
            indent: round_to(geom.origin_x, 2),
            length: text::char_length(&text),
            is_upper: text::is_upper(&text),
            line_top: geom.top,
            line_bottom: geom.bottom,
            ends_with_colon: text::ends_with_colon(&text),
            is_short: num_words <= SHORT_LINE_MAX_WORDS,
            is_numbered: text::is_numbered(&text),
            first_page: page == 0,
            page,
            num_words,
            pos,
            text,
        })
    }

    /// The attribute tuple that must match exactly for two adjacent
    /// candidates to merge.
    pub fn merge_key(&self) -> MergeKey {
        MergeKey {
            font_size: self.font_size.to_bits(),
            bold: self.bold,
            is_upper: self.is_upper,
            ends_with_colon: self.ends_with_colon,
            is_short: self.is_short,
            is_numbered: self.is_numbered,
            page: self.page,
            first_page: self.first_page,
        }
    }
}

/// Discrete attributes compared by the multiline merger.
///
/// Font size is compared by bit pattern, i.e. exact equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MergeKey {
    font_size: u64,
    bold: bool,
    is_upper: bool,
    ends_with_colon: bool,
    is_short: bool,
    is_numbered: bool,
    page: usize,
    first_page: bool,
}

/// Fill `spacing_before` / `spacing_after` for one page's records, in page
/// order.
///
/// `spacing_before[i] = |top[i] - bottom[i-1]|` (0 for the first line) and
/// `spacing_after[i] = |top[i+1] - bottom[i]|` (0 for the last line), both
/// rounded to two decimals.
pub fn assign_spacing(records: &mut [LineRecord]) {
    let bounds: Vec<(f64, f64)> = records
        .iter()
        .map(|r| (r.line_top, r.line_bottom))
        .collect();
    let last = bounds.len().saturating_sub(1);

    for (i, record) in records.iter_mut().enumerate() {
        let before = if i == 0 {
            0.0
        } else {
            (bounds[i].0 - bounds[i - 1].1).abs()
        };
        let after = if i == last {
            0.0
        } else {
            (bounds[i + 1].0 - bounds[i].1).abs()
        };
        record.spacing_before = Some(round_to(before, 2));
        record.spacing_after = Some(round_to(after, 2));
    }
}

/// Build the finished records for one page.
///
/// `lines` must already be in top-to-bottom order. Lines without
/// alphanumeric content are dropped before spacing is computed, so spacing
/// relates each surviving line to its surviving neighbours.
pub fn build_page_records(
    lines: &[LineGeometry],
    page: usize,
    tagger: &PosTagger,
) -> Vec<LineRecord> {
    let mut records: Vec<LineRecord> = lines
        .iter()
        .filter_map(|geom| LineRecord::from_geometry(geom, page, tagger))
        .collect();
    assign_spacing(&mut records);
    records
}

/// Booleans as `0`/`1` on the way out; either form on the way in.
mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Flag::deserialize(deserializer)? {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        })
    }
}
