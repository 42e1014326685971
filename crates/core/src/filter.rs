//! Statistical candidate filter.
//!
//! Narrows every line of a document down to plausible heading candidates.
//! Headings are statistically larger than the body text of their own page,
//! short, and not repeated page chrome, so each page gets its own font-size
//! cutoff (`mean + z * stddev`) and a document-wide frequency table catches
//! running headers and footers.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::record::LineRecord;
use crate::text;

/// Tunables for [`filter_candidates`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Standard deviations above the page mean a line's font must reach.
    pub z: f64,
    pub remove_repetitive_headers: bool,
    /// Distinct pages a (text, position) pair must appear on to count as
    /// repeated chrome.
    pub repeat_min_pages: usize,
    pub min_alnum: usize,
    pub max_chars: usize,
    pub max_words: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            z: 0.25,
            remove_repetitive_headers: true,
            repeat_min_pages: 3,
            min_alnum: 3,
            max_chars: 100,
            max_words: 15,
        }
    }
}

/// Font-size statistics for one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageStats {
    pub mean: f64,
    /// Sample standard deviation; 0 with fewer than two lines.
    pub std_dev: f64,
}

impl PageStats {
    pub fn from_sizes(sizes: &[f64]) -> Self {
        if sizes.is_empty() {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
            };
        }
        let n = sizes.len() as f64;
        let mean = sizes.iter().sum::<f64>() / n;
        let std_dev = if sizes.len() < 2 {
            0.0
        } else {
            let ss: f64 = sizes.iter().map(|s| (s - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        };
        Self { mean, std_dev }
    }

    pub fn threshold(&self, z: f64) -> f64 {
        self.mean + z * self.std_dev
    }
}

/// Key identifying a line's text at a position: trimmed lower-cased text and
/// `top` rounded to one decimal (kept as tenths to stay hashable).
type PositionKey = (String, i64);

fn position_key(line: &LineRecord) -> PositionKey {
    (
        line.text.trim().to_lowercase(),
        (line.line_top * 10.0).round() as i64,
    )
}

/// Position keys that appear on at least `min_pages` distinct pages.
pub fn repeated_keys(lines: &[LineRecord], min_pages: usize) -> HashSet<PositionKey> {
    let mut pages_by_key: HashMap<PositionKey, HashSet<usize>> = HashMap::new();
    for line in lines {
        pages_by_key
            .entry(position_key(line))
            .or_default()
            .insert(line.page);
    }
    pages_by_key
        .into_iter()
        .filter(|(_, pages)| pages.len() >= min_pages)
        .map(|(key, _)| key)
        .collect()
}

/// Index (within `page_lines`) of the line with the greatest `top`. On a tie
/// the later line wins.
fn last_line_index(page_lines: &[&LineRecord]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, line) in page_lines.iter().enumerate() {
        match best {
            Some((_, top)) if line.line_top < top => {}
            _ => best = Some((i, line.line_top)),
        }
    }
    best.map(|(i, _)| i)
}

/// Select heading candidates from a document's lines.
///
/// The result is a subset of `lines`, ordered by page and, within a page, in
/// input order.
pub fn filter_candidates(lines: &[LineRecord], config: &FilterConfig) -> Vec<LineRecord> {
    candidate_indices(lines, config)
        .into_iter()
        .map(|i| lines[i].clone())
        .collect()
}

/// Positions in `lines` of the records [`filter_candidates`] keeps, in the
/// same order.
pub fn candidate_indices(lines: &[LineRecord], config: &FilterConfig) -> Vec<usize> {
    let repeated = if config.remove_repetitive_headers {
        repeated_keys(lines, config.repeat_min_pages)
    } else {
        HashSet::new()
    };

    let mut by_page: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, line) in lines.iter().enumerate() {
        by_page.entry(line.page).or_default().push(i);
    }

    let mut candidates = Vec::new();
    for (page, indices) in by_page {
        let page_lines: Vec<&LineRecord> = indices.iter().map(|&i| &lines[i]).collect();
        let sizes: Vec<f64> = page_lines.iter().map(|l| l.font_size).collect();
        let stats = PageStats::from_sizes(&sizes);
        let threshold = stats.threshold(config.z);
        debug!(
            "page {page}: {} lines, mean {:.2}, std {:.2}, threshold {:.2}",
            page_lines.len(),
            stats.mean,
            stats.std_dev,
            threshold
        );

        let last = last_line_index(&page_lines);
        for (i, line) in page_lines.iter().enumerate() {
            if Some(i) == last {
                continue;
            }
            if !repeated.is_empty() && repeated.contains(&position_key(line)) {
                continue;
            }
            if passes_predicates(line, threshold, config) {
                candidates.push(indices[i]);
            }
        }
    }
    candidates
}

fn passes_predicates(line: &LineRecord, threshold: f64, config: &FilterConfig) -> bool {
    let trimmed = line.text.trim();
    text::alphanumeric_count(trimmed) >= config.min_alnum
        && text::char_length(trimmed) <= config.max_chars
        && text::word_count(trimmed) <= config.max_words
        && line.font_size >= threshold
}
