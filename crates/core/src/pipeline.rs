//! Stage composition: lines -> candidates -> outline.

use crate::classify::Classifier;
use crate::error::ClassifyError;
use crate::filter::{filter_candidates, FilterConfig};
use crate::merge::merge_multiline;
use crate::outline::Outline;
use crate::record::LineRecord;

/// Filter a document's lines and merge multi-line headings.
pub fn candidates(lines: &[LineRecord], config: &FilterConfig) -> Vec<LineRecord> {
    merge_multiline(filter_candidates(lines, config))
}

/// Run the whole pipeline over a document's lines.
pub fn outline(
    lines: &[LineRecord],
    config: &FilterConfig,
    classifier: &Classifier,
) -> Result<Outline, ClassifyError> {
    classifier.build_outline(&candidates(lines, config))
}
