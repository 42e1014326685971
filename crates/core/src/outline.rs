use serde::{Deserialize, Serialize};

use crate::label::HeadingLabel;

/// One heading in the final outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: HeadingLabel,
    pub text: String,
    /// 0-based page index.
    pub page: usize,
}

/// The document title plus its ordered headings.
///
/// Serializes to `{"title": "...", "outline": [{"level", "text", "page"}]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
}

impl Outline {
    pub fn len(&self) -> usize {
        self.outline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outline.is_empty()
    }

    /// Count of entries at each level, in label code order.
    pub fn level_counts(&self) -> Vec<(HeadingLabel, usize)> {
        HeadingLabel::ALL
            .iter()
            .filter(|l| l.is_heading())
            .map(|&l| (l, self.outline.iter().filter(|e| e.level == l).count()))
            .collect()
    }
}
