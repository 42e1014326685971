//! Multiline merger.
//!
//! Headings that wrap across several physical lines come out of the filter as
//! separate candidates. Adjacent candidates whose discrete attributes match
//! exactly (see [`LineRecord::merge_key`]) are coalesced into one.

use crate::record::LineRecord;

/// Merge runs of adjacent candidates sharing the same merge key.
///
/// Input is stably sorted by `(page, line_top)` first. A merged candidate
/// joins texts with a single space, sums `length` and `num_words`, and spans
/// the union of the vertical extents. Every other attribute keeps the value
/// of the first line in the run.
pub fn merge_multiline(candidates: Vec<LineRecord>) -> Vec<LineRecord> {
    let mut sorted = candidates;
    sorted.sort_by(|a, b| {
        a.page
            .cmp(&b.page)
            .then_with(|| a.line_top.total_cmp(&b.line_top))
    });

    let mut merged = Vec::with_capacity(sorted.len());
    let mut iter = sorted.into_iter();
    let Some(mut current) = iter.next() else {
        return merged;
    };

    for next in iter {
        if current.merge_key() == next.merge_key() {
            current.text.push(' ');
            current.text.push_str(&next.text);
            current.length += next.length;
            current.num_words += next.num_words;
            current.line_top = current.line_top.min(next.line_top);
            current.line_bottom = current.line_bottom.max(next.line_bottom);
        } else {
            merged.push(std::mem::replace(&mut current, next));
        }
    }
    merged.push(current);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::record;

    #[test]
    fn test_merges_matching_adjacent_lines() {
        let out = merge_multiline(vec![
            record("Understanding the Foundation", 18.0, true, 0, 40.0),
            record("Level Extensions", 18.0, true, 0, 60.0),
        ]);
        assert_eq!(out.len(), 1);
        let m = &out[0];
        assert_eq!(m.text, "Understanding the Foundation Level Extensions");
        assert_eq!(m.length, 28 + 16);
        assert_eq!(m.num_words, 5);
        assert_eq!(m.line_top, 40.0);
        assert_eq!(m.line_bottom, 78.0);
    }

    #[test]
    fn test_different_attributes_do_not_merge() {
        let out = merge_multiline(vec![
            record("Overview", 18.0, true, 0, 40.0),
            record("Details", 16.0, true, 0, 60.0),
            record("More details", 16.0, false, 0, 80.0),
        ]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_page_boundary_blocks_merge() {
        let out = merge_multiline(vec![
            record("Chapter Two", 18.0, true, 1, 40.0),
            record("Chapter Three", 18.0, true, 2, 40.0),
        ]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_sorts_by_page_then_top_before_merging() {
        let out = merge_multiline(vec![
            record("second half", 14.0, false, 0, 60.0),
            record("Other page", 14.0, true, 1, 10.0),
            record("first half", 14.0, false, 0, 40.0),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "first half second half");
        assert_eq!(out[1].text, "Other page");
    }

    #[test]
    fn test_merged_runs_share_attribute_tuple() {
        let inputs = vec![
            record("One", 12.0, true, 0, 10.0),
            record("Two", 12.0, true, 0, 20.0),
            record("THREE", 12.0, true, 0, 30.0),
            record("FOUR", 12.0, true, 0, 40.0),
            record("five", 12.0, true, 0, 50.0),
        ];
        let out = merge_multiline(inputs.clone());
        let texts: Vec<&str> = out.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["One Two", "THREE FOUR", "five"]);

        // Each merged record's parts all share the first part's key.
        let mut i = 0;
        for merged in &out {
            let parts = merged.text.split(' ').count();
            let key = inputs[i].merge_key();
            assert!(inputs[i..i + parts].iter().all(|r| r.merge_key() == key));
            i += parts;
        }
    }

    #[test]
    fn test_keeps_first_line_attributes() {
        let mut second = record("Wrapped tail", 14.0, true, 0, 30.0);
        second.indent = 144.0;
        second.spacing_after = Some(9.0);
        let out = merge_multiline(vec![record("Heading start", 14.0, true, 0, 10.0), second]);
        assert_eq!(out[0].indent, 72.0);
        assert_eq!(out[0].spacing_after, Some(0.0));
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_multiline(Vec::new()).is_empty());
    }
}
