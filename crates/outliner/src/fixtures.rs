//! PDFs written to disk for command tests.

use std::path::Path;

use pdf::fixtures::{pdf_with_pages, text_ops};

/// One line of text: font resource (`F1` regular, `F2` bold), size, baseline, text.
pub type Line<'a> = (&'a str, f32, f32, &'a str);

/// Write a Letter-sized PDF with one page per slice of lines, all at x = 72.
pub fn write_pdf(path: &Path, pages: &[Vec<Line>]) {
    let pages: Vec<_> = pages
        .iter()
        .map(|lines| {
            lines
                .iter()
                .flat_map(|&(font, size, y, text)| text_ops(font, size, 72.0, y, text))
                .collect::<Vec<_>>()
        })
        .collect();
    std::fs::write(path, pdf_with_pages(&pages)).unwrap();
}

/// A two-page report: a bold title over body text, then a numbered section.
pub fn report() -> Vec<Vec<Line<'static>>> {
    const BODY: [&str; 8] = [
        "The working group met twice during the year.",
        "Members reviewed the proposals in detail.",
        "Several changes were accepted for release.",
        "Others were deferred to a later meeting.",
        "The budget remained within its limits.",
        "Travel costs were lower than expected.",
        "A new chair will be elected in spring.",
        "Minutes are available from the secretary.",
    ];

    let mut first = vec![("F2", 24.0, 720.0, "Annual Working Group Report")];
    let mut second = vec![("F2", 16.0, 720.0, "1. Introduction")];
    for (i, text) in BODY.iter().enumerate() {
        first.push(("F1", 10.0, 680.0 - i as f32 * 14.0, *text));
        second.push(("F1", 10.0, 690.0 - i as f32 * 14.0, *text));
    }
    vec![first, second]
}
