//! PDF geometry extraction.
//!
//! Reads each page's content stream through [`lopdf`], reconstructs visual
//! lines with their font size, weight and top-down position, and hands them
//! to [`outliner_core::record::build_page_records`] to become
//! [`LineRecord`]s.

use std::path::Path;

use log::{debug, warn};
use outliner_core::record::{build_page_records, LineGeometry, LineRecord};
use outliner_core::tagger::PosTagger;
use thiserror::Error;

use parser::backend::{LopdfBackend, PdfBackend};

pub mod cleanup;
pub mod parser;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("cannot open PDF: {0}")]
    Open(String),
    #[error("document is encrypted")]
    Encrypted,
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PdfError {
    /// True when the document could not be opened at all, as opposed to a
    /// failure while reading one of its pages.
    pub fn is_open_failure(&self) -> bool {
        matches!(self, PdfError::Open(_) | PdfError::Encrypted | PdfError::Io(_))
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// An opened PDF, ready for line extraction.
pub struct PdfDocument {
    backend: LopdfBackend,
}

impl PdfDocument {
    /// Parse PDF bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        Ok(Self {
            backend: LopdfBackend::load_bytes(bytes)?,
        })
    }

    /// Read and parse a PDF file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn page_count(&self) -> usize {
        self.backend.page_count()
    }

    /// Visual lines of every page, top to bottom, indexed by 0-based page.
    ///
    /// A page whose content stream cannot be decoded contributes no lines.
    pub fn page_geometry(&self) -> Vec<Vec<LineGeometry>> {
        self.backend
            .pages()
            .values()
            .enumerate()
            .map(|(index, &page_id)| {
                parser::layout::page_geometry(&self.backend, page_id).unwrap_or_else(|e| {
                    warn!("skipping page {}: {}", index, e);
                    Vec::new()
                })
            })
            .collect()
    }

    /// Line records for the whole document, ordered by page and then top to
    /// bottom.
    pub fn line_records(&self, tagger: &PosTagger) -> Vec<LineRecord> {
        let records: Vec<LineRecord> = self
            .page_geometry()
            .iter()
            .enumerate()
            .flat_map(|(page, lines)| build_page_records(lines, page, tagger))
            .collect();
        debug!("extracted {} line records from {} pages", records.len(), self.page_count());
        records
    }
}

/// Parse PDF bytes and extract their line records in one step.
pub fn extract_line_records(bytes: &[u8], tagger: &PosTagger) -> Result<Vec<LineRecord>, PdfError> {
    Ok(PdfDocument::from_bytes(bytes)?.line_records(tagger))
}

#[cfg(test)]
mod tests {
    use lopdf::content::Operation;

    use super::*;
    use crate::fixtures::{pdf_with_pages, text_ops};

    fn page(lines: &[(&str, f32, f32, &str)]) -> Vec<Operation> {
        lines
            .iter()
            .flat_map(|&(font, size, y, text)| text_ops(font, size, 72.0, y, text))
            .collect()
    }

    #[test]
    fn test_extracts_records_in_page_order() {
        let bytes = pdf_with_pages(&[
            page(&[
                ("F2", 18.0, 720.0, "INTRODUCTION"),
                ("F1", 10.0, 690.0, "This chapter explains the scope."),
            ]),
            page(&[("F1", 10.0, 700.0, "Second page body.")]),
        ]);

        let records = extract_line_records(&bytes, &PosTagger::new()).unwrap();
        assert_eq!(records.len(), 3);

        let heading = &records[0];
        assert_eq!(heading.text, "INTRODUCTION");
        assert_eq!(heading.font_size, 18.0);
        assert!(heading.bold);
        assert!(heading.is_upper);
        assert!(heading.first_page);
        assert_eq!(heading.page, 0);
        assert_eq!(heading.spacing_before, Some(0.0));

        assert!(!records[1].bold);
        assert_eq!(records[2].page, 1);
        assert!(!records[2].first_page);
        assert_eq!(records[2].spacing_after, Some(0.0));
    }

    #[test]
    fn test_spacing_between_lines() {
        // Line 1 bottom: 792 - (720 - 2) = 74. Line 2 top: 792 - (700 + 8) = 84.
        let bytes = pdf_with_pages(&[page(&[
            ("F1", 10.0, 720.0, "First line"),
            ("F1", 10.0, 700.0, "Second line"),
        ])]);

        let records = extract_line_records(&bytes, &PosTagger::new()).unwrap();
        assert_eq!(records[0].spacing_after, Some(10.0));
        assert_eq!(records[1].spacing_before, Some(10.0));
        assert_eq!(records[1].line_top, 84.0);
    }

    #[test]
    fn test_lines_without_alphanumerics_are_dropped() {
        let bytes = pdf_with_pages(&[page(&[
            ("F1", 10.0, 720.0, "-----"),
            ("F1", 10.0, 700.0, "Real text"),
        ])]);

        let records = extract_line_records(&bytes, &PosTagger::new()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "Real text");
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let bytes = pdf_with_pages(&[page(&[
            ("F2", 16.0, 720.0, "1. Overview"),
            ("F1", 10.0, 690.0, "Body text."),
        ])]);

        let tagger = PosTagger::new();
        let first = serde_json::to_string(&extract_line_records(&bytes, &tagger).unwrap()).unwrap();
        let second =
            serde_json::to_string(&extract_line_records(&bytes, &tagger).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_garbage_is_an_open_failure() {
        let err = extract_line_records(b"%PDF-1.5 truncated", &PosTagger::new()).unwrap_err();
        assert!(err.is_open_failure());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = PdfDocument::open(dir.path().join("missing.pdf"));
        assert!(matches!(result, Err(PdfError::Io(_))));
    }

    #[test]
    fn test_empty_page_yields_no_lines() {
        let bytes = pdf_with_pages(&[vec![]]);
        let doc = PdfDocument::from_bytes(&bytes).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.page_geometry(), vec![Vec::<LineGeometry>::new()]);
    }
}
