//! Core library for outliner
//!
//! This crate implements the **Functional Core** of the outliner heading
//! extractor, following the Functional Core - Imperative Shell architectural
//! pattern.
//!
//! # Architecture Overview
//!
//! The outliner project splits into three crates:
//!
//! - **`outliner_core`** (this crate): Pure transformation functions with zero I/O
//! - **`pdf`**: Reads PDF content streams into per-line geometry
//! - **`outliner`**: File I/O, batching, and the CLI (the Imperative Shell)
//!
//! ## Pipeline
//!
//! ```text
//! LineGeometry ──► LineRecord ──► filter ──► merge ──► Classifier ──► Outline
//!   (pdf crate)     record.rs    filter.rs  merge.rs  classify.rs   outline.rs
//! ```
//!
//! Every stage consumes a collection and returns a new one; nothing mutates an
//! earlier stage's output.
//!
//! # Module Organization
//!
//! - [`text`]: Text normalization and per-line string statistics
//! - [`tagger`]: Owned part-of-speech tagger and per-line category counts
//! - [`record`]: Line records, spacing pass, page assembly
//! - [`features`]: The frozen feature manifest shared with training
//! - [`filter`]: Per-page statistical candidate filter
//! - [`merge`]: Multiline heading merger
//! - [`label`]: Canonical heading label table
//! - [`model`]: Model artifact loading, validation, and inference
//! - [`classify`]: Scorers and the outline-building classifier
//! - [`pipeline`]: Stage composition
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use outliner_core::classify::{Classifier, HeuristicConfig, TitleConfig};
//! use outliner_core::filter::FilterConfig;
//! use outliner_core::record::{build_page_records, LineGeometry};
//! use outliner_core::tagger::PosTagger;
//!
//! let tagger = PosTagger::new();
//! let lines = build_page_records(&page_geometry, 0, &tagger);
//!
//! let classifier = Classifier::heuristic(HeuristicConfig::default(), TitleConfig::default());
//! let outline = outliner_core::pipeline::outline(&lines, &FilterConfig::default(), &classifier)?;
//! println!("{}", serde_json::to_string_pretty(&outline)?);
//! ```

pub mod classify;
pub mod error;
pub mod features;
pub mod filter;
pub mod label;
pub mod merge;
pub mod model;
pub mod outline;
pub mod pipeline;
pub mod record;
pub mod tagger;
pub mod text;

pub use error::{ClassifyError, ModelError, TagError};
pub use label::HeadingLabel;
pub use outline::{Outline, OutlineEntry};
pub use record::{LineGeometry, LineRecord};
