use std::path::{Path, PathBuf};

use log::info;
use outliner_core::filter::FilterConfig;
use outliner_core::pipeline;
use outliner_core::tagger::PosTagger;

use crate::batch::{self, Processed};
use crate::config::Config;
use crate::prelude::*;

#[derive(Debug, clap::Parser)]
#[command(name = "candidates")]
#[command(about = "Write filtered and merged heading candidates for every PDF in a directory")]
pub struct App {
    /// Directory holding the input PDFs
    pub input_dir: PathBuf,

    /// Directory receiving one <stem>_raw.json per PDF
    pub output_dir: PathBuf,

    /// Standard deviations above the page's mean font size a candidate must reach
    #[arg(short = 'z', long = "z-score")]
    pub z: Option<f64>,

    /// Keep lines that repeat at the same position across pages
    #[arg(long)]
    pub keep_repeated: bool,

    /// Number of documents processed at once
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

/// Extract, filter and merge one PDF, then write its candidate records.
pub fn dump_candidates(
    path: &Path,
    output_dir: &Path,
    tagger: &PosTagger,
    filter: &FilterConfig,
) -> Result<Processed> {
    let lines = pdf::PdfDocument::open(path)?.line_records(tagger);
    let candidates = pipeline::candidates(&lines, filter);

    batch::write_json_atomic(
        output_dir,
        &f!("{}_raw.json", batch::file_stem(path)),
        &candidates,
    )?;

    info!("{}: {} candidates", path.display(), candidates.len());

    Ok(Processed {
        candidates: candidates.len(),
        headings: None,
    })
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let config = Config::load(global.config.as_deref())?.with_overrides(
        app.z,
        app.keep_repeated,
        app.jobs,
    );
    let inputs = batch::discover_pdfs(&app.input_dir)?;
    std::fs::create_dir_all(&app.output_dir)
        .wrap_err_with(|| f!("Failed to create output directory {}", app.output_dir.display()))?;

    let tagger = PosTagger::new();
    let filter = config.filter.clone();
    let output_dir = app.output_dir.clone();

    let reports = batch::run_batch(inputs, config.batch.jobs(), global.quiet, move |path| {
        dump_candidates(path, &output_dir, &tagger, &filter)
    })
    .await?;

    if !global.quiet {
        batch::print_summary(&reports);
    }

    Ok(())
}
