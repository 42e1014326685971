use std::path::{Path, PathBuf};

use log::info;
use outliner_core::classify::Classifier;
use outliner_core::filter::FilterConfig;
use outliner_core::model::ModelArtifact;
use outliner_core::pipeline;
use outliner_core::tagger::PosTagger;

use crate::batch::{self, Processed};
use crate::config::Config;
use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "outline")]
#[command(about = "Extract a title and heading outline from every PDF in a directory")]
pub struct App {
    /// Directory holding the input PDFs
    pub input_dir: PathBuf,

    /// Directory receiving one <stem>.json per PDF
    pub output_dir: PathBuf,

    /// Model artifact (JSON). Without it, a font-size heuristic labels candidates
    #[arg(long, env = "OUTLINER_MODEL")]
    pub model: Option<PathBuf>,

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

/// Build the classifier once, before any document is read.
///
/// A model artifact is validated here, so a schema mismatch aborts the run.
pub fn load_classifier(model: Option<&Path>, config: &Config) -> Result<Classifier> {
    let Some(path) = model else {
        return Ok(Classifier::heuristic(
            config.heuristic.clone(),
            config.title.clone(),
        ));
    };

    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| f!("Failed to read model artifact {}", path.display()))?;
    let artifact = ModelArtifact::from_json(&raw)
        .wrap_err_with(|| f!("Invalid model artifact {}", path.display()))?;

    Ok(Classifier::from_model(artifact, config.title.clone()))
}

/// Run the full pipeline on one PDF and write `<stem>.json`.
pub fn outline_document(
    path: &Path,
    output_dir: &Path,
    tagger: &PosTagger,
    filter: &FilterConfig,
    classifier: &Classifier,
) -> Result<Processed> {
    let document = pdf::PdfDocument::open(path)?;
    let lines = document.line_records(tagger);
    let candidates = pipeline::candidates(&lines, filter);
    let outline = classifier.build_outline(&candidates)?;

    batch::write_json_atomic(output_dir, &f!("{}.json", batch::file_stem(path)), &outline)?;

    info!(
        "{}: {} candidates, {} outline entries",
        path.display(),
        candidates.len(),
        outline.len()
    );

    Ok(Processed {
        candidates: candidates.len(),
        headings: Some(outline.len()),
    })
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let config = Config::load(global.config.as_deref())?.with_overrides(
        app.z,
        app.keep_repeated,
        app.jobs,
    );
    let classifier = load_classifier(app.model.as_deref(), &config)?;
    let inputs = batch::discover_pdfs(&app.input_dir)?;
    std::fs::create_dir_all(&app.output_dir)
        .wrap_err_with(|| f!("Failed to create output directory {}", app.output_dir.display()))?;

    if global.verbose {
        println!("Documents: {}", inputs.len());
        println!("Jobs: {}", config.batch.jobs());
        println!("Scorer features: {:?}", classifier.feature_keys());
        println!();
    }

    let tagger = PosTagger::new();
    let filter = config.filter.clone();
    let output_dir = app.output_dir.clone();

    let reports = batch::run_batch(inputs, config.batch.jobs(), global.quiet, move |path| {
        outline_document(path, &output_dir, &tagger, &filter, &classifier)
    })
    .await?;

    if !global.quiet {
        batch::print_summary(&reports);
    }

    Ok(())
}
