use std::path::PathBuf;

use colored::Colorize;
use outliner_core::filter::candidate_indices;
use outliner_core::tagger::PosTagger;
use outliner_core::LineRecord;

use crate::config::Config;
use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "lines")]
#[command(about = "Print every extracted line of a PDF with its layout attributes")]
pub struct App {
    /// Path to the PDF file
    pub path: PathBuf,

    /// Standard deviations above the page's mean font size a candidate must reach
    #[arg(short = 'z', long = "z-score")]
    pub z: Option<f64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Each line paired with whether it survives the candidate filter.
pub fn mark_candidates(lines: Vec<LineRecord>, config: &Config) -> Vec<(LineRecord, bool)> {
    let mut marks = vec![false; lines.len()];
    for i in candidate_indices(&lines, &config.filter) {
        marks[i] = true;
    }
    lines.into_iter().zip(marks).collect()
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let config = Config::load(global.config.as_deref())?.with_overrides(app.z, false, None);
    let document = pdf::PdfDocument::open(&app.path)
        .wrap_err_with(|| f!("Failed to open {}", app.path.display()))?;
    let lines = document.line_records(&PosTagger::new());

    if app.json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
        return Ok(());
    }

    println!(
        "\n{} lines on {} pages:\n",
        lines.len().to_string().bold(),
        document.page_count().to_string().bold()
    );

    let mut table = new_table();
    table.add_row(prettytable::row![
        "Page".bold().cyan(),
        "Top".bold().cyan(),
        "Size".bold().cyan(),
        "Bold".bold().cyan(),
        "Candidate".bold().cyan(),
        "Text".bold().cyan()
    ]);

    for (line, is_candidate) in mark_candidates(lines, &config) {
        let candidate = if is_candidate {
            "yes".green().bold().to_string()
        } else {
            "".to_string()
        };
        let text = if is_candidate {
            line.text.bright_white().to_string()
        } else {
            line.text.bright_black().to_string()
        };

        table.add_row(prettytable::row![
            line.page,
            f!("{:.2}", line.line_top),
            f!("{:.2}", line.font_size),
            if line.bold { "yes" } else { "" },
            candidate,
            text
        ]);
    }

    table.printstd();

    Ok(())
}
