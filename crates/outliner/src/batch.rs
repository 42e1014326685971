//! Directory discovery, bounded parallel processing and atomic output.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;
use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, warn};
use outliner_core::ClassifyError;
use serde::Serialize;

use crate::prelude::{println, *};

/// Counts for a document that went through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Processed {
    pub candidates: usize,
    /// `None` for commands that stop before classification.
    pub headings: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Done(Processed),
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub name: String,
    pub status: Status,
}

/// List the PDFs directly inside `dir`, sorted by file name.
///
/// The extension match is case-insensitive and subdirectories are not
/// searched.
pub fn discover_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .wrap_err_with(|| f!("Failed to read input directory {}", dir.display()))?;

    let mut pdfs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }

    if pdfs.is_empty() {
        return Err(Error::NoInputs(dir.display().to_string()).into());
    }

    pdfs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(pdfs)
}

/// File name without extension, used to name outputs.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Serialize `value` as pretty JSON into `dir/file_name`.
///
/// The JSON goes to a temp file in `dir` first and is renamed into place, so
/// readers see either the previous file or the complete new one.
pub fn write_json_atomic<T: Serialize>(dir: &Path, file_name: &str, value: &T) -> Result<PathBuf> {
    let target = dir.join(file_name);
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .wrap_err_with(|| f!("Failed to create a temp file in {}", dir.display()))?;

    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(&target)
        .map_err(|e| eyre!("Failed to write {}: {}", target.display(), e.error))?;

    Ok(target)
}

/// Run `job` over every input on the blocking pool, at most `jobs` at a time.
///
/// A failing document is logged and reported as skipped. The exception is a
/// [`ClassifyError`]: the scorer disagrees with the feature manifest, so
/// every remaining document would fail the same way and the batch aborts.
/// Reports come back sorted by file name.
pub async fn run_batch<F>(
    inputs: Vec<PathBuf>,
    jobs: usize,
    quiet: bool,
    job: F,
) -> Result<Vec<Report>>
where
    F: Fn(&Path) -> Result<Processed> + Send + Sync + 'static,
{
    let job = Arc::new(job);

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(inputs.len() as u64)
    };
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map_err(|e| eyre!("Invalid progress template: {}", e))?
            .progress_chars("=> "),
    );

    let result: Result<Vec<Report>> = stream::iter(inputs)
        .map(|path| {
            let job = Arc::clone(&job);
            let progress = progress.clone();
            async move {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();

                let status = match tokio::task::spawn_blocking(move || job(&path)).await {
                    Ok(Ok(processed)) => Status::Done(processed),
                    Ok(Err(e)) if is_fatal(&e) => {
                        error!("Aborting batch at {}: {:#}", name, e);
                        return Err(e.wrap_err(f!("Aborted while processing {}", name)));
                    }
                    Ok(Err(e)) => {
                        warn!("Skipping {}: {:#}", name, e);
                        Status::Skipped(f!("{:#}", e))
                    }
                    Err(e) => {
                        warn!("Skipping {}: worker failed: {}", name, e);
                        Status::Skipped(e.to_string())
                    }
                };

                progress.set_message(name.clone());
                progress.inc(1);
                Ok(Report { name, status })
            }
        })
        .buffer_unordered(jobs.max(1))
        .try_collect()
        .await;

    progress.finish_and_clear();
    let mut reports = result?;
    reports.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(reports)
}

fn is_fatal(e: &color_eyre::eyre::Report) -> bool {
    e.downcast_ref::<ClassifyError>().is_some()
}

/// Print one row per document plus processed/skipped totals.
pub fn print_summary(reports: &[Report]) {
    let mut table = new_table();
    table.add_row(prettytable::row![
        "File".bold().cyan(),
        "Status".bold().cyan(),
        "Candidates".bold().cyan(),
        "Headings".bold().cyan(),
        "Reason".bold().cyan()
    ]);

    for report in reports {
        match &report.status {
            Status::Done(p) => {
                let headings = p.headings.map(|h| h.to_string()).unwrap_or_else(|| "-".into());
                table.add_row(prettytable::row![
                    report.name.bright_white(),
                    "done".green(),
                    p.candidates,
                    headings,
                    ""
                ]);
            }
            Status::Skipped(reason) => {
                table.add_row(prettytable::row![
                    report.name.bright_white(),
                    "skipped".red(),
                    "-",
                    "-",
                    reason.bright_black()
                ]);
            }
        }
    }

    table.printstd();

    let skipped = reports
        .iter()
        .filter(|r| matches!(r.status, Status::Skipped(_)))
        .count();
    println!(
        "\n{} processed, {} skipped",
        (reports.len() - skipped).to_string().green().bold(),
        skipped.to_string().yellow().bold()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_discover_matches_pdf_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.PDF");
        touch(dir.path(), "a.pdf");
        touch(dir.path(), "notes.txt");
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("sub"), "c.pdf");

        let names: Vec<String> = discover_pdfs(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.PDF"]);
    }

    #[test]
    fn test_discover_empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "readme.md");
        let err = discover_pdfs(dir.path()).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NoInputs(_))));
    }

    #[test]
    fn test_discover_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_pdfs(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_write_json_atomic_replaces_file_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.json"), b"stale").unwrap();

        let path =
            write_json_atomic(dir.path(), "doc.json", &serde_json::json!({"title": "T"})).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["title"], "T");
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Path::new("/in/report.v2.PDF")), "report.v2");
    }

    #[tokio::test]
    async fn test_run_batch_skips_failures_and_sorts() {
        let inputs = vec![
            PathBuf::from("c.pdf"),
            PathBuf::from("a.pdf"),
            PathBuf::from("b.pdf"),
        ];

        let reports = run_batch(inputs, 2, true, |path: &Path| {
            if path.ends_with("b.pdf") {
                Err(eyre!("cannot open PDF"))
            } else {
                Ok(Processed {
                    candidates: 3,
                    headings: Some(1),
                })
            }
        })
        .await
        .unwrap();

        let names: Vec<&str> = reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf", "c.pdf"]);
        assert!(matches!(reports[0].status, Status::Done(_)));
        assert!(matches!(
            &reports[1].status,
            Status::Skipped(reason) if reason.contains("cannot open")
        ));
    }

    #[tokio::test]
    async fn test_run_batch_aborts_on_feature_schema_mismatch() {
        let inputs = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];

        let err = run_batch(inputs, 1, true, |path: &Path| {
            if path.ends_with("b.pdf") {
                Err(ClassifyError::FeatureSchemaMismatch {
                    expected: 24,
                    got: 23,
                }
                .into())
            } else {
                Ok(Processed {
                    candidates: 1,
                    headings: Some(0),
                })
            }
        })
        .await
        .unwrap_err();

        assert!(err.to_string().contains("b.pdf"));
        assert_eq!(
            err.downcast_ref::<ClassifyError>(),
            Some(&ClassifyError::FeatureSchemaMismatch {
                expected: 24,
                got: 23
            })
        );
    }
}
