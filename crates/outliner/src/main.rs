#![allow(unused)]

use crate::prelude::*;
use clap::Parser;

mod batch;
mod candidates;
mod config;
mod error;
mod lines;
mod manifest;
mod outline;
mod prelude;

#[cfg(test)]
mod fixtures;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Extract a document title and heading outline from PDF files"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// TOML file with [filter], [title], [heuristic] and [batch] settings
    #[clap(long, env = "OUTLINER_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "OUTLINER_VERBOSE", global = true, default_value = "false")]
    verbose: bool,

    /// Hide the progress bar and the summary table.
    #[clap(long, short, global = true, default_value = "false")]
    quiet: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Write a title and outline for every PDF in a directory
    Outline(crate::outline::App),

    /// Write the filtered heading candidates for every PDF in a directory
    Candidates(crate::candidates::App),

    /// Print every extracted line of one PDF
    Lines(crate::lines::App),

    /// Print the feature manifest and label table
    Manifest(crate::manifest::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Outline(sub_app) => crate::outline::run(sub_app, app.global).await,
        SubCommands::Candidates(sub_app) => crate::candidates::run(sub_app, app.global).await,
        SubCommands::Lines(sub_app) => crate::lines::run(sub_app, app.global).await,
        SubCommands::Manifest(sub_app) => crate::manifest::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
