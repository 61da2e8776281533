//! Storm patch extraction CLI.
//!
//! Finds persistent storm locations in a series of radar reflectivity
//! frames and crops fixed-size patch series around them. Detection and
//! cropping are separate stages joined by a persisted analysis result, so
//! cropping can be re-run without re-analyzing.

mod commands;
mod preview;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use storm_common::PipelineConfig;

#[derive(Parser, Debug)]
#[command(name = "stormcrop")]
#[command(about = "Storm patch extraction for radar reflectivity series")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find storm centers in sample frames and save the analysis result
    Analyze(StageArgs),

    /// Crop patch series from every frame using a saved analysis result
    Crop(StageArgs),

    /// Run the full pipeline: analyze, then crop
    Process(StageArgs),

    /// Extract .gz archives into the raw frame directory
    Extract(ExtractArgs),
}

#[derive(clap::Args, Debug)]
struct StageArgs {
    /// Directory of frame files
    #[arg(long, default_value = "data/raw")]
    data_dir: PathBuf,

    /// Directory for analysis results, patches, and metadata
    #[arg(long, default_value = "data/patches")]
    output_dir: PathBuf,

    /// Write a preview image of the selected centers (analyze/process)
    #[arg(long)]
    preview: bool,

    /// Fan cropping out across frames (crop/process)
    #[arg(long)]
    parallel: bool,
}

#[derive(clap::Args, Debug)]
struct ExtractArgs {
    /// Directory of downloaded .gz archives
    #[arg(long, default_value = "data/compressed")]
    compressed_dir: PathBuf,

    /// Directory to extract frame files into
    #[arg(long, default_value = "data/raw")]
    data_dir: PathBuf,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = PipelineConfig::from_env();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    match args.command {
        Command::Analyze(stage) => {
            commands::run_analyze(&stage.data_dir, &stage.output_dir, stage.preview, &config)?;
        }
        Command::Crop(stage) => {
            commands::run_crop(&stage.data_dir, &stage.output_dir, stage.parallel, &config)?;
        }
        Command::Process(stage) => {
            commands::run_analyze(&stage.data_dir, &stage.output_dir, stage.preview, &config)?;
            commands::run_crop(&stage.data_dir, &stage.output_dir, stage.parallel, &config)?;
        }
        Command::Extract(extract) => {
            commands::run_extract(&extract.compressed_dir, &extract.data_dir)?;
        }
    }

    Ok(())
}
