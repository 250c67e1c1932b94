#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for extracting one federal state from raw Unfallatlas
//! exports.

use std::path::PathBuf;

use accident_map_cli_utils::IndicatifProgress;
use accident_map_extract::bundesland::resolve_code;
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "accident_map_extract",
    about = "Filter raw Unfallatlas CSV files down to one federal state"
)]
struct Cli {
    /// Bundesland name or 2-digit ULAND code
    #[arg(long, default_value = "baden-wuerttemberg")]
    bundesland: String,
    /// Directory with the raw CSV files
    #[arg(long = "source-dir", default_value = "data/unfallatlas-raw")]
    source_dir: PathBuf,
    /// Directory for the filtered CSV files
    #[arg(long = "target-dir", default_value = "data/unfallatlas")]
    target_dir: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = accident_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let code = resolve_code(&cli.bundesland)?;
    let progress = IndicatifProgress::steps_bar(&multi, "Extracting");
    accident_map_extract::run(&cli.source_dir, &cli.target_dir, &code, progress.as_ref())?;

    Ok(())
}
