#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for loading accident data without a map.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use accident_map_accident_models::{AccidentType, SeverityType};
use accident_map_cli_utils::IndicatifProgress;
use accident_map_ingest::{
    AccidentMap, DATA_URL_ENV, data_location, local, requested_years, summarize,
    unfallatlas_layer,
};
use accident_map_layers::{MarkerLayers, SourceRegistry};
use accident_map_source::catalog::UnfallatlasCatalog;
use accident_map_source::local::GeoJsonContainer;
use accident_map_source::source_def::FetcherConfig;
use accident_map_source::transport::{Transport, from_location};
use accident_map_source_models::DataSource;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "accident_map_ingest", about = "Accident data loading tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the local accident container and print counts per category
    Local {
        /// `GeoJSON` feature collection to load (defaults to the configured
        /// container path)
        #[arg(long)]
        file: Option<PathBuf>,
        /// Layer holding the accident features (defaults to the configured
        /// layer)
        #[arg(long)]
        layer: Option<String>,
    },
    /// Load Unfallatlas years through the load orchestrator
    Unfallatlas {
        /// Base URL or directory of the data files (overrides
        /// `ACCIDENT_MAP_DATA_URL`)
        #[arg(long)]
        data: Option<String>,
        /// Comma-separated years to load (overrides `ACCIDENT_MAP_YEARS`).
        /// If not specified, all available years are loaded.
        #[arg(long)]
        years: Option<String>,
    },
    /// List the Unfallatlas years available at a data location
    Years {
        /// Base URL or directory of the data files (overrides
        /// `ACCIDENT_MAP_DATA_URL`)
        #[arg(long)]
        data: Option<String>,
    },
}

fn transport(data: Option<String>) -> Result<Arc<dyn Transport>, String> {
    let location = data_location(data)
        .ok_or_else(|| format!("No data location: pass --data or set {DATA_URL_ENV}"))?;
    Ok(Arc::from(from_location(&location)))
}

fn print_categories(registry: &SourceRegistry) {
    let mut accident_types: BTreeMap<AccidentType, usize> = BTreeMap::new();
    let mut severity_types: BTreeMap<SeverityType, usize> = BTreeMap::new();
    for marker in registry.render_group().snapshot() {
        *accident_types.entry(marker.accident_type()).or_default() += 1;
        *severity_types.entry(marker.severity_type()).or_default() += 1;
    }

    println!("{:<28} COUNT", "ACCIDENT TYPE");
    println!("{}", "-".repeat(40));
    for (accident_type, count) in &accident_types {
        println!("{:<28} {count}", accident_type.to_string());
    }
    println!();
    println!("{:<28} COUNT", "SEVERITY");
    println!("{}", "-".repeat(40));
    for (severity_type, count) in &severity_types {
        println!("{:<28} {count}", severity_type.to_string());
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = accident_map_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Local { file, layer } => {
            let definition = accident_map_source::registry::source(DataSource::Local);
            let (default_path, default_layer) = match definition.fetcher {
                FetcherConfig::Container { path, layer } => (path, layer),
                FetcherConfig::YearlyCsv(_) => {
                    return Err(format!("{} is not a container source", definition.name).into());
                }
            };
            let file = file.unwrap_or_else(|| PathBuf::from(default_path));
            let layer = layer.unwrap_or(default_layer);

            let start = Instant::now();
            let container = GeoJsonContainer::open(&file).await?;
            let layers = MarkerLayers::new();
            let registry = layers.registry(DataSource::Local);
            let result = local::try_load_local(&container, &layer, registry)?;

            log::info!(
                "Local load complete: {} markers, {} skipped in {:.1}s",
                result.marker_count,
                result.skipped,
                start.elapsed().as_secs_f64()
            );
            println!("{}", serde_json::to_string_pretty(&result)?);
            print_categories(registry);
        }
        Commands::Unfallatlas { data, years } => {
            let layers = MarkerLayers::new();
            let mut unfallatlas = unfallatlas_layer(transport(data)?, &layers);
            if let Some(years) = requested_years(years) {
                unfallatlas = unfallatlas.with_years(years);
            }
            unfallatlas.set_progress(IndicatifProgress::steps_bar(&multi, "Unfallatlas"));
            let map = AccidentMap::with_layers(layers, unfallatlas);

            let start = Instant::now();
            map.switch().set_data_source(DataSource::Unfallatlas);
            map.unfallatlas().wait_until_idle().await;

            log::info!(
                "Unfallatlas load finished in {:.1}s",
                start.elapsed().as_secs_f64()
            );
            if let Some(outcome) = map.unfallatlas().last_outcome() {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
            let registry = map.layers().registry(DataSource::Unfallatlas);
            println!("{}", serde_json::to_string_pretty(&summarize(registry))?);
            print_categories(registry);
        }
        Commands::Years { data } => {
            let definition = accident_map_source::registry::source(DataSource::Unfallatlas);
            let config = definition
                .yearly_csv()
                .cloned()
                .ok_or_else(|| format!("{} is not a yearly CSV source", definition.name))?;
            let catalog = UnfallatlasCatalog::new(transport(data)?, config);
            for year in &catalog.available_years().await {
                println!("{year}");
            }
        }
    }

    Ok(())
}
