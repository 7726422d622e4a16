//! Combined field dataset inspector.
//!
//! Builds a dataset tree from a YAML description and prints:
//! - The tree of combinators and leaves
//! - The composed shape, variables and grids
//! - The spatial extent of the composed points
//! - Forecast metadata for every record
//! - Optionally, the values selected by one index

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use field_common::BoundingBox;
use field_views::{Dataset, Index};

use config::{build_request, load_config, ForecastConfig};

/// Print at most this many values of a read.
const MAX_PRINTED_VALUES: usize = 64;

#[derive(Parser, Debug)]
#[command(name = "field-inspect")]
#[command(about = "Build a combined field dataset from a YAML description and inspect it")]
struct Args {
    /// Dataset description (YAML)
    #[arg(env = "FIELD_INSPECT_CONFIG")]
    config: PathBuf,

    /// Index to read, e.g. "0, :, 0, :" or "2:6"
    #[arg(long)]
    read: Option<String>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.json {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }

    info!(config = ?args.config, "Starting field-inspect");

    let config = load_config(&args.config)?;
    let (dataset, subset) = build_request(&config.combine, &config.datasets)?;

    print_summary(dataset.as_ref());
    if !subset.is_empty() {
        println!("\nSubset options (not applied):");
        for (key, value) in &subset {
            println!("  {} = {}", key, value);
        }
    }

    print_forecast(dataset.as_ref(), &config.forecast)?;

    if let Some(text) = &args.read {
        let index: Index = text
            .parse()
            .with_context(|| format!("Invalid index '{}'", text))?;
        print_read(dataset.as_ref(), &index)?;
    }

    Ok(())
}

fn print_summary(dataset: &dyn Dataset) {
    println!("{}", dataset.tree());
    println!("Shape:      {:?}", dataset.shape());
    println!("Variables:  {}", dataset.variables().join(", "));
    println!(
        "Resolution: {}",
        dataset.resolution().unwrap_or_else(|| "mixed".to_string())
    );

    match dataset.grids() {
        Ok(grids) => println!("Grids:      {:?}", grids),
        Err(e) => println!("Grids:      unavailable ({})", e),
    }

    match BoundingBox::from_points(&dataset.latitudes(), &dataset.longitudes()) {
        Some(bbox) => println!(
            "Extent:     lon {} .. {}, lat {} .. {}",
            bbox.min_lon, bbox.max_lon, bbox.min_lat, bbox.max_lat
        ),
        None => println!("Extent:     no points"),
    }
}

fn print_forecast(dataset: &dyn Dataset, forecast: &ForecastConfig) -> Result<()> {
    let layout = forecast.layout()?;
    println!("\nRecords ({:?}):", layout);

    for (i, valid) in dataset.dates().iter().enumerate() {
        let meta = layout
            .fill(*valid, forecast.step(), forecast.base)
            .with_context(|| format!("Record {} ({})", i, valid))?;
        match meta {
            Some(meta) => println!(
                "  {:>4}  {}  date={} time={} step={}",
                i,
                valid.to_rfc3339(),
                meta.date,
                meta.time,
                meta.step
            ),
            None => println!("  {:>4}  {}", i, valid.to_rfc3339()),
        }
    }

    Ok(())
}

fn print_read(dataset: &dyn Dataset, index: &Index) -> Result<()> {
    let values = dataset
        .get(index)
        .with_context(|| format!("Failed to read {}", index))?;

    println!("\nRead {} -> shape {:?}", index, values.shape());
    if values.is_empty() {
        return Ok(());
    }

    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64;
    println!("  min={} max={} mean={:.3}", min, max, mean);

    if values.len() <= MAX_PRINTED_VALUES {
        println!("{}", values);
    }

    Ok(())
}
