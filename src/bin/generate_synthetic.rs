//! Synthetic regional dataset generator
//!
//! Writes the seeded mobility, spending and demographic tables the
//! segmentation pipeline runs on, as CSV files.
//!
//! Usage:
//!   cargo run --release --bin generate_synthetic -- [OPTIONS]
//!
//! Options:
//!   --seed <N>           Random seed (default: 42)
//!   --regions <CODES>    Comma-separated FIPS codes (default: all seven)
//!   --output-dir <PATH>  Output directory (default: data/synthetic)

use anyhow::{Context, Result};
use clap::Parser;
use mobility_segments::config::DEFAULT_SEED;
use mobility_segments::export::write_dataset_csv;
use mobility_segments::generators::generate_dataset;
use mobility_segments::regions::{check_region_codes, default_region_codes, get_region_short};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "generate_synthetic")]
#[command(about = "Generate synthetic regional mobility, spending and demographic data")]
struct Args {
    /// Random seed for reproducibility
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Region FIPS codes to generate
    #[arg(long, value_delimiter = ',')]
    regions: Option<Vec<String>>,

    /// Directory for mobility.csv, spending.csv and demographics.csv
    #[arg(long, default_value = "data/synthetic")]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let regions = args.regions.unwrap_or_else(default_region_codes);
    check_region_codes(&regions).context("checking requested regions")?;

    println!("🏭 Generating synthetic data (seed {})", args.seed);
    let short: Vec<String> = regions.iter().map(|c| get_region_short(c)).collect();
    println!("   Regions: {}", short.join(", "));

    let mut rng = StdRng::seed_from_u64(args.seed);
    let dataset = generate_dataset(&regions, &mut rng).context("generating dataset")?;

    let files = write_dataset_csv(&dataset, &args.output_dir)
        .with_context(|| format!("writing CSV files to {:?}", args.output_dir))?;
    info!("Export finished");

    println!("\n✅ Wrote:");
    println!("   {:?} ({} rows)", files.mobility, dataset.mobility.len());
    println!("   {:?} ({} rows)", files.spending, dataset.spending.len());
    println!("   {:?} ({} rows)", files.demographics, dataset.demographics.len());

    Ok(())
}
