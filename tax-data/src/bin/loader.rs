use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tax_core::calculations::common::{format_dollars, format_percent};
use tax_data::TaxTableLoader;
use tracing_subscriber::EnvFilter;

/// Validate bracket tables stored as CSV and print a summary.
///
/// The brackets file has the columns:
/// - tax_year: The tax year (e.g., 2024)
/// - schedule: The IRS schedule code (X, Y-1, Y-2, Z)
/// - min_income: Lower edge of the bracket
/// - max_income: Upper edge (empty for unbounded)
/// - rate: The marginal tax rate as a decimal (e.g., 0.10)
///
/// The deductions file has the columns tax_year, filing_status, amount.
#[derive(Parser, Debug)]
#[command(name = "tax-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing bracket data
    #[arg(short, long)]
    brackets: PathBuf,

    /// Path to the CSV file containing standard deductions
    #[arg(short, long)]
    deductions: PathBuf,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    println!(
        "Loading tax tables from: {} and {}",
        args.brackets.display(),
        args.deductions.display()
    );

    let tables = TaxTableLoader::load_files(&args.brackets, &args.deductions)
        .context("Failed to load tax tables")?;

    for table in tables.iter() {
        let top_rate = table
            .brackets()
            .last()
            .map(|bracket| format_percent(bracket.rate))
            .unwrap_or_default();
        println!(
            "  {} {:<26} {} brackets, top rate {}, standard deduction {}",
            table.tax_year(),
            table.filing_status().label(),
            table.brackets().len(),
            top_rate,
            format_dollars(table.standard_deduction())
        );
    }

    println!("Successfully validated {} tax tables.", tables.len());

    Ok(())
}
