//! Command-line front end.
//!
//! ```text
//! # Assign the drivers in drivers.txt to the addresses in addresses.txt
//! assignment-solver addresses.txt drivers.txt
//!
//! # JSON output for scripting
//! assignment-solver addresses.txt drivers.txt --format json
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::info;

use crate::score::SuitabilityScore;
use crate::solver::{solve, Solution};

#[derive(Parser)]
#[command(name = "assignment-solver")]
#[command(version)]
#[command(about = "Assign delivery addresses to drivers, maximizing total suitability")]
pub struct Cli {
    /// File with one delivery address per line
    pub addresses: PathBuf,

    /// File with one driver name per line
    pub drivers: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct Report<'a> {
    total_score: f64,
    assignments: Vec<ReportEntry<'a>>,
}

#[derive(Serialize)]
struct ReportEntry<'a> {
    address: &'a str,
    driver: &'a str,
    score: f64,
}

/// Reads newline-delimited entries. Blank lines are kept; a trailing newline does
/// not add an entry.
pub fn read_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(contents.lines().map(str::to_owned).collect())
}

/// Execute the assignment
///
/// # Errors
///
/// Returns an error if either file cannot be read or the solver fails.
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let addresses = read_lines(&cli.addresses)?;
    let drivers = read_lines(&cli.drivers)?;
    info!(
        addresses = addresses.len(),
        drivers = drivers.len(),
        "loaded inputs"
    );

    let solution = solve(&addresses, &drivers, &SuitabilityScore)
        .context("Failed to compute an assignment")?;

    match cli.format {
        OutputFormat::Text => print_text(&solution),
        OutputFormat::Json => print_json(&solution)?,
    }

    Ok(())
}

fn print_text(solution: &Solution<'_, String, String, f64>) {
    println!("The sum of the scores is {:.2}", solution.score);
    for (address, driver) in solution.pairs() {
        println!("Address {address} assigned to driver {driver}");
    }
}

fn print_json(solution: &Solution<'_, String, String, f64>) -> anyhow::Result<()> {
    let report = Report {
        total_score: solution.score,
        assignments: solution
            .pairs()
            .map(|(address, driver)| ReportEntry {
                address,
                driver,
                score: SuitabilityScore::suitability(address, driver),
            })
            .collect(),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
