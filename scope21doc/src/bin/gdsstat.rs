//!
//! # GDSII Document Statistics CLI
//!
//! Parses a GDSII file through [`scope21doc::parse_gds`] and prints its
//! document statistics, layers, and warnings as JSON.
//!

use clap::Parser;
use serde::Serialize;
use std::error::Error;

use scope21doc::{parse_gds, DocStats, Layer, ParseWarning};

// => The doc-comment on `ProgramOptions` here is displayed by the `clap`-generated help docs =>

/// # GDSII Document Statistics CLI
/// Parses a GDSII file and prints its statistics as JSON.
#[derive(Parser)]
pub struct ProgramOptions {
    /// GDS Input File
    #[arg(short = 'i', long)]
    pub gds: String,
    /// Verbose Output Mode
    #[arg(short, long)]
    pub verbose: bool,
}

/// JSON-serializable program output
#[derive(Serialize)]
struct StatReport {
    library: String,
    complete: bool,
    stats: DocStats,
    layers: Vec<Layer>,
    warnings: Vec<ParseWarning>,
    truncation: Option<String>,
}

/// Main entry point.
/// Reads the input file, parses, and reports.
pub fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let options = ProgramOptions::parse();
    let bytes = std::fs::read(&options.gds)?;
    let outcome = parse_gds(&bytes);
    let report = StatReport {
        library: outcome.document.name.clone(),
        complete: outcome.document.complete,
        stats: outcome.document.stats,
        layers: outcome.document.layers.iter().cloned().collect(),
        warnings: outcome.warnings,
        truncation: outcome.truncation.as_ref().map(|e| e.to_string()),
    };
    if options.verbose {
        for cell in outcome.document.cells_ordered() {
            eprintln!(
                "cell {}: {} polygons, {} instances",
                cell.name,
                cell.polygons.len(),
                cell.instances.len()
            );
        }
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
