use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tax_core::source::BracketSource;
use tax_data::{BracketLoader, FileBracketSource};

/// Convert bracket CSV data into per-year bracket documents.
///
/// The CSV file should have the following columns:
/// - tax_year: The tax year (e.g., 2025)
/// - filing_status: A status name (single, married_jointly, ...) or an IRS
///   schedule code (X, Y-1, Y-2, Z)
/// - rate: The marginal tax rate as a decimal (e.g., 0.10)
/// - cap: The bracket's upper bound (empty for unlimited)
///
/// One `irs.tax-rates.{year}.json` file is written per tax year; point the
/// estimator's `file` backend at the output directory to use them.
#[derive(Parser, Debug)]
#[command(name = "tax-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing bracket data
    #[arg(short, long)]
    file: PathBuf,

    /// Directory the JSON documents are written to
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Read every written document back through the file backend
    #[arg(short, long, default_value_t = false)]
    verify: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    println!("Loading tax brackets from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = BracketLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let documents =
        BracketLoader::build_documents(&records).context("Failed to build bracket documents")?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create: {}", args.output.display()))?;

    let written = BracketLoader::write_documents(&args.output, &documents)
        .context("Failed to write bracket documents")?;

    for path in &written {
        println!("Wrote {}", path.display());
    }

    if args.verify {
        let source = FileBracketSource::new(&args.output);
        for (year, expected) in &documents {
            let loaded = source
                .fetch(*year)
                .await
                .with_context(|| format!("Failed to read back tax year {year}"))?;
            anyhow::ensure!(
                &loaded == expected,
                "Document for tax year {year} did not read back unchanged"
            );
        }
        println!("Verified {} documents.", documents.len());
    }

    println!(
        "Successfully wrote {} bracket documents to {}.",
        written.len(),
        args.output.display()
    );

    Ok(())
}
