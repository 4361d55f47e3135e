use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use tax_core::FilingStatus;
use tax_core::calculations::resolve_deduction;
use tax_core::constants::SUPPORTED_YEARS;
use tax_cli::app::{self, EstimatorSession};
use tax_cli::config::{EstimatorConfig, OFFLINE_BACKEND};
use tax_cli::report::Report;
use tax_cli::state::{AppState, StreamKind};
use tax_cli::{csv_loader, logging, utils};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Federal income tax estimator.
///
/// Combines regular income and long-term capital gains, applies the
/// standard or itemized deduction and reports the tax bracket by bracket.
/// Bracket tables are fetched for the selected year; the built-in tables
/// are used when that fails.
#[derive(Debug, Parser)]
#[command(name = "tax-estimator", version)]
struct Cli {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tax year.
    #[arg(long)]
    year: Option<i32>,

    /// Filing status: single, married_jointly, married_separately or
    /// head_of_household.
    #[arg(long, value_parser = parse_status)]
    status: Option<FilingStatus>,

    /// Taxpayer is 65 or older.
    #[arg(long, overrides_with = "no_senior")]
    senior: bool,

    /// Taxpayer is under 65, even if the config says otherwise.
    #[arg(long, overrides_with = "senior")]
    no_senior: bool,

    /// Regular income stream; repeat for up to five streams.
    #[arg(long = "income", value_parser = utils::parse_amount)]
    incomes: Vec<Decimal>,

    /// Long-term capital gains stream; repeat for up to five streams.
    #[arg(long = "cap-gains", value_parser = utils::parse_amount)]
    cap_gains: Vec<Decimal>,

    /// Itemized deduction amount.
    #[arg(long, value_parser = utils::parse_amount, default_value = "0")]
    itemized: Decimal,

    /// Use only the itemized deduction, never the standard one.
    #[arg(long)]
    itemize_only: bool,

    /// Snap regular income streams onto nearby bracket boundaries.
    #[arg(long, overrides_with = "no_snap")]
    snap: bool,

    /// Turn snapping off, even if the config turns it on.
    #[arg(long, overrides_with = "snap")]
    no_snap: bool,

    /// Distance within which snapping applies.
    #[arg(long, value_parser = utils::parse_amount)]
    snap_radius: Option<Decimal>,

    /// Bracket data backend: http, file or none.
    #[arg(long)]
    source: Option<String>,

    /// Backend location, e.g. the directory for the file backend.
    #[arg(long)]
    source_location: Option<String>,

    /// Estimate every scenario in a CSV file instead of the flags above.
    #[arg(long)]
    batch: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log level or EnvFilter directive, e.g. `debug`.
    #[arg(long)]
    log_level: Option<String>,

    /// Append log output to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Hide console log output.
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// A `--flag`/`--no-flag` pair; the config value applies when neither is given.
fn flag_or(
    on: bool,
    off: bool,
    default: bool,
) -> bool {
    match (on, off) {
        (true, _) => true,
        (_, true) => false,
        _ => default,
    }
}

fn parse_status(s: &str) -> Result<FilingStatus, String> {
    FilingStatus::parse(s).ok_or_else(|| format!("unknown filing status '{s}'"))
}

// ─── setup ───────────────────────────────────────────────────────────────────

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    logging::init_default_logging();

    if let Some(level) = &cli.log_level {
        logging::set_log_level(level)?;
    }
    if let Some(path) = &cli.log_file {
        logging::enable_file_logging(path)?;
    }
    if cli.quiet {
        logging::set_console_enabled(false)?;
    }

    debug!(app = logging::app_name(), "logging initialized");
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<EstimatorConfig> {
    let mut config = match &cli.config {
        Some(path) => EstimatorConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => EstimatorConfig::default(),
    };

    if let Some(backend) = &cli.source {
        config.source.backend = backend.clone();
    }
    if let Some(location) = &cli.source_location {
        config.source.location = location.clone();
    }
    Ok(config)
}

fn open_session(config: &EstimatorConfig) -> anyhow::Result<EstimatorSession> {
    if config.source.is_offline() {
        info!("bracket fetching disabled ({OFFLINE_BACKEND} backend)");
        return Ok(EstimatorSession::offline());
    }

    let source_config = config.source.to_source_config()?;
    EstimatorSession::from_config(&app::build_registry(), &source_config)
        .with_context(|| format!("Failed to set up '{}' data source", source_config.backend))
}

fn check_year(year: i32) {
    if !SUPPORTED_YEARS.contains(&year) {
        warn!(year, supported = ?SUPPORTED_YEARS, "no built-in tables for year, using defaults");
    }
}

// ─── runs ────────────────────────────────────────────────────────────────────

async fn run_single(
    cli: &Cli,
    config: &EstimatorConfig,
    session: &mut EstimatorSession,
) -> anyhow::Result<Report> {
    let defaults = &config.defaults;

    let mut state = AppState::new(cli.year.unwrap_or(defaults.year));
    state.filing_status = cli.status.unwrap_or(defaults.filing_status);
    state.is_senior = flag_or(cli.senior, cli.no_senior, defaults.senior);
    state.itemized_deduction = cli.itemized;
    state.use_standard = !cli.itemize_only;
    state.snap_enabled = flag_or(cli.snap, cli.no_snap, defaults.snap);
    state.snap_radius = cli.snap_radius.unwrap_or(defaults.snap_radius);

    check_year(state.year);
    session.select_year(state.year);
    session.settle().await;

    // The deduction does not depend on income, so boundaries are known
    // before the streams are set.
    let deduction = resolve_deduction(
        state.year,
        state.filing_status,
        state.is_senior,
        state.itemized_deduction,
        state.use_standard,
    );
    let snap_points = session.snap_points(state.filing_status, deduction.final_deduction);

    if !cli.incomes.is_empty() {
        state
            .replace_streams(StreamKind::Regular, &cli.incomes, &snap_points)
            .context("Invalid --income values")?;
    }
    if !cli.cap_gains.is_empty() {
        state
            .replace_streams(StreamKind::CapGains, &cli.cap_gains, &snap_points)
            .context("Invalid --cap-gains values")?;
    }
    debug!(
        regular = ?state.streams(StreamKind::Regular),
        cap_gains = ?state.streams(StreamKind::CapGains),
        "income streams"
    );

    Ok(session.report(&state.to_inputs()))
}

async fn run_batch(
    path: &Path,
    session: &mut EstimatorSession,
) -> anyhow::Result<Vec<Report>> {
    let scenarios = csv_loader::load_from_file(path)
        .with_context(|| format!("Failed to load scenarios: {}", path.display()))?;
    info!(count = scenarios.len(), "loaded batch scenarios");

    let years: BTreeSet<i32> = scenarios.iter().map(|s| s.year).collect();
    for year in years {
        check_year(year);
        session.select_year(year);
    }
    session.settle().await;

    Ok(scenarios.iter().map(|inputs| session.report(inputs)).collect())
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = load_config(&cli)?;
    let mut session = open_session(&config)?;

    let reports = match &cli.batch {
        Some(path) => run_batch(path, &mut session).await?,
        None => vec![run_single(&cli, &config, &mut session).await?],
    };

    match cli.format {
        OutputFormat::Json if cli.batch.is_some() => {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        OutputFormat::Json => {
            for report in &reports {
                println!("{}", report.to_json()?);
            }
        }
        OutputFormat::Text => {
            let texts: Vec<String> = reports.iter().map(Report::render_text).collect();
            print!("{}", texts.join("\n----------------------------------------\n\n"));
        }
    }

    Ok(())
}
