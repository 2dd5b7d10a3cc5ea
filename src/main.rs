//! No-Show EDA - Medical Appointment Attendance Analysis
//!
//! Loads the medical appointments CSV, cleans it, answers three
//! attendance questions with descriptive statistics and writes charts.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (missing input, parse failure, empty result, chart failure)

mod charts;
mod cli;
mod config;
mod data;
mod stats;

use anyhow::{Context, Result};
use charts::StaticChartRenderer;
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use data::{DataCleaner, DataLoader};
use polars::prelude::DataFrame;
use stats::{AnalysisReport, Analyzer};
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("noshow_eda v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args) {
        error!("Analysis failed: {:#}", e);
        eprintln!("\nError: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Handle --init-config: generate a default .noshow.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", DEFAULT_CONFIG_FILE);
        std::process::exit(1);
    }

    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Config file (explicit or default location) merged with CLI arguments.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match args.config {
        Some(ref path) => Config::load(path)?,
        None => Config::load_default()?.unwrap_or_default(),
    };
    config.merge_with_args(args);
    debug!("Configuration: {:?}", config);
    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    let analysis = analyze_file(&config)?;

    println!("{}", analysis.report);

    if config.output.charts {
        let renderer = StaticChartRenderer::new(config.chart_options());
        let written = renderer
            .render_all(&analysis.df, &analysis.report)
            .context("Failed to render charts")?;
        for path in written {
            println!("Chart written: {}", path.display());
        }
    } else {
        info!("Chart rendering disabled");
    }

    Ok(())
}

/// Cleaned table and the statistics computed from it.
#[derive(Debug)]
struct Analysis {
    df: DataFrame,
    report: AnalysisReport,
}

/// Load, clean and analyze the configured input file.
fn analyze_file(config: &Config) -> Result<Analysis> {
    let path = &config.input.path;

    let raw = DataLoader::load_csv(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    let cleaned = DataCleaner::clean(&raw).context("Failed to clean appointment data")?;

    let report = Analyzer::new(config.analysis.significance_level)
        .analyze(&cleaned.df, cleaned.summary)
        .context("Failed to analyze appointment data")?;

    Ok(Analysis {
        df: cleaned.df,
        report,
    })
}
