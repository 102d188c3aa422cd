//! Recstat - frequency, statistics and filter reports over JSON records
//!
//! A CLI tool that loads a JSON array of flat records from a file or URL,
//! ranks and summarizes chosen fields, filters records by date range and
//! field equality, and writes an aligned text report and a comma-delimited
//! report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, unreadable or invalid config, unavailable source, write failure)

mod analysis;
mod cli;
mod config;
mod models;
mod pipeline;
mod report;
mod source;

use anyhow::{Context, Result};
use chrono::Local;
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use source::{LoadOptions, RecordSource};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so [general] verbose can apply
    let (config, config_path) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&args, &config);

    info!("Recstat v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_path {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .recstat.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to choose the source, fields, filter and report layout.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level(config.general.verbose);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load, analyze and report. Returns the exit code.
async fn run(args: Args, mut config: Config) -> Result<i32> {
    config.merge_with_args(&args);
    config.validate()?;

    let location = config.source.location.as_deref().unwrap_or_default();
    let record_source = RecordSource::parse(location);
    let load_options = LoadOptions {
        show_progress: !args.quiet,
        ..LoadOptions::from(&config.source)
    };

    // Step 1: Get the records. Without them there is nothing to report.
    let records = match source::load_records(&record_source, &load_options).await {
        Ok(records) => records,
        Err(e) => {
            error!("Failed to load records from {}: {}", record_source, e);
            eprintln!("\n❌ Failed to load JSON data from: {}", record_source);
            eprintln!("   Reason: {}", e);
            eprintln!("   Please check the path, your internet connection or the URL and try again.");
            return Ok(1);
        }
    };

    if records.is_empty() {
        warn!("{} contains no records", record_source);
    }

    // Step 2: Analyze
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let analysis = pipeline::analyze(&records, &config.analysis, today);

    for diagnostic in &analysis.diagnostics {
        warn!("Skipped {}", diagnostic);
    }

    // Step 3: Render and save
    let rendered = report::render_reports(&analysis.report, &config.report)?;
    report::save_reports(&rendered)?;

    if !args.quiet {
        println!("📊 Analyzed {} records from {}", records.len(), record_source);
        for output in &rendered {
            println!("   Report saved to: {}", output.path.display());
        }
    }

    Ok(0)
}

/// Load configuration from file or use defaults.
///
/// Returns the config and the file it came from. A config file that exists
/// but cannot be read or parsed is an error.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default()? {
        Some(config) => Ok((config, Some(PathBuf::from(CONFIG_FILE_NAME)))),
        None => Ok((Config::default(), None)),
    }
}
