//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::Scalar;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Recstat - frequency, statistics and filter reports over JSON records
///
/// Reads a JSON array of flat records from a file or URL and writes an
/// aligned text report and a comma-delimited report.
///
/// Examples:
///   recstat --input ulkoliikunta-daily-2021.json
///   recstat --input data.json --start 2021-08-01 --end 2021-08-31 --where groupId=OG10
///   recstat --input https://example.com/jobs.json --config jobs.toml
///   recstat --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// JSON file path or http(s) URL to read records from
    #[arg(short, long, value_name = "PATH|URL", env = "RECSTAT_INPUT")]
    pub input: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .recstat.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file for the aligned text report
    #[arg(long, value_name = "FILE")]
    pub text_output: Option<PathBuf>,

    /// Output file for the comma-delimited report
    #[arg(long, value_name = "FILE")]
    pub csv_output: Option<PathBuf>,

    /// Also write the report as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub json_output: Option<PathBuf>,

    /// Field ranked by frequency
    #[arg(long, value_name = "FIELD")]
    pub frequency_field: Option<String>,

    /// Numeric field summarized with statistics
    #[arg(long, value_name = "FIELD")]
    pub stats_field: Option<String>,

    /// Field whose distinct values are listed
    #[arg(long, value_name = "FIELD")]
    pub unique_field: Option<String>,

    /// Field compared against --start/--end
    #[arg(long, value_name = "FIELD")]
    pub date_field: Option<String>,

    /// Inclusive start of the date range (compared as text)
    #[arg(long, value_name = "DATE")]
    pub start: Option<String>,

    /// Inclusive end of the date range (compared as text)
    #[arg(long, value_name = "DATE")]
    pub end: Option<String>,

    /// Keep only records where FIELD equals VALUE (repeatable)
    ///
    /// VALUE is read as a JSON literal when possible (120, "120", null),
    /// otherwise as text.
    #[arg(long = "where", value_name = "FIELD=VALUE", value_parser = parse_where)]
    pub filters: Vec<(String, Scalar)>,

    /// Field holding application deadlines to classify
    #[arg(long, value_name = "FIELD")]
    pub deadline_field: Option<String>,

    /// Date deadlines are compared against (defaults to the local date)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub today: Option<NaiveDate>,

    /// Request timeout in seconds for remote sources
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Accept invalid TLS certificates from remote sources
    #[arg(long)]
    pub insecure: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .recstat.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Parse a `FIELD=VALUE` filter argument.
fn parse_where(raw: &str) -> Result<(String, Scalar), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{}'", raw))?;

    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{}'", raw));
    }

    Ok((field.to_string(), Scalar::parse_literal(value)))
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.start.is_some() != self.end.is_some() {
            return Err("--start and --end must be given together".to_string());
        }

        if let Some(ref input) = self.input {
            if input.trim().is_empty() {
                return Err("Input must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `[general] verbose` setting; `--quiet` wins
    /// over both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            input: Some("data.json".to_string()),
            config: None,
            text_output: None,
            csv_output: None,
            json_output: None,
            frequency_field: None,
            stats_field: None,
            unique_field: None,
            date_field: None,
            start: None,
            end: None,
            filters: Vec::new(),
            deadline_field: None,
            today: None,
            timeout: None,
            insecure: false,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_where() {
        assert_eq!(
            parse_where("groupId=OG10").unwrap(),
            ("groupId".to_string(), Scalar::text("OG10"))
        );
        assert_eq!(
            parse_where("usageMinutes=120").unwrap(),
            ("usageMinutes".to_string(), Scalar::Number(120.0))
        );
        assert_eq!(
            parse_where("note=a=b").unwrap(),
            ("note".to_string(), Scalar::text("a=b"))
        );
        assert!(parse_where("groupId").is_err());
        assert!(parse_where("=OG10").is_err());
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "recstat",
            "--input",
            "data.json",
            "--start",
            "2021-08-01",
            "--end",
            "2021-08-31",
            "--where",
            "groupId=OG10",
            "--where",
            "area=Hietaniemi",
            "--today",
            "2024-05-10",
        ])
        .unwrap();

        assert_eq!(args.filters.len(), 2);
        assert_eq!(args.filters[1].1, Scalar::text("Hietaniemi"));
        assert_eq!(args.today, NaiveDate::from_ymd_opt(2024, 5, 10));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_half_range() {
        let mut args = make_args();
        args.start = Some("2021-08-01".to_string());
        assert!(args.validate().is_err());

        args.end = Some("2021-08-31".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
