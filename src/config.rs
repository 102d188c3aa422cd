//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.recstat.toml` files.

use crate::analysis::{DEFAULT_DEADLINE_FORMAT, DEFAULT_TOP_N};
use crate::models::{DateRangePredicate, Scalar};
use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".recstat.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Record source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Which analyses to run.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Where records come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Local path or http(s) URL of a JSON array of records.
    #[serde(default)]
    pub location: Option<String>,

    /// Request timeout in seconds for remote sources.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Skip TLS certificate verification for remote sources.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            location: None,
            timeout_seconds: default_timeout(),
            accept_invalid_certs: false,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// Analysis settings.
///
/// When the `[analysis]` table is absent the defaults describe the outdoor
/// gym usage dataset. When it is present, only the sections it names run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Field ranked by frequency.
    #[serde(default)]
    pub frequency_field: Option<String>,

    /// Number of ranked entries kept.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Numeric field summarized with descriptive statistics.
    #[serde(default)]
    pub statistics_field: Option<String>,

    /// Field whose distinct values are listed.
    #[serde(default)]
    pub unique_field: Option<String>,

    /// Heading of the unique-value listing. Defaults to "<field> Values".
    #[serde(default)]
    pub unique_label: Option<String>,

    /// Fields reported with their single most common value.
    #[serde(default)]
    pub most_common_fields: Vec<String>,

    /// Category field analyzed by postings per category.
    #[serde(default)]
    pub posting_field: Option<String>,

    /// Field counted within one organization.
    #[serde(default)]
    pub title_field: Option<String>,

    /// Organization whose titles are counted.
    #[serde(default)]
    pub title_organization: Option<Scalar>,

    /// Field matched against `title_organization`.
    #[serde(default = "default_organization_field")]
    pub organization_field: String,

    /// Field holding an application deadline.
    #[serde(default)]
    pub deadline_field: Option<String>,

    /// chrono format of the deadline field.
    #[serde(default = "default_deadline_format")]
    pub deadline_format: String,

    /// Date range and equality filter.
    #[serde(default)]
    pub filter: Option<FilterConfig>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frequency_field: Some("area".to_string()),
            top_n: default_top_n(),
            statistics_field: Some("usageMinutes".to_string()),
            unique_field: Some("groupId".to_string()),
            unique_label: Some("Group IDs".to_string()),
            most_common_fields: Vec::new(),
            posting_field: None,
            title_field: None,
            title_organization: None,
            organization_field: default_organization_field(),
            deadline_field: None,
            deadline_format: default_deadline_format(),
            filter: Some(FilterConfig {
                date_field: "utcdate".to_string(),
                start: "2021-08-01T00:00:00.000Z".to_string(),
                end: "2021-08-31T23:59:59.999Z".to_string(),
                equals: [
                    ("groupId".to_string(), Scalar::text("OG10")),
                    ("area".to_string(), Scalar::text("Hietaniemi")),
                ]
                .into_iter()
                .collect(),
                columns: None,
            }),
        }
    }
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_organization_field() -> String {
    "organisaatio".to_string()
}

fn default_deadline_format() -> String {
    DEFAULT_DEADLINE_FORMAT.to_string()
}

/// Filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Field compared against the date range.
    #[serde(default = "default_date_field")]
    pub date_field: String,

    /// Inclusive lower bound.
    #[serde(default)]
    pub start: String,

    /// Inclusive upper bound.
    #[serde(default)]
    pub end: String,

    /// Fields that must equal the given values.
    #[serde(default)]
    pub equals: IndexMap<String, Scalar>,

    /// Columns shown in the filtered table. Defaults to the fields of the
    /// first filtered record.
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            date_field: default_date_field(),
            start: String::new(),
            end: String::new(),
            equals: IndexMap::new(),
            columns: None,
        }
    }
}

fn default_date_field() -> String {
    "utcdate".to_string()
}

impl FilterConfig {
    /// The predicate applied by the filter engine.
    pub fn predicate(&self) -> DateRangePredicate {
        self.equals.iter().fold(
            DateRangePredicate::new(&self.date_field, &self.start, &self.end),
            |predicate, (field, value)| predicate.with_equal(field, value.clone()),
        )
    }
}

/// Report output and layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Aligned plain-text report path.
    #[serde(default = "default_text_output")]
    pub text_output: String,

    /// Comma-delimited report path.
    #[serde(default = "default_csv_output")]
    pub csv_output: String,

    /// Optional JSON report path.
    #[serde(default)]
    pub json_output: Option<String>,

    /// Label column of the frequency and statistics tables.
    #[serde(default = "default_label_width")]
    pub label_width: usize,

    /// Value column of the frequency and statistics tables.
    #[serde(default = "default_value_width")]
    pub value_width: usize,

    /// Rule under frequency and statistics headings.
    #[serde(default = "default_rule_width")]
    pub rule_width: usize,

    /// First column of the filtered table.
    #[serde(default = "default_detail_first_width")]
    pub detail_first_width: usize,

    /// Remaining columns of the filtered table.
    #[serde(default = "default_detail_width")]
    pub detail_width: usize,

    /// Rule of the filtered table.
    #[serde(default = "default_detail_rule_width")]
    pub detail_rule_width: usize,

    /// Rule under the counts and unique-value headings.
    #[serde(default = "default_list_rule_width")]
    pub list_rule_width: usize,

    /// Label column of the category ranking table.
    #[serde(default = "default_ranking_label_width")]
    pub ranking_label_width: usize,

    /// Fields holding free text, quoted in the delimited report.
    #[serde(default = "default_quoted_fields")]
    pub quoted_fields: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            text_output: default_text_output(),
            csv_output: default_csv_output(),
            json_output: None,
            label_width: default_label_width(),
            value_width: default_value_width(),
            rule_width: default_rule_width(),
            detail_first_width: default_detail_first_width(),
            detail_width: default_detail_width(),
            detail_rule_width: default_detail_rule_width(),
            list_rule_width: default_list_rule_width(),
            ranking_label_width: default_ranking_label_width(),
            quoted_fields: default_quoted_fields(),
        }
    }
}

fn default_text_output() -> String {
    "report.txt".to_string()
}

fn default_csv_output() -> String {
    "report.csv".to_string()
}

fn default_label_width() -> usize {
    25
}

fn default_value_width() -> usize {
    10
}

fn default_rule_width() -> usize {
    38
}

fn default_detail_first_width() -> usize {
    25
}

fn default_detail_width() -> usize {
    20
}

fn default_detail_rule_width() -> usize {
    100
}

fn default_list_rule_width() -> usize {
    35
}

fn default_ranking_label_width() -> usize {
    40
}

fn default_quoted_fields() -> Vec<String> {
    vec!["organisaatio".to_string(), "tyotehtava".to_string()]
}

impl ReportConfig {
    /// Whether values of `field` are quoted in the delimited report.
    pub fn is_quoted(&self, field: &str) -> bool {
        self.quoted_fields.iter().any(|f| f == field)
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Load `.recstat.toml` from `dir`, if present.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(CONFIG_FILE_NAME);

        if path.exists() {
            Ok(Some(Self::load(&path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings and only
    /// override values they explicitly provide.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.source.location = Some(input.clone());
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = timeout;
        }
        if args.insecure {
            self.source.accept_invalid_certs = true;
        }

        if let Some(ref field) = args.frequency_field {
            self.analysis.frequency_field = Some(field.clone());
        }
        if let Some(ref field) = args.stats_field {
            self.analysis.statistics_field = Some(field.clone());
        }
        if let Some(ref field) = args.unique_field {
            self.analysis.unique_field = Some(field.clone());
        }
        if let Some(ref field) = args.deadline_field {
            self.analysis.deadline_field = Some(field.clone());
        }

        let filter_flags = args.date_field.is_some()
            || args.start.is_some()
            || args.end.is_some()
            || !args.filters.is_empty();
        if filter_flags {
            let mut filter = self.analysis.filter.take().unwrap_or_default();
            if let Some(ref field) = args.date_field {
                filter.date_field = field.clone();
            }
            if let Some(ref start) = args.start {
                filter.start = start.clone();
            }
            if let Some(ref end) = args.end {
                filter.end = end.clone();
            }
            if !args.filters.is_empty() {
                filter.equals = args.filters.iter().cloned().collect();
            }
            self.analysis.filter = Some(filter);
        }

        if let Some(ref path) = args.text_output {
            self.report.text_output = path.display().to_string();
        }
        if let Some(ref path) = args.csv_output {
            self.report.csv_output = path.display().to_string();
        }
        if let Some(ref path) = args.json_output {
            self.report.json_output = Some(path.display().to_string());
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check settings that can only be judged after merging.
    pub fn validate(&self) -> Result<()> {
        if self.source.location.is_none() {
            bail!("No record source given: pass --input or set [source] location");
        }
        if self.source.timeout_seconds == 0 {
            bail!("Timeout must be at least 1 second");
        }
        if self.analysis.top_n == 0 {
            bail!("top_n must be at least 1");
        }
        if let Some(ref filter) = self.analysis.filter {
            if filter.start.is_empty() || filter.end.is_empty() {
                bail!("Filter on '{}' needs both a start and an end", filter.date_field);
            }
            if filter.start > filter.end {
                bail!(
                    "Filter start '{}' is after end '{}'",
                    filter.start,
                    filter.end
                );
            }
        }
        if self.analysis.title_field.is_some() && self.analysis.title_organization.is_none() {
            bail!("title_field requires title_organization");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analysis.frequency_field.as_deref(), Some("area"));
        assert_eq!(config.analysis.top_n, 5);
        assert_eq!(config.report.label_width, 25);
        assert_eq!(config.report.detail_rule_width, 100);
        assert!(config.report.is_quoted("organisaatio"));

        let filter = config.analysis.filter.unwrap();
        assert_eq!(filter.equals.get("groupId"), Some(&Scalar::text("OG10")));
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[source]
location = "https://example.com/jobs.json"
accept_invalid_certs = true

[analysis]
most_common_fields = ["organisaatio", "tyotehtava"]
posting_field = "organisaatio"
deadline_field = "haku_paattyy_pvm"

[report]
text_output = "jobs.txt"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(
            config.source.location.as_deref(),
            Some("https://example.com/jobs.json")
        );
        assert!(config.source.accept_invalid_certs);
        assert_eq!(config.source.timeout_seconds, 30);

        // A present [analysis] table only runs what it names.
        assert!(config.analysis.frequency_field.is_none());
        assert!(config.analysis.filter.is_none());
        assert_eq!(config.analysis.posting_field.as_deref(), Some("organisaatio"));
        assert_eq!(config.analysis.deadline_format, "%Y-%m-%d");

        assert_eq!(config.report.text_output, "jobs.txt");
        assert_eq!(config.report.csv_output, "report.csv");
    }

    #[test]
    fn test_parse_filter_equals() {
        let toml_content = r#"
[analysis.filter]
date_field = "day"
start = "2021-01-01"
end = "2021-12-31"
equals = { area = "Pirkkola", usageMinutes = 90 }
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        let predicate = config.analysis.filter.unwrap().predicate();
        assert_eq!(predicate.date_field, "day");
        assert_eq!(
            predicate.equals,
            vec![
                ("area".to_string(), Scalar::text("Pirkkola")),
                ("usageMinutes".to_string(), Scalar::Number(90.0)),
            ]
        );
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[general]\nverbose = true\n\n[source]\nlocation = \"data.json\"\n",
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.source.location.as_deref(), Some("data.json"));
    }

    #[test]
    fn test_load_from_dir_rejects_broken_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[source\nlocation = ").unwrap();

        let err = Config::load_from_dir(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.source.location = Some("data.json".to_string());
        assert!(config.validate().is_ok());

        if let Some(ref mut filter) = config.analysis.filter {
            filter.end.clear();
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[source]"));
        assert!(toml_str.contains("[analysis]"));
        assert!(toml_str.contains("[report]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.analysis.statistics_field.as_deref(), Some("usageMinutes"));
    }
}
