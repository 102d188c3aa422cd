//! Report generation entry points.
//!
//! Renders one [`AnalysisReport`] into every configured output form and
//! writes them through the sink.

use crate::config::ReportConfig;
use crate::models::AnalysisReport;
use crate::report::csv::generate_csv_report;
use crate::report::sink::{write_report, SinkError};
use crate::report::text::generate_text_report;
use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// A rendered report and where it goes.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    pub path: PathBuf,
    pub content: String,
}

/// Render the text, delimited and (if configured) JSON forms of `report`.
pub fn render_reports(report: &AnalysisReport, config: &ReportConfig) -> Result<Vec<RenderedReport>> {
    let mut rendered = vec![
        RenderedReport {
            path: PathBuf::from(&config.text_output),
            content: generate_text_report(report, config),
        },
        RenderedReport {
            path: PathBuf::from(&config.csv_output),
            content: generate_csv_report(report, config)?,
        },
    ];

    if let Some(ref json_output) = config.json_output {
        rendered.push(RenderedReport {
            path: PathBuf::from(json_output),
            content: generate_json_report(report)?,
        });
    }

    Ok(rendered)
}

/// Write every rendered report, stopping at the first failure.
pub fn save_reports(reports: &[RenderedReport]) -> Result<(), SinkError> {
    for report in reports {
        write_report(&report.path, &report.content)?;
        info!("Report saved to: {}", report.path.display());
    }
    Ok(())
}

/// Generate a JSON report.
pub fn generate_json_report(report: &AnalysisReport) -> Result<String> {
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::models::Record;
    use crate::pipeline::analyze;
    use crate::source::loader::parse_records;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn usage_records() -> Vec<Record> {
        parse_records(include_str!("../../fixtures/usage.json")).unwrap()
    }

    fn usage_report(records: &[Record]) -> AnalysisReport {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        analyze(records, &AnalysisConfig::default(), today).report
    }

    #[test]
    fn test_render_reports_default_outputs() {
        let report = usage_report(&usage_records());
        let rendered = render_reports(&report, &ReportConfig::default()).unwrap();

        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0].path, PathBuf::from("report.txt"));
        assert!(rendered[0].content.starts_with("Total Entries: 4\n"));
        assert_eq!(rendered[1].path, PathBuf::from("report.csv"));
        assert!(rendered[1].content.starts_with("Key,Value\n"));
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let records = usage_records();
        let config = ReportConfig {
            json_output: Some("report.json".to_string()),
            ..ReportConfig::default()
        };

        let first = render_reports(&usage_report(&records), &config).unwrap();
        let second = render_reports(&usage_report(&records), &config).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_generate_json_report() {
        let report = usage_report(&usage_records());
        let json = generate_json_report(&report).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_entries"], 4);
        assert_eq!(value["frequent"]["entries"][0]["value"], "Hietaniemi");
        assert_eq!(value["statistics"]["summary"]["standard_deviation"], 24.49);
        assert_eq!(value["unique"]["values"][1], "OG23");
    }

    #[test]
    fn test_save_reports() {
        let dir = TempDir::new().unwrap();
        let config = ReportConfig {
            text_output: dir.path().join("out.txt").display().to_string(),
            csv_output: dir.path().join("out.csv").display().to_string(),
            ..ReportConfig::default()
        };

        let rendered = render_reports(&usage_report(&usage_records()), &config).unwrap();
        save_reports(&rendered).unwrap();

        let text = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
        assert_eq!(text, rendered[0].content);
        assert!(dir.path().join("out.csv").exists());
    }
}
