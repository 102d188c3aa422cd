//! Comma-delimited report generation.
//!
//! Values are written as-is. Only values of the configured free-text
//! fields (organization names, job titles) are quoted, since those are the
//! ones expected to contain commas.

use crate::config::ReportConfig;
use crate::models::{heading, AnalysisReport, RankedEntry, Scalar};
use ::csv::{QuoteStyle, Writer, WriterBuilder};
use anyhow::Result;

type RowWriter = Writer<Vec<u8>>;

/// Generate the complete delimited report.
pub fn generate_csv_report(report: &AnalysisReport, layout: &ReportConfig) -> Result<String> {
    let mut writer = row_writer(Vec::new());

    writer.write_record(["Key", "Value"])?;
    writer.write_record(["Total Entries".to_string(), report.total_entries.to_string()])?;
    for entry in &report.most_common {
        let value = entry
            .value
            .as_ref()
            .map(|v| cell(v, &entry.field, layout))
            .unwrap_or_default();
        writer.write_record([format!("Most Common {}", heading(&entry.field)), value])?;
    }

    if let Some(ref frequent) = report.frequent {
        if !frequent.entries.is_empty() {
            write_ranked_section(
                &mut writer,
                &frequent.field,
                "Frequency",
                &frequent.entries,
                layout,
            )?;
        }
    }

    if let Some(ref statistics) = report.statistics {
        start_section(&mut writer, ["Statistic", "Value"])?;
        for (label, value) in statistics.summary.rows() {
            writer.write_record([label, value.as_str()])?;
        }
    }

    if let Some(ref postings) = report.posting_analysis {
        let analysis = &postings.analysis;
        start_section(&mut writer, ["Posting Statistic", "Value"])?;
        writer.write_record(["Total Postings".to_string(), analysis.total_postings.to_string()])?;
        writer.write_record(["Average".to_string(), format!("{:.2}", analysis.average)])?;
        writer.write_record(["Minimum".to_string(), analysis.minimum.to_string()])?;
        writer.write_record(["Maximum".to_string(), analysis.maximum.to_string()])?;
        writer.write_record([
            "Standard deviation".to_string(),
            format!("{:.2}", analysis.standard_deviation),
        ])?;
    }

    if let Some(ref ranking) = report.ranking {
        write_ranked_section(&mut writer, &ranking.field, "Count", &ranking.entries, layout)?;
    }

    if let Some(ref filtered) = report.filtered {
        if !filtered.records.is_empty() && !filtered.columns.is_empty() {
            start_section(&mut writer, &filtered.columns)?;
            for record in &filtered.records {
                writer.write_record(filtered.columns.iter().map(|column| {
                    record
                        .get(column)
                        .map(|value| cell(value, column, layout))
                        .unwrap_or_default()
                }))?;
            }
        }
    }

    if let Some(ref titles) = report.title_counts {
        write_ranked_section(&mut writer, &titles.field, "Count", &titles.counts, layout)?;
    }

    if let Some(ref deadlines) = report.deadlines {
        start_section(&mut writer, ["Deadline Status", "Postings"])?;
        writer.write_record(["Expired".to_string(), deadlines.expired_count.to_string()])?;
        writer.write_record(["Open".to_string(), deadlines.open_count.to_string()])?;
        writer.write_record(["No valid date".to_string(), deadlines.skipped_count.to_string()])?;
    }

    if !report.counts.is_empty() {
        start_section(&mut writer, ["Key", "Value"])?;
        for (label, count) in &report.counts {
            writer.write_record([label.clone(), count.to_string()])?;
        }
    }

    if let Some(ref unique) = report.unique {
        start_section(&mut writer, [unique.field.as_str()])?;
        for value in &unique.values {
            writer.write_record([cell(value, &unique.field, layout)])?;
        }
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

fn row_writer(buf: Vec<u8>) -> RowWriter {
    WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .flexible(true)
        .from_writer(buf)
}

/// Blank separator line, then the section's header row.
fn start_section<I, T>(writer: &mut RowWriter, header: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let taken = std::mem::replace(writer, Writer::from_writer(Vec::new()));
    let mut bytes = taken.into_inner().map_err(|e| e.into_error())?;
    bytes.push(b'\n');
    *writer = row_writer(bytes);
    writer.write_record(header)?;
    Ok(())
}

/// Header row plus one `value,count` row per entry.
fn write_ranked_section(
    writer: &mut RowWriter,
    field: &str,
    count_label: &str,
    entries: &[RankedEntry],
    layout: &ReportConfig,
) -> Result<()> {
    start_section(writer, [heading(field), count_label.to_string()])?;

    for entry in entries {
        writer.write_record([cell(&entry.value, field, layout), entry.count.to_string()])?;
    }

    Ok(())
}

/// Render one value, quoting it when `field` holds free text.
fn cell(value: &Scalar, field: &str, layout: &ReportConfig) -> String {
    let raw = value.to_string();

    if layout.is_quoted(field) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::pipeline::analyze;
    use crate::source::loader::parse_records;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    #[test]
    fn test_usage_csv_report() {
        let records = parse_records(include_str!("../../fixtures/usage.json")).unwrap();
        let report = analyze(&records, &AnalysisConfig::default(), today()).report;
        let csv = generate_csv_report(&report, &ReportConfig::default()).unwrap();

        let expected = "\
Key,Value
Total Entries,4

Area,Frequency
Hietaniemi,3
Pirkkola,1

Statistic,Value
Average,120.00
Maximum,150.0
Minimum,90.0
Median,120.0
Standard deviation,24.49

utcdate,area,groupId,usageMinutes
2021-08-15T00:00:00.000Z,Hietaniemi,OG10,120
2021-08-20T00:00:00.000Z,Hietaniemi,OG10,150

Key,Value
Number of filtered entries,2

groupId
OG10
OG23
";
        assert_eq!(csv, expected);
    }

    #[test]
    fn test_postings_csv_quotes_free_text() {
        let records = parse_records(include_str!("../../fixtures/postings.json")).unwrap();
        let config = AnalysisConfig {
            frequency_field: None,
            statistics_field: None,
            unique_field: None,
            filter: None,
            most_common_fields: vec!["organisaatio".to_string()],
            posting_field: Some("organisaatio".to_string()),
            ..AnalysisConfig::default()
        };
        let report = analyze(&records, &config, today()).report;
        let csv = generate_csv_report(&report, &ReportConfig::default()).unwrap();

        assert!(csv.contains("Most Common Organisaatio,\"Vantaan kaupunki, Kasvatus\"\n"));
        assert!(csv.contains("\nOrganisaatio,Count\n\"Vantaan kaupunki, Kasvatus\",2\n\"Org B\",1\n\"Org C\",1\n"));
        assert!(csv.contains("Posting Statistic,Value\nTotal Postings,4\nAverage,1.33\n"));
    }

    #[test]
    fn test_unquoted_fields_keep_raw_commas() {
        let records =
            parse_records(r#"[{"area": "Kivikko, east", "kind": "gym"}, {"area": "Kivikko, east"}]"#)
                .unwrap();
        let config = AnalysisConfig {
            statistics_field: None,
            unique_field: None,
            filter: None,
            ..AnalysisConfig::default()
        };
        let report = analyze(&records, &config, today()).report;
        let csv = generate_csv_report(&report, &ReportConfig::default()).unwrap();

        assert_eq!(csv, "Key,Value\nTotal Entries,2\n\nArea,Frequency\nKivikko, east,2\n");
    }

    #[test]
    fn test_cell_escapes_quotes_in_quoted_fields() {
        let layout = ReportConfig::default();
        assert_eq!(
            cell(&Scalar::text("Say \"hi\""), "tyotehtava", &layout),
            "\"Say \"\"hi\"\"\""
        );
        assert_eq!(cell(&Scalar::text("a,b"), "area", &layout), "a,b");
        assert_eq!(cell(&Scalar::Number(2.5), "area", &layout), "2.5");
        assert_eq!(cell(&Scalar::Null, "area", &layout), "");
    }
}
