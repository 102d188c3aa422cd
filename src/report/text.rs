//! Aligned plain-text report generation.
//!
//! Tables use fixed column widths from [`ReportConfig`]; labels are left
//! aligned and values right aligned.

use crate::config::ReportConfig;
use crate::models::{
    heading, AnalysisReport, DeadlineSection, FilteredSection, FrequencySection,
    MostCommonValue, PostingSection, StatisticsSection, TitleCountSection, UniqueSection,
};
use indexmap::IndexMap;

/// Width the filtered-table title is right-aligned in.
const FILTERED_TITLE_WIDTH: usize = 50;

/// Generate the complete plain-text report.
pub fn generate_text_report(report: &AnalysisReport, layout: &ReportConfig) -> String {
    let mut output = String::new();

    output.push_str(&format!("Total Entries: {}\n", report.total_entries));
    output.push_str(&generate_most_common_section(&report.most_common));

    if let Some(ref frequent) = report.frequent {
        output.push_str(&generate_frequency_section(frequent, layout));
    }
    if let Some(ref statistics) = report.statistics {
        output.push_str(&generate_statistics_section(statistics, layout));
    }
    if let Some(ref postings) = report.posting_analysis {
        output.push_str(&generate_posting_section(postings, layout));
    }
    if let Some(ref ranking) = report.ranking {
        output.push_str(&generate_ranking_section(ranking, layout));
    }
    if let Some(ref filtered) = report.filtered {
        output.push_str(&generate_filtered_section(filtered, layout));
    }
    if let Some(ref titles) = report.title_counts {
        output.push_str(&generate_title_section(titles, layout));
    }
    if let Some(ref deadlines) = report.deadlines {
        output.push_str(&generate_deadline_section(deadlines, layout));
    }

    output.push_str(&generate_counts_section(&report.counts, layout));

    if let Some(ref unique) = report.unique {
        output.push_str(&generate_unique_section(unique, layout));
    }

    output
}

fn rule(c: char, width: usize) -> String {
    let mut line: String = std::iter::repeat(c).take(width).collect();
    line.push('\n');
    line
}

/// A label/value row in the two-column tables.
fn row(label: &str, value: &str, layout: &ReportConfig) -> String {
    format!(
        "{:<lw$} {:>vw$}\n",
        label,
        value,
        lw = layout.label_width,
        vw = layout.value_width
    )
}

/// Title, double rule, column header and single rule of a two-column table.
fn table_header(title: &str, label: &str, value: &str, layout: &ReportConfig) -> String {
    let mut header = String::new();

    header.push_str(&format!("\n{}\n", title));
    header.push_str(&rule('=', layout.rule_width));
    header.push_str(&row(label, value, layout));
    header.push_str(&rule('-', layout.rule_width));

    header
}

fn generate_most_common_section(values: &[MostCommonValue]) -> String {
    let mut section = String::new();

    for entry in values {
        let value = entry
            .value
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        section.push_str(&format!("Most common {}: {}\n", entry.field, value));
    }

    section
}

fn generate_frequency_section(frequent: &FrequencySection, layout: &ReportConfig) -> String {
    if frequent.entries.is_empty() {
        return String::new();
    }

    let mut section = table_header(
        "The Most Frequent Entries:",
        &heading(&frequent.field),
        "Frequency",
        layout,
    );

    for entry in &frequent.entries {
        section.push_str(&row(
            &entry.value.to_string(),
            &entry.count.to_string(),
            layout,
        ));
    }

    section
}

fn generate_statistics_section(statistics: &StatisticsSection, layout: &ReportConfig) -> String {
    let mut section = table_header(
        &format!("Summary Statistics on {}:", statistics.field),
        "Statistics",
        "Value",
        layout,
    );

    for (label, value) in statistics.summary.rows() {
        section.push_str(&row(label, &value, layout));
    }

    section
}

fn generate_posting_section(postings: &PostingSection, layout: &ReportConfig) -> String {
    let analysis = &postings.analysis;
    let mut section = table_header(
        &format!("Postings per {}:", postings.field),
        "Statistics",
        "Value",
        layout,
    );

    section.push_str(&row("Total postings", &analysis.total_postings.to_string(), layout));
    section.push_str(&row("Average", &format!("{:.2}", analysis.average), layout));
    section.push_str(&row("Minimum", &analysis.minimum.to_string(), layout));
    section.push_str(&row("Maximum", &analysis.maximum.to_string(), layout));
    section.push_str(&row(
        "Standard deviation",
        &format!("{:.2}", analysis.standard_deviation),
        layout,
    ));

    section
}

fn generate_ranking_section(ranking: &FrequencySection, layout: &ReportConfig) -> String {
    let width = layout.ranking_label_width + 1 + layout.value_width;
    let ranking_row = |label: &str, value: &str| {
        format!(
            "{:<lw$} {:>vw$}\n",
            label,
            value,
            lw = layout.ranking_label_width,
            vw = layout.value_width
        )
    };

    let mut section = String::new();

    section.push_str(&format!("\n{} Ranking:\n", heading(&ranking.field)));
    section.push_str(&rule('=', width));
    section.push_str(&ranking_row(&heading(&ranking.field), "Count"));
    section.push_str(&rule('-', width));

    for entry in &ranking.entries {
        section.push_str(&ranking_row(
            &entry.value.to_string(),
            &entry.count.to_string(),
        ));
    }

    section
}

fn generate_filtered_section(filtered: &FilteredSection, layout: &ReportConfig) -> String {
    if filtered.records.is_empty() || filtered.columns.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str(&format!(
        "\n{:>tw$}\n",
        "FILTERED DATA",
        tw = FILTERED_TITLE_WIDTH
    ));
    section.push_str(&rule('=', layout.detail_rule_width));

    let headers: Vec<String> = filtered.columns.iter().map(|c| c.to_string()).collect();
    section.push_str(&detail_line(&headers, layout));
    section.push_str(&rule('-', layout.detail_rule_width));

    for record in &filtered.records {
        let cells: Vec<String> = filtered
            .columns
            .iter()
            .map(|column| {
                record
                    .get(column)
                    .map(|value| value.to_string())
                    .unwrap_or_default()
            })
            .collect();
        section.push_str(&detail_line(&cells, layout));
    }

    section
}

/// First cell left aligned, the rest right aligned, single-space separated.
fn detail_line(cells: &[String], layout: &ReportConfig) -> String {
    let line: Vec<String> = cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            if i == 0 {
                format!("{:<w$}", cell, w = layout.detail_first_width)
            } else {
                format!("{:>w$}", cell, w = layout.detail_width)
            }
        })
        .collect();

    format!("{}\n", line.join(" "))
}

fn generate_title_section(titles: &TitleCountSection, layout: &ReportConfig) -> String {
    let mut section = table_header(
        &format!("{} at {}:", heading(&titles.field), titles.organization),
        &heading(&titles.field),
        "Count",
        layout,
    );

    for entry in &titles.counts {
        section.push_str(&row(
            &entry.value.to_string(),
            &entry.count.to_string(),
            layout,
        ));
    }

    section
}

fn generate_deadline_section(deadlines: &DeadlineSection, layout: &ReportConfig) -> String {
    let mut section = table_header(
        &format!(
            "Application Deadlines on {} (as of {}):",
            deadlines.field,
            deadlines.today.format("%Y-%m-%d")
        ),
        "Status",
        "Postings",
        layout,
    );

    section.push_str(&row("Expired", &deadlines.expired_count.to_string(), layout));
    section.push_str(&row("Open", &deadlines.open_count.to_string(), layout));
    if deadlines.skipped_count > 0 {
        section.push_str(&row(
            "No valid date",
            &deadlines.skipped_count.to_string(),
            layout,
        ));
    }

    section
}

fn generate_counts_section(counts: &IndexMap<String, usize>, layout: &ReportConfig) -> String {
    if counts.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("\nThe number of appearance:\n");
    section.push_str(&rule('=', layout.list_rule_width));
    for (label, count) in counts {
        section.push_str(&format!("{}: {}\n", label, count));
    }

    section
}

fn generate_unique_section(unique: &UniqueSection, layout: &ReportConfig) -> String {
    let mut section = String::new();

    section.push_str(&format!("\nAll Unique {}:\n", unique.label));
    section.push_str(&rule('=', layout.list_rule_width));
    for value in &unique.values {
        section.push_str(&format!("{}\n", value));
    }

    section
}
