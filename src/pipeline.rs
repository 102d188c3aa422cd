//! Assembles an [`AnalysisReport`] from a record collection.
//!
//! The pipeline only decides which analyses run and in what shape their
//! results land in the report; the computations live in
//! [`crate::analysis`].

use crate::analysis::{
    calculate_statistics, check_application_deadlines, count_entries, count_values_where,
    filter_by_date_and_fields, job_posting_analysis, most_common_values, most_frequent_entries,
    rank_by_count, unique_values,
};
use crate::config::{AnalysisConfig, FilterConfig};
use crate::models::{
    AnalysisReport, DeadlineSection, Diagnostic, FilteredSection, FrequencySection,
    PostingSection, Record, StatisticsSection, TitleCountSection, UniqueSection,
};
use chrono::NaiveDate;
use tracing::debug;

/// Number of columns shown in the filtered table when none are configured.
pub const DEFAULT_DETAIL_COLUMNS: usize = 4;

/// Label of the filtered-entry count.
pub const FILTERED_COUNT_LABEL: &str = "Number of filtered entries";

/// A finished analysis plus notes about records that were left out.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub report: AnalysisReport,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run every configured analysis over `records`.
///
/// `today` is the reference date for deadline classification.
pub fn analyze(records: &[Record], config: &AnalysisConfig, today: NaiveDate) -> Analysis {
    let mut report = AnalysisReport {
        total_entries: count_entries(records),
        most_common: most_common_values(records, &config.most_common_fields),
        ..AnalysisReport::default()
    };
    let mut diagnostics = Vec::new();

    if let Some(ref field) = config.frequency_field {
        report.frequent = Some(FrequencySection {
            field: field.clone(),
            entries: most_frequent_entries(records, field, config.top_n),
        });
    }

    if let Some(ref field) = config.statistics_field {
        report.statistics = calculate_statistics(records, field).map(|summary| StatisticsSection {
            field: field.clone(),
            summary,
        });
        if report.statistics.is_none() {
            debug!("No numeric values for '{}'", field);
        }
    }

    if let Some(ref field) = config.posting_field {
        if let Some(analysis) = job_posting_analysis(records, field) {
            report.ranking = Some(FrequencySection {
                field: field.clone(),
                entries: rank_by_count(&analysis.organization_counter),
            });
            report.posting_analysis = Some(PostingSection {
                field: field.clone(),
                analysis,
            });
        }
    }

    if let Some(ref filter) = config.filter {
        let section = filtered_section(records, filter);
        report
            .counts
            .insert(FILTERED_COUNT_LABEL.to_string(), section.records.len());
        report.filtered = Some(section);
    }

    if let (Some(field), Some(organization)) = (&config.title_field, &config.title_organization) {
        let counts = count_values_where(records, &config.organization_field, organization, field);
        report.title_counts = Some(TitleCountSection {
            field: field.clone(),
            organization: organization.clone(),
            counts: rank_by_count(&counts),
        });
    }

    if let Some(ref field) = config.deadline_field {
        let summary = check_application_deadlines(records, field, &config.deadline_format, today);
        report.deadlines = Some(DeadlineSection {
            field: field.clone(),
            today,
            expired_count: summary.expired_count(),
            open_count: summary.open_count(),
            skipped_count: summary.skipped.len(),
        });
        diagnostics.extend(summary.skipped);
    }

    if let Some(ref field) = config.unique_field {
        report.unique = Some(UniqueSection {
            field: field.clone(),
            label: config
                .unique_label
                .clone()
                .unwrap_or_else(|| format!("{} Values", field)),
            values: unique_values(records, field),
        });
    }

    Analysis {
        report,
        diagnostics,
    }
}

fn filtered_section(records: &[Record], filter: &FilterConfig) -> FilteredSection {
    let predicate = filter.predicate();
    let filtered = filter_by_date_and_fields(records, &predicate);

    let columns = match filter.columns {
        Some(ref columns) => columns.clone(),
        None => filtered
            .first()
            .map(|first| {
                first
                    .keys()
                    .take(DEFAULT_DETAIL_COLUMNS)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default(),
    };

    FilteredSection {
        predicate,
        columns,
        records: filtered,
    }
}
