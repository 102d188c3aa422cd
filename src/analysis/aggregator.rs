//! Frequency ranking and descriptive statistics.
//!
//! Every function here is pure: it reads a record collection and returns a
//! fresh result. Records that lack the requested field are skipped rather
//! than defaulted.

use crate::models::{MostCommonValue, PostingAnalysis, RankedEntry, Record, Scalar, StatisticsSummary};
use indexmap::IndexMap;

/// Default number of entries kept by [`most_frequent_entries`].
pub const DEFAULT_TOP_N: usize = 5;

/// Count the records in a collection.
pub fn count_entries(records: &[Record]) -> usize {
    records.len()
}

/// Build a value -> count table for `field`, keyed in first-seen order.
pub fn frequency_table(records: &[Record], field: &str) -> IndexMap<Scalar, usize> {
    let mut table: IndexMap<Scalar, usize> = IndexMap::new();

    for value in records.iter().filter_map(|r| r.get(field)) {
        *table.entry(value.clone()).or_default() += 1;
    }

    table
}

/// Order a frequency table by descending count.
///
/// The sort is stable, so values with equal counts keep the order in which
/// they were first seen.
pub fn rank_by_count(table: &IndexMap<Scalar, usize>) -> Vec<RankedEntry> {
    let mut ranked: Vec<RankedEntry> = table
        .iter()
        .map(|(value, count)| RankedEntry::new(value.clone(), *count))
        .collect();

    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}

/// The `limit` most frequent values of `field`.
pub fn most_frequent_entries(records: &[Record], field: &str, limit: usize) -> Vec<RankedEntry> {
    let mut ranked = rank_by_count(&frequency_table(records, field));
    ranked.truncate(limit);
    ranked
}

/// Summary statistics over the numeric values of `field`.
///
/// Values that cannot be read as numbers are dropped without complaint.
/// Returns `None` when no numeric value remains.
pub fn calculate_statistics(records: &[Record], field: &str) -> Option<StatisticsSummary> {
    let mut values: Vec<f64> = records
        .iter()
        .filter_map(|r| r.get(field))
        .filter_map(Scalar::as_number)
        .collect();

    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let average = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - average).powi(2)).sum::<f64>() / n;

    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    let median = if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    };

    Some(StatisticsSummary {
        average: round2(average),
        maximum: values[values.len() - 1],
        minimum: values[0],
        median,
        standard_deviation: round2(variance.sqrt()),
    })
}

/// The single most frequent value of `field`.
///
/// Ties go to the value that was seen first.
pub fn most_common_value(records: &[Record], field: &str) -> Option<Scalar> {
    let mut best: Option<(&Scalar, usize)> = None;
    let table = frequency_table(records, field);

    for (value, &count) in &table {
        if best.map_or(true, |(_, max)| count > max) {
            best = Some((value, count));
        }
    }

    best.map(|(value, _)| value.clone())
}

/// Most common value for each of `fields`, computed independently.
pub fn most_common_values(records: &[Record], fields: &[String]) -> Vec<MostCommonValue> {
    fields
        .iter()
        .map(|field| MostCommonValue {
            field: field.clone(),
            value: most_common_value(records, field),
        })
        .collect()
}

/// Statistics over how many records each value of `field` has.
///
/// Returns `None` when no record carries the field.
pub fn job_posting_analysis(records: &[Record], field: &str) -> Option<PostingAnalysis> {
    let counter = frequency_table(records, field);
    if counter.is_empty() {
        return None;
    }

    let counts: Vec<usize> = counter.values().copied().collect();
    let total: usize = counts.iter().sum();
    let n = counts.len() as f64;
    let average = total as f64 / n;
    let variance = counts
        .iter()
        .map(|&c| (c as f64 - average).powi(2))
        .sum::<f64>()
        / n;

    Some(PostingAnalysis {
        total_postings: total,
        average: round2(average),
        minimum: counts.iter().copied().min().unwrap_or(0),
        maximum: counts.iter().copied().max().unwrap_or(0),
        standard_deviation: round2(variance.sqrt()),
        organization_counter: counter,
    })
}

/// Count values of `count_field` among records whose `match_field`
/// equals `match_value`.
pub fn count_values_where(
    records: &[Record],
    match_field: &str,
    match_value: &Scalar,
    count_field: &str,
) -> IndexMap<Scalar, usize> {
    let mut table: IndexMap<Scalar, usize> = IndexMap::new();

    for record in records {
        if record.get(match_field) != Some(match_value) {
            continue;
        }
        if let Some(value) = record.get(count_field) {
            *table.entry(value.clone()).or_default() += 1;
        }
    }

    table
}

/// Round to 2 decimal places. An exact half goes to the even neighbour,
/// so a mean of 1.125 becomes 1.12.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
