//! Record selection: date-range filtering, deadline classification and
//! unique-value extraction.

use crate::models::{DateRangePredicate, DeadlineSummary, Diagnostic, Record, Scalar};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Default calendar format for deadline fields.
pub const DEFAULT_DEADLINE_FORMAT: &str = "%Y-%m-%d";

/// Records whose date lies in the predicate's range and whose fields match
/// every equality constraint.
///
/// Dates are compared as strings, so bounds and values must share one
/// zero-padded format. A record missing any named field is dropped.
pub fn filter_by_date_and_fields(records: &[Record], predicate: &DateRangePredicate) -> Vec<Record> {
    records
        .iter()
        .filter(|record| matches_predicate(record, predicate))
        .cloned()
        .collect()
}

fn matches_predicate(record: &Record, predicate: &DateRangePredicate) -> bool {
    let Some(date) = record.get(&predicate.date_field).and_then(Scalar::as_text) else {
        return false;
    };

    if date < predicate.start.as_str() || date > predicate.end.as_str() {
        return false;
    }

    predicate
        .equals
        .iter()
        .all(|(field, expected)| record.get(field) == Some(expected))
}

/// Split records into expired and open by the date in `field`.
///
/// A deadline before `today` is expired; today or later is open. Records
/// with a missing or unparsable date land in neither bucket and are
/// reported in [`DeadlineSummary::skipped`].
pub fn check_application_deadlines(
    records: &[Record],
    field: &str,
    format: &str,
    today: NaiveDate,
) -> DeadlineSummary {
    let mut summary = DeadlineSummary::default();

    for (index, record) in records.iter().enumerate() {
        let skip = |message: String| Diagnostic {
            record_index: index,
            field: field.to_string(),
            message,
        };

        let raw = match record.get(field) {
            Some(Scalar::Text(s)) => s,
            Some(Scalar::Null) | None => {
                summary.skipped.push(skip("no date".to_string()));
                continue;
            }
            Some(other) => {
                summary
                    .skipped
                    .push(skip(format!("'{}' is not a date string", other)));
                continue;
            }
        };

        match NaiveDate::parse_from_str(raw.trim(), format) {
            Ok(date) if date < today => summary.expired.push(record.clone()),
            Ok(_) => summary.open.push(record.clone()),
            Err(e) => summary
                .skipped
                .push(skip(format!("cannot parse '{}' as {}: {}", raw, format, e))),
        }
    }

    summary
}

/// Distinct values of `field`, sorted.
pub fn unique_values(records: &[Record], field: &str) -> Vec<Scalar> {
    records
        .iter()
        .filter_map(|r| r.get(field))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Sorted distinct `groupId` values.
#[allow(dead_code)] // Convenience wrapper over unique_values
pub fn get_all_group_ids(records: &[Record]) -> Vec<Scalar> {
    unique_values(records, "groupId")
}
