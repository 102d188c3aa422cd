//! Data models for record analysis.
//!
//! This module contains the record representation consumed by the
//! aggregator and filter engine, and the report structures produced
//! by the pipeline and rendered by the report generators.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single field value.
///
/// Records are flat: nested JSON arrays and objects are kept as their
/// compact JSON text, booleans as `"true"` / `"false"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Number(f64),
    Text(String),
}

impl Scalar {
    /// Convenience constructor for text values.
    pub fn text(s: impl Into<String>) -> Self {
        Scalar::Text(s.into())
    }

    /// Returns the text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Best-effort numeric coercion.
    ///
    /// Numbers pass through, text is trimmed and parsed. Null, unparsable
    /// text and non-finite results yield `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Scalar::Null => None,
        }
    }

    /// Parse a command-line value: JSON literals (`120`, `null`, `"120"`)
    /// keep their type, anything else is taken as text.
    pub fn parse_literal(raw: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(value @ (serde_json::Value::Null
            | serde_json::Value::Number(_)
            | serde_json::Value::String(_))) => Scalar::from(value),
            _ => Scalar::Text(raw.to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Scalar::Null => 0,
            Scalar::Number(_) => 1,
            Scalar::Text(_) => 2,
        }
    }

    // -0.0 and 0.0 must hash and compare alike.
    fn number_bits(n: f64) -> u64 {
        if n == 0.0 {
            0.0f64.to_bits()
        } else {
            n.to_bits()
        }
    }
}

impl From<serde_json::Value> for Scalar {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Scalar::Null,
            serde_json::Value::Bool(b) => Scalar::Text(b.to_string()),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => Scalar::Number(f),
                None => Scalar::Text(n.to_string()),
            },
            serde_json::Value::String(s) => Scalar::Text(s),
            nested => Scalar::Text(nested.to_string()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::Number(a), Scalar::Number(b)) => {
                Self::number_bits(*a) == Self::number_bits(*b)
            }
            (Scalar::Text(a), Scalar::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Scalar::Null => {}
            Scalar::Number(n) => Self::number_bits(*n).hash(state),
            Scalar::Text(s) => s.hash(state),
        }
    }
}

impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Scalar::Number(a), Scalar::Number(b)) => {
                if self == other {
                    Ordering::Equal
                } else {
                    a.total_cmp(b)
                }
            }
            (Scalar::Text(a), Scalar::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.pad(""),
            Scalar::Number(n) => f.pad(&format_number(*n)),
            Scalar::Text(s) => f.pad(s),
        }
    }
}

/// Render a number the way reports show unrounded values: integral values
/// without a fractional part, everything else in shortest form.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Render a computed float with at least one fractional digit, as in
/// `150.0` or `120.5`.
pub fn format_float(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e16 {
        format!("{:.1}", n)
    } else {
        format!("{}", n)
    }
}

/// One input record: field name to value, in source order.
pub type Record = IndexMap<String, Scalar>;

/// A value together with its number of occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub value: Scalar,
    pub count: usize,
}

impl RankedEntry {
    pub fn new(value: impl Into<Scalar>, count: usize) -> Self {
        Self {
            value: value.into(),
            count,
        }
    }
}

/// Descriptive statistics over the numeric values of one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSummary {
    /// Arithmetic mean, rounded to 2 decimals.
    pub average: f64,
    pub maximum: f64,
    pub minimum: f64,
    pub median: f64,
    /// Population standard deviation, rounded to 2 decimals.
    pub standard_deviation: f64,
}

impl StatisticsSummary {
    /// Rows in report order: label and rendered value.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Average", format!("{:.2}", self.average)),
            ("Maximum", format_float(self.maximum)),
            ("Minimum", format_float(self.minimum)),
            ("Median", format_float(self.median)),
            ("Standard deviation", format!("{:.2}", self.standard_deviation)),
        ]
    }
}

/// Date range plus equality constraints, all of which must hold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRangePredicate {
    pub date_field: String,
    /// Inclusive lower bound, compared as a string.
    pub start: String,
    /// Inclusive upper bound, compared as a string.
    pub end: String,
    pub equals: Vec<(String, Scalar)>,
}

impl DateRangePredicate {
    pub fn new(
        date_field: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Self {
            date_field: date_field.into(),
            start: start.into(),
            end: end.into(),
            equals: Vec::new(),
        }
    }

    /// Add an equality constraint.
    pub fn with_equal(mut self, field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.equals.push((field.into(), value.into()));
        self
    }
}

/// Statistics over per-category counts (how many postings each
/// organization has), not over a numeric field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostingAnalysis {
    pub total_postings: usize,
    /// Mean postings per category, rounded to 2 decimals.
    pub average: f64,
    pub minimum: usize,
    pub maximum: usize,
    /// Population standard deviation of the counts, rounded to 2 decimals.
    pub standard_deviation: f64,
    #[serde(skip)]
    pub organization_counter: IndexMap<Scalar, usize>,
}

/// A non-fatal note about a record left out of a computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Position of the record in the input collection.
    pub record_index: usize,
    pub field: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "record {}: field '{}': {}",
            self.record_index, self.field, self.message
        )
    }
}

/// Records partitioned by whether their deadline has passed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeadlineSummary {
    pub expired: Vec<Record>,
    pub open: Vec<Record>,
    /// Records in neither bucket (missing or unparsable date).
    pub skipped: Vec<Diagnostic>,
}

impl DeadlineSummary {
    pub fn expired_count(&self) -> usize {
        self.expired.len()
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }
}

/// Most common value of one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MostCommonValue {
    pub field: String,
    pub value: Option<Scalar>,
}

/// Ranked values of one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencySection {
    pub field: String,
    pub entries: Vec<RankedEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSection {
    pub field: String,
    pub summary: StatisticsSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostingSection {
    pub field: String,
    pub analysis: PostingAnalysis,
}

/// Records that passed the date-range filter, with the columns to show.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredSection {
    pub predicate: DateRangePredicate,
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

/// Value counts of one field restricted to one organization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleCountSection {
    pub field: String,
    pub organization: Scalar,
    pub counts: Vec<RankedEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeadlineSection {
    pub field: String,
    pub today: NaiveDate,
    pub expired_count: usize,
    pub open_count: usize,
    pub skipped_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniqueSection {
    pub field: String,
    /// Heading text, e.g. `Group IDs` in "All Unique Group IDs:".
    pub label: String,
    pub values: Vec<Scalar>,
}

/// The complete analysis of one record collection.
///
/// Sections are optional; each renderer emits the present ones in a
/// fixed order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub total_entries: usize,
    pub most_common: Vec<MostCommonValue>,
    pub frequent: Option<FrequencySection>,
    pub statistics: Option<StatisticsSection>,
    pub posting_analysis: Option<PostingSection>,
    pub ranking: Option<FrequencySection>,
    pub filtered: Option<FilteredSection>,
    pub title_counts: Option<TitleCountSection>,
    pub deadlines: Option<DeadlineSection>,
    /// Derived counts, e.g. number of filtered entries.
    pub counts: IndexMap<String, usize>,
    pub unique: Option<UniqueSection>,
}

/// Turn a field name into a column heading: `area` becomes `Area`.
pub fn heading(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_from_json() {
        assert_eq!(Scalar::from(json!(null)), Scalar::Null);
        assert_eq!(Scalar::from(json!(120)), Scalar::Number(120.0));
        assert_eq!(Scalar::from(json!("OG10")), Scalar::text("OG10"));
        assert_eq!(Scalar::from(json!(true)), Scalar::text("true"));
        assert_eq!(Scalar::from(json!([1, 2])), Scalar::text("[1,2]"));
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::Number(150.0).to_string(), "150");
        assert_eq!(Scalar::Number(120.5).to_string(), "120.5");
        assert_eq!(Scalar::Null.to_string(), "");
        assert_eq!(format!("{:>6}", Scalar::text("ab")), "    ab");
        assert_eq!(format!("{:<4}|", Scalar::Number(7.0)), "7   |");
    }

    #[test]
    fn test_scalar_coercion() {
        assert_eq!(Scalar::Number(90.0).as_number(), Some(90.0));
        assert_eq!(Scalar::text(" 12.5 ").as_number(), Some(12.5));
        assert_eq!(Scalar::text("n/a").as_number(), None);
        assert_eq!(Scalar::text("NaN").as_number(), None);
        assert_eq!(Scalar::Null.as_number(), None);
    }

    #[test]
    fn test_scalar_ordering() {
        let mut values = vec![
            Scalar::text("OG23"),
            Scalar::Number(3.0),
            Scalar::Null,
            Scalar::text("OG10"),
            Scalar::Number(-1.0),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Scalar::Null,
                Scalar::Number(-1.0),
                Scalar::Number(3.0),
                Scalar::text("OG10"),
                Scalar::text("OG23"),
            ]
        );
        assert_eq!(Scalar::Number(0.0), Scalar::Number(-0.0));
        assert_eq!(Scalar::Number(0.0).cmp(&Scalar::Number(-0.0)), Ordering::Equal);
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(Scalar::parse_literal("120"), Scalar::Number(120.0));
        assert_eq!(Scalar::parse_literal("\"120\""), Scalar::text("120"));
        assert_eq!(Scalar::parse_literal("OG10"), Scalar::text("OG10"));
        assert_eq!(Scalar::parse_literal("null"), Scalar::Null);
        assert_eq!(Scalar::parse_literal("true"), Scalar::text("true"));
    }

    #[test]
    fn test_statistics_rows() {
        let summary = StatisticsSummary {
            average: 120.0,
            maximum: 150.0,
            minimum: 90.0,
            median: 120.0,
            standard_deviation: 24.49,
        };
        let rows = summary.rows();
        assert_eq!(rows[0], ("Average", "120.00".to_string()));
        assert_eq!(rows[1], ("Maximum", "150.0".to_string()));
        assert_eq!(rows[3], ("Median", "120.0".to_string()));
        assert_eq!(rows[4], ("Standard deviation", "24.49".to_string()));
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(150.0), "150.0");
        assert_eq!(format_float(-3.0), "-3.0");
        assert_eq!(format_float(120.5), "120.5");
        assert_eq!(format_float(0.25), "0.25");
    }

    #[test]
    fn test_heading() {
        assert_eq!(heading("area"), "Area");
        assert_eq!(heading("groupId"), "GroupId");
        assert_eq!(heading(""), "");
    }
}
