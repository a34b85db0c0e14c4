//! Type inference logic for field analysis.

use crate::types::{FieldType, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

// Date pattern regexes - compiled once at startup
static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}$").expect("Invalid regex: YYYY-MM-DD"),
        Regex::new(r"^\d{1,2}[-/]\d{1,2}[-/]\d{4}$").expect("Invalid regex: MM-DD-YYYY"),
        Regex::new(r"^\d{4}-\d{2}-\d{2}\s\d{2}:\d{2}:\d{2}").expect("Invalid regex: datetime"),
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}").expect("Invalid regex: ISO"),
    ]
});

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%m-%d-%Y", "%d-%m-%Y",
];

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Unique ratio above which long strings are free text rather than categories.
const TEXT_UNIQUE_RATIO: f64 = 0.7;

/// Mean length above which high-cardinality strings are free text.
const TEXT_MIN_AVG_LENGTH: f64 = 30.0;

/// Check if a string is a real calendar date or datetime.
///
/// The string must match one of the known layouts and parse with `chrono`,
/// so `2024-13-45` is rejected.
pub(crate) fn is_date_string(s: &str) -> bool {
    let trimmed = s.trim();
    if !DATE_PATTERNS.iter().any(|re| re.is_match(trimmed)) {
        return false;
    }

    DATE_FORMATS
        .iter()
        .any(|fmt| NaiveDate::parse_from_str(trimmed, fmt).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).is_ok())
        || DateTime::parse_from_rfc3339(trimmed).is_ok()
}

/// Infer the semantic type of a field from its cell values.
///
/// Checks run from most to least specific: numeric, boolean, date, free
/// text, categorical. A field qualifies for a type only when *every*
/// non-missing value fits it.
pub(crate) fn infer_field_type<'a>(values: impl IntoIterator<Item = &'a Value>) -> FieldType {
    let present: Vec<&Value> = values.into_iter().filter(|v| !v.is_missing()).collect();
    if present.is_empty() {
        return FieldType::Empty;
    }

    // Check 1: Numeric - native numbers and numeric strings
    if present.iter().all(|v| v.as_f64().is_some()) {
        return FieldType::Numeric;
    }

    // Check 2: Boolean types (native and string representations)
    if present.iter().all(|v| v.as_bool().is_some()) {
        return FieldType::Boolean;
    }

    let texts: Vec<&str> = present
        .iter()
        .filter_map(|v| match v {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        })
        .collect();
    if texts.len() != present.len() {
        // Mixed scalar kinds behave as categories.
        return FieldType::Categorical;
    }

    // Check 3: Dates
    if texts.iter().all(|s| is_date_string(s)) {
        return FieldType::Date;
    }

    // Check 4: Free text vs categorical
    let unique: HashSet<&str> = texts.iter().map(|s| s.trim()).collect();
    let unique_ratio = unique.len() as f64 / texts.len() as f64;
    let avg_length =
        texts.iter().map(|s| s.trim().chars().count()).sum::<usize>() as f64 / texts.len() as f64;

    if unique_ratio > TEXT_UNIQUE_RATIO && avg_length > TEXT_MIN_AVG_LENGTH {
        FieldType::Text
    } else {
        FieldType::Categorical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(values: &[&str]) -> Vec<Value> {
        values.iter().map(|s| Value::from(*s)).collect()
    }

    #[test]
    fn test_empty_field() {
        let values = vec![Value::Missing, Value::from(""), Value::Number(f64::NAN)];
        assert_eq!(infer_field_type(&values), FieldType::Empty);
    }

    #[test]
    fn test_numeric_field_with_formatted_strings() {
        let values = vec![Value::Number(1.0), Value::from("$2,000"), Value::Missing];
        assert_eq!(infer_field_type(&values), FieldType::Numeric);
    }

    #[test]
    fn test_boolean_field() {
        let values = vec![Value::Bool(true), Value::from("no"), Value::Bool(false)];
        assert_eq!(infer_field_type(&values), FieldType::Boolean);
    }

    #[test]
    fn test_date_field() {
        let values = texts(&["2024-01-05", "2024-02-29", "2023-12-31 08:30:00"]);
        assert_eq!(infer_field_type(&values), FieldType::Date);
    }

    #[test]
    fn test_invalid_calendar_date_is_not_date() {
        assert!(is_date_string("2024-02-29"));
        assert!(is_date_string("2024-05-01T10:00:00Z"));
        assert!(!is_date_string("2024-13-45"));
        assert!(!is_date_string("hello"));
    }

    #[test]
    fn test_categorical_field() {
        let values = texts(&["red", "green", "red", "blue"]);
        assert_eq!(infer_field_type(&values), FieldType::Categorical);
    }

    #[test]
    fn test_free_text_field() {
        let values = texts(&[
            "The customer asked for a refund after the second delivery",
            "Package arrived damaged and the box was open on one side",
            "Requested a callback about the warranty extension options",
        ]);
        assert_eq!(infer_field_type(&values), FieldType::Text);
    }

    #[test]
    fn test_mixed_scalars_are_categorical() {
        let values = vec![Value::Number(1.0), Value::from("one"), Value::Bool(true)];
        assert_eq!(infer_field_type(&values), FieldType::Categorical);
    }
}
