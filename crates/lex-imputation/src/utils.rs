//! Shared utilities for the imputation engine.
//!
//! This module contains string parsing helpers used by type sniffing and
//! the small statistics (median, mode, variance) shared by the estimators.

use crate::types::Value;
use std::collections::{BTreeMap, HashMap};

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Formatting characters stripped before a cell is parsed as a number.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Strip currency, percent and grouping characters from a cell,
/// e.g. `"£2,500"` becomes `"2500"`.
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Try to parse a string as a finite numeric value (f64).
///
/// Accepts cells such as `"12.5%"` or `"$3,100"`; non-finite results are rejected.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

// =============================================================================
// Boolean Detection Utilities
// =============================================================================

/// Spellings read as `true`.
pub const BOOLEAN_TRUE_VALUES: [&str; 5] = ["true", "yes", "t", "y", "on"];

/// Spellings read as `false`.
pub const BOOLEAN_FALSE_VALUES: [&str; 5] = ["false", "no", "f", "n", "off"];

/// Parse a boolean string such as `"Yes"` or `"off"`.
pub fn parse_boolean_string(s: &str) -> Option<bool> {
    let lower = s.trim().to_ascii_lowercase();
    if BOOLEAN_TRUE_VALUES.contains(&lower.as_str()) {
        Some(true)
    } else if BOOLEAN_FALSE_VALUES.contains(&lower.as_str()) {
        Some(false)
    } else {
        None
    }
}

// =============================================================================
// Statistics Utilities
// =============================================================================

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population variance; `None` for an empty slice.
pub fn variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64)
}

/// Midpoint median of a set of values.
///
/// Averages the two order statistics straddling the midpoint,
/// `(s[n/2 - 1] + s[n/2]) / 2`, for any `n >= 2`; a single value is returned
/// as-is. For `[1, 2, 3, 5, 6, 7, 8, 9, 10]` this yields `5.5`.
pub fn midpoint_median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    match sorted.len() {
        0 => None,
        1 => Some(sorted[0]),
        n => {
            sorted.sort_by(|a, b| a.total_cmp(b));
            let mid = n / 2;
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        }
    }
}

/// Most frequent non-missing value.
///
/// Values are compared by [`Value::category_key`]; ties go to the value seen
/// first, which keeps the result independent of hash ordering.
pub fn mode<'a>(values: impl IntoIterator<Item = &'a Value>) -> Option<Value> {
    weighted_mode(values.into_iter().map(|v| (v, 1.0)))
}

/// Value with the largest accumulated weight; ties go to the value seen first.
pub fn weighted_mode<'a>(values: impl IntoIterator<Item = (&'a Value, f64)>) -> Option<Value> {
    let mut order: Vec<(String, &'a Value)> = Vec::new();
    let mut weights: HashMap<String, f64> = HashMap::new();

    for (value, weight) in values {
        let Some(key) = value.category_key() else {
            continue;
        };
        if !weights.contains_key(&key) {
            order.push((key.clone(), value));
        }
        *weights.entry(key).or_insert(0.0) += weight;
    }

    let mut best: Option<(&'a Value, f64)> = None;
    for (key, value) in &order {
        let weight = weights[key];
        if best.is_none_or(|(_, w)| weight > w) {
            best = Some((value, weight));
        }
    }
    best.map(|(value, _)| value.clone())
}

/// Gini impurity of a set of categorical values.
///
/// Class shares are summed in key order, so equal inputs give bit-identical
/// results.
pub fn gini_impurity<'a>(values: impl IntoIterator<Item = &'a Value>) -> f64 {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total = 0usize;
    for key in values.into_iter().filter_map(Value::category_key) {
        *counts.entry(key).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }
    1.0 - counts
        .values()
        .map(|&c| (c as f64 / total as f64).powi(2))
        .sum::<f64>()
}

// =============================================================================
// Tests
// =============================================================================
