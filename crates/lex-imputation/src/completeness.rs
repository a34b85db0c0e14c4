//! Data completeness analysis before and after imputation.
//!
//! Grades how complete the original data was and whether downstream work
//! should proceed on the imputed result.

use crate::profiler::percentage;
use crate::types::{Dataset, ImputedFieldRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Original completeness (%) at or above which data is excellent.
pub const EXCELLENT_COMPLETENESS: f64 = 90.0;

/// Original completeness (%) at or above which data is good.
pub const GOOD_COMPLETENESS: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Excellent,
    Good,
    Warning,
    Critical,
}

impl QualityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProceedRecommendation {
    Proceed,
    Caution,
    Stop,
}

impl ProceedRecommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proceed => "proceed",
            Self::Caution => "caution",
            Self::Stop => "stop",
        }
    }
}

/// Completeness of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCompleteness {
    pub field: String,
    pub original_missing: usize,
    pub imputed: usize,
    pub final_missing: usize,
    pub original_completeness: f64,
    pub final_completeness: f64,
}

/// Completeness summary of a dataset, optionally after imputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataCompletenessMetrics {
    pub total_cells: usize,
    pub original_missing_cells: usize,
    pub imputed_cells: usize,
    pub final_missing_cells: usize,
    pub original_completeness: f64,
    pub final_completeness: f64,
    /// Share of all cells that were synthesized (0 - 100).
    pub imputed_percentage: f64,
    pub field_breakdown: Vec<FieldCompleteness>,
    /// Mean confidence of the imputed cells; 0 when nothing was imputed.
    pub average_imputed_confidence: f64,
    pub quality_level: QualityLevel,
    pub proceed_recommendation: ProceedRecommendation,
    pub messages: Vec<String>,
}

/// Completeness of a dataset as received.
pub fn analyze_original_completeness(dataset: &Dataset) -> DataCompletenessMetrics {
    build_metrics(dataset, dataset, &BTreeMap::new(), None)
}

/// Completeness after imputation.
///
/// Only the fields of `original` are considered, so marker fields added by
/// the engine do not count. Records whose row index is outside `original`
/// are ignored.
pub fn analyze_post_imputation_completeness(
    original: &Dataset,
    imputed: &Dataset,
    imputed_fields: &[ImputedFieldRecord],
    confidence_threshold: f64,
) -> DataCompletenessMetrics {
    let mut per_field: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in imputed_fields {
        if record.row_index >= original.len() {
            warn!(
                "Ignoring imputed record for '{}' at row {}: dataset has {} rows",
                record.field,
                record.row_index,
                original.len()
            );
            continue;
        }
        per_field
            .entry(record.field.as_str())
            .or_default()
            .push(record.confidence);
    }

    build_metrics(original, imputed, &per_field, Some(confidence_threshold))
}

fn build_metrics(
    original: &Dataset,
    imputed: &Dataset,
    per_field: &BTreeMap<&str, Vec<f64>>,
    confidence_threshold: Option<f64>,
) -> DataCompletenessMetrics {
    let rows = original.len();
    let total_cells = rows * original.width();

    let field_breakdown: Vec<FieldCompleteness> = original
        .fields()
        .iter()
        .map(|field| {
            let original_missing = original.missing_count(field);
            let final_missing = imputed.missing_count(field);
            FieldCompleteness {
                field: field.clone(),
                original_missing,
                imputed: per_field.get(field.as_str()).map_or(0, Vec::len),
                final_missing,
                original_completeness: 100.0 - percentage(original_missing, rows),
                final_completeness: 100.0 - percentage(final_missing, rows),
            }
        })
        .collect();

    let original_missing_cells: usize = field_breakdown.iter().map(|f| f.original_missing).sum();
    let final_missing_cells: usize = field_breakdown.iter().map(|f| f.final_missing).sum();
    let confidences: Vec<f64> = per_field.values().flatten().copied().collect();
    let imputed_cells = confidences.len();
    let average_imputed_confidence = crate::utils::mean(&confidences).unwrap_or_default();

    let original_completeness = 100.0 - percentage(original_missing_cells, total_cells);
    let final_completeness = 100.0 - percentage(final_missing_cells, total_cells);

    let quality_level = if total_cells == 0 {
        QualityLevel::Critical
    } else if original_completeness >= EXCELLENT_COMPLETENESS {
        QualityLevel::Excellent
    } else if original_completeness >= GOOD_COMPLETENESS {
        QualityLevel::Good
    } else if final_missing_cells == 0 {
        QualityLevel::Warning
    } else {
        QualityLevel::Critical
    };

    let low_confidence = confidence_threshold
        .is_some_and(|threshold| imputed_cells > 0 && average_imputed_confidence < threshold);

    let proceed_recommendation = match quality_level {
        QualityLevel::Excellent | QualityLevel::Good if low_confidence => {
            ProceedRecommendation::Caution
        }
        QualityLevel::Excellent | QualityLevel::Good => ProceedRecommendation::Proceed,
        QualityLevel::Warning => ProceedRecommendation::Caution,
        QualityLevel::Critical => ProceedRecommendation::Stop,
    };

    let mut messages = Vec::new();
    if total_cells == 0 {
        messages.push("Dataset has no cells to analyze".to_string());
    } else {
        messages.push(format!(
            "Original data is {:.1}% complete ({} of {} cells missing)",
            original_completeness, original_missing_cells, total_cells
        ));
    }
    if imputed_cells > 0 {
        messages.push(format!(
            "{} cell(s) imputed ({:.1}% of all cells), average confidence {:.2}",
            imputed_cells,
            percentage(imputed_cells, total_cells),
            average_imputed_confidence
        ));
    }
    if final_missing_cells > 0 {
        messages.push(format!("{} cell(s) are still missing", final_missing_cells));
    }
    if low_confidence && let Some(threshold) = confidence_threshold {
        messages.push(format!(
            "Average imputed confidence {:.2} is below the threshold {:.2}",
            average_imputed_confidence, threshold
        ));
    }
    messages.push(
        match quality_level {
            QualityLevel::Excellent => "Data completeness is excellent",
            QualityLevel::Good => "Data completeness is good",
            QualityLevel::Warning => {
                "Much of the data is imputed; treat results built on it with care"
            }
            QualityLevel::Critical => "Data is too incomplete to rely on",
        }
        .to_string(),
    );

    DataCompletenessMetrics {
        total_cells,
        original_missing_cells,
        imputed_cells,
        final_missing_cells,
        original_completeness,
        final_completeness,
        imputed_percentage: percentage(imputed_cells, total_cells),
        field_breakdown,
        average_imputed_confidence,
        quality_level,
        proceed_recommendation,
        messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImputationMethod;
    use crate::types::{Record, Value};

    fn column(values: &[Option<f64>]) -> Dataset {
        Dataset::from_records(
            values
                .iter()
                .map(|v| {
                    let mut record = Record::new();
                    record.insert("x".to_string(), Value::from(*v));
                    record
                })
                .collect(),
        )
    }

    fn record(row: usize, confidence: f64) -> ImputedFieldRecord {
        ImputedFieldRecord {
            field: "x".to_string(),
            original_value: Value::Missing,
            imputed_value: Value::Number(0.0),
            confidence,
            method: ImputationMethod::MeanMedian,
            row_index: row,
        }
    }

    #[test]
    fn test_original_excellent() {
        let mut values = vec![Some(1.0); 10];
        values[0] = None;
        let metrics = analyze_original_completeness(&column(&values));

        assert_eq!(metrics.total_cells, 10);
        assert_eq!(metrics.original_missing_cells, 1);
        assert!((metrics.original_completeness - 90.0).abs() < 1e-9);
        assert_eq!(metrics.quality_level, QualityLevel::Excellent);
        assert_eq!(metrics.proceed_recommendation, ProceedRecommendation::Proceed);
    }

    #[test]
    fn test_original_critical() {
        let metrics = analyze_original_completeness(&column(&[Some(1.0), None, None, None]));
        assert_eq!(metrics.quality_level, QualityLevel::Critical);
        assert_eq!(metrics.proceed_recommendation, ProceedRecommendation::Stop);
    }

    #[test]
    fn test_post_imputation_warning() {
        let original = column(&[Some(1.0), None, None, Some(2.0)]);
        let imputed = column(&[Some(1.0), Some(1.5), Some(1.5), Some(2.0)]);
        let metrics = analyze_post_imputation_completeness(
            &original,
            &imputed,
            &[record(1, 0.6), record(2, 0.6)],
            0.7,
        );

        assert_eq!(metrics.imputed_cells, 2);
        assert_eq!(metrics.final_missing_cells, 0);
        assert!((metrics.final_completeness - 100.0).abs() < 1e-9);
        assert!((metrics.imputed_percentage - 50.0).abs() < 1e-9);
        assert_eq!(metrics.quality_level, QualityLevel::Warning);
        assert_eq!(metrics.proceed_recommendation, ProceedRecommendation::Caution);
        assert_eq!(metrics.field_breakdown[0].imputed, 2);
    }

    #[test]
    fn test_good_downgraded_by_low_confidence() {
        let mut values = vec![Some(1.0); 5];
        values[4] = None;
        let original = column(&values);
        let imputed = column(&[Some(1.0); 5]);

        let low =
            analyze_post_imputation_completeness(&original, &imputed, &[record(4, 0.5)], 0.7);
        assert_eq!(low.quality_level, QualityLevel::Good);
        assert_eq!(low.proceed_recommendation, ProceedRecommendation::Caution);

        let high =
            analyze_post_imputation_completeness(&original, &imputed, &[record(4, 0.9)], 0.7);
        assert_eq!(high.proceed_recommendation, ProceedRecommendation::Proceed);
    }

    #[test]
    fn test_out_of_range_records_ignored() {
        let original = column(&[Some(1.0), None]);
        let imputed = column(&[Some(1.0), Some(1.0)]);
        let metrics = analyze_post_imputation_completeness(
            &original,
            &imputed,
            &[record(1, 0.6), record(7, 0.6)],
            0.7,
        );
        assert_eq!(metrics.imputed_cells, 1);
    }

    #[test]
    fn test_average_confidence_is_stable() {
        let fields = ["a", "b", "c", "d", "e", "f"];
        let row: Record = fields
            .iter()
            .map(|f| (f.to_string(), Value::Missing))
            .collect();
        let original = Dataset::from_records(vec![row]);
        let imputed = Dataset::from_records(vec![
            fields
                .iter()
                .map(|f| (f.to_string(), Value::Number(1.0)))
                .collect(),
        ]);
        let records: Vec<ImputedFieldRecord> = fields
            .iter()
            .zip([0.1, 0.7, 0.2, 0.3, 0.9, 0.6])
            .map(|(f, c)| ImputedFieldRecord {
                field: f.to_string(),
                ..record(0, c)
            })
            .collect();

        let first = analyze_post_imputation_completeness(&original, &imputed, &records, 0.7);
        for _ in 0..20 {
            let again = analyze_post_imputation_completeness(&original, &imputed, &records, 0.7);
            assert_eq!(
                again.average_imputed_confidence.to_bits(),
                first.average_imputed_confidence.to_bits()
            );
        }
    }

    #[test]
    fn test_marker_fields_ignored() {
        let original = column(&[Some(1.0), None]);
        let mut imputed = column(&[Some(1.0), Some(1.0)]);
        imputed.set(1, "x_imputed", Value::Bool(true));

        let metrics =
            analyze_post_imputation_completeness(&original, &imputed, &[record(1, 0.6)], 0.5);
        assert_eq!(metrics.total_cells, 2);
        assert_eq!(metrics.final_missing_cells, 0);
    }
}
