//! Missing-data pattern diagnosis.
//!
//! For every field with at least one missing cell the diagnostician measures
//! how its missingness overlaps with other fields and which fields are usable
//! as predictors, then classifies the pattern. The [`selector`] turns the
//! patterns into a suggested estimator and human-readable recommendations.

mod selector;

pub use selector::{recommendations, suggest_method};

use crate::profiler::percentage;
use crate::quality::confidence;
use crate::types::{Dataset, Diagnosis, MissingDataPattern, PatternKind};
use tracing::{debug, info};

/// Share of a field's missing rows that must also be missing in another field
/// for the two to count as correlated.
pub const CORRELATION_RATIO: f64 = 0.3;

/// Missing percentage above which a field is classified as systematic.
pub const SYSTEMATIC_MISSING_PERCENTAGE: f64 = 50.0;

/// Minimum predictors for a field to count as randomly missing.
pub const MIN_PREDICTORS: usize = 2;

/// Diagnoses missingness patterns in a dataset.
pub struct MissingDataDiagnostician;

impl MissingDataDiagnostician {
    /// Analyze every field and suggest an estimator.
    pub fn diagnose(dataset: &Dataset) -> Diagnosis {
        let patterns: Vec<MissingDataPattern> = dataset
            .fields()
            .iter()
            .filter(|field| dataset.missing_count(field) > 0)
            .map(|field| Self::analyze_field(dataset, field))
            .collect();

        let suggested_method = suggest_method(&patterns);
        let recommendations = recommendations(&patterns, &suggested_method);

        info!(
            "Diagnosed {} field(s) with missing data, suggested method: {}",
            patterns.len(),
            suggested_method
        );

        Diagnosis {
            patterns,
            recommendations,
            suggested_method,
        }
    }

    fn analyze_field(dataset: &Dataset, field: &str) -> MissingDataPattern {
        let missing_count = dataset.missing_count(field);
        let missing_percentage = percentage(missing_count, dataset.len());
        let correlated_with = correlated_fields(dataset, field);
        let predictors = predictor_fields(dataset, field);

        let pattern = if !correlated_with.is_empty() {
            PatternKind::Correlated
        } else if missing_percentage > SYSTEMATIC_MISSING_PERCENTAGE
            || predictors.len() < MIN_PREDICTORS
        {
            PatternKind::Systematic
        } else {
            PatternKind::Random
        };

        debug!(
            "Field '{}': {} missing ({:.1}%), pattern {:?}, {} predictor(s)",
            field,
            missing_count,
            missing_percentage,
            pattern,
            predictors.len()
        );

        MissingDataPattern {
            field: field.to_string(),
            missing_count,
            missing_percentage,
            pattern,
            correlated_with,
            confidence: confidence::diagnosis(predictors.len(), dataset.width()),
            predictors,
        }
    }
}

/// Other fields missing in at least [`CORRELATION_RATIO`] of the rows where
/// `field` is missing.
pub(crate) fn correlated_fields(dataset: &Dataset, field: &str) -> Vec<String> {
    let missing_rows = dataset.missing_rows(field);
    if missing_rows.is_empty() {
        return Vec::new();
    }

    dataset
        .fields()
        .iter()
        .filter(|other| other.as_str() != field)
        .filter(|other| {
            let shared = missing_rows
                .iter()
                .filter(|&&row| dataset.is_missing(row, other))
                .count();
            shared as f64 / missing_rows.len() as f64 >= CORRELATION_RATIO
        })
        .cloned()
        .collect()
}

/// Other fields present in more than half of the rows where `field` is
/// present.
pub(crate) fn predictor_fields(dataset: &Dataset, field: &str) -> Vec<String> {
    let present_rows: Vec<usize> = (0..dataset.len())
        .filter(|&row| !dataset.is_missing(row, field))
        .collect();

    dataset
        .fields()
        .iter()
        .filter(|other| other.as_str() != field)
        .filter(|other| {
            let joint = present_rows
                .iter()
                .filter(|&&row| !dataset.is_missing(row, other))
                .count();
            joint * 2 > present_rows.len()
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImputationMethod;
    use crate::types::{Record, Value};

    fn dataset(rows: &[&[(&str, Value)]]) -> Dataset {
        Dataset::from_records(
            rows.iter()
                .map(|pairs| {
                    pairs
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.clone()))
                        .collect::<Record>()
                })
                .collect(),
        )
    }

    fn n(x: f64) -> Value {
        Value::Number(x)
    }

    #[test]
    fn test_complete_data_suggests_none() {
        let ds = dataset(&[&[("a", n(1.0)), ("b", n(2.0))], &[("a", n(3.0)), ("b", n(4.0))]]);
        let diagnosis = MissingDataDiagnostician::diagnose(&ds);

        assert!(diagnosis.patterns.is_empty());
        assert_eq!(diagnosis.suggested_method, ImputationMethod::None);
    }

    #[test]
    fn test_correlated_fields() {
        let ds = dataset(&[
            &[("a", Value::Missing), ("b", Value::Missing), ("c", n(1.0))],
            &[("a", n(2.0)), ("b", n(2.0)), ("c", n(2.0))],
            &[("a", n(3.0)), ("b", n(3.0)), ("c", n(3.0))],
        ]);

        assert_eq!(correlated_fields(&ds, "a"), vec!["b".to_string()]);
        assert!(correlated_fields(&ds, "c").is_empty());

        let diagnosis = MissingDataDiagnostician::diagnose(&ds);
        let a = &diagnosis.patterns[0];
        assert_eq!(a.pattern, PatternKind::Correlated);
        assert_eq!(diagnosis.suggested_method, ImputationMethod::RandomForest);
    }

    #[test]
    fn test_predictor_fields_require_majority_overlap() {
        let ds = dataset(&[
            &[("y", n(1.0)), ("x", n(1.0)), ("z", Value::Missing)],
            &[("y", n(2.0)), ("x", n(2.0)), ("z", Value::Missing)],
            &[("y", n(3.0)), ("x", Value::Missing), ("z", n(3.0))],
            &[("y", Value::Missing), ("x", n(4.0)), ("z", n(4.0))],
        ]);

        // y is present in rows 0..3; x joins it in two of three, z in one.
        assert_eq!(predictor_fields(&ds, "y"), vec!["x".to_string()]);
    }

    #[test]
    fn test_systematic_when_few_predictors() {
        let ds = dataset(&[
            &[("a", n(1.0)), ("b", n(1.0))],
            &[("a", n(2.0)), ("b", n(2.0))],
            &[("a", n(3.0)), ("b", n(3.0))],
            &[("a", n(4.0)), ("b", n(4.0))],
            &[("a", Value::Missing), ("b", n(5.0))],
        ]);
        let diagnosis = MissingDataDiagnostician::diagnose(&ds);
        let a = &diagnosis.patterns[0];

        assert_eq!(a.missing_count, 1);
        assert!((a.missing_percentage - 20.0).abs() < 1e-9);
        assert_eq!(a.predictors, vec!["b".to_string()]);
        assert_eq!(a.pattern, PatternKind::Systematic);
        assert!((a.confidence - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_random_pattern() {
        let mut rows: Vec<Vec<(&str, Value)>> = (0..11)
            .map(|i| {
                let x = i as f64;
                vec![("a", n(x)), ("b", n(x * 2.0)), ("c", n(x + 1.0))]
            })
            .collect();
        rows[4][0].1 = Value::Missing;
        let refs: Vec<&[(&str, Value)]> = rows.iter().map(|r| r.as_slice()).collect();
        let diagnosis = MissingDataDiagnostician::diagnose(&dataset(&refs));

        assert_eq!(diagnosis.patterns.len(), 1);
        assert_eq!(diagnosis.patterns[0].pattern, PatternKind::Random);
        assert_eq!(diagnosis.suggested_method, ImputationMethod::MeanMedian);
    }

    #[test]
    fn test_diagnosis_confidence_bounds() {
        let ds = dataset(&[&[("a", Value::Missing)], &[("a", n(1.0))]]);
        let diagnosis = MissingDataDiagnostician::diagnose(&ds);
        assert_eq!(diagnosis.patterns[0].confidence, confidence::DIAGNOSIS_FLOOR);
    }

    #[test]
    fn test_single_predictor_among_many_fields() {
        let sparse = ["f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8"];
        let mut rows: Vec<Vec<(&str, Value)>> = (0..3)
            .map(|i| {
                let mut row = vec![("t", n(i as f64)), ("p", n(i as f64))];
                row.extend(sparse.iter().map(|f| (*f, Value::Missing)));
                row
            })
            .collect();
        let mut last = vec![("t", Value::Missing), ("p", n(3.0))];
        last.extend(sparse.iter().map(|f| (*f, n(1.0))));
        rows.push(last);

        let refs: Vec<&[(&str, Value)]> = rows.iter().map(|r| r.as_slice()).collect();
        let ds = dataset(&refs);
        let diagnosis = MissingDataDiagnostician::diagnose(&ds);
        let t = diagnosis
            .patterns
            .iter()
            .find(|p| p.field == "t")
            .expect("t is incomplete");

        assert_eq!(ds.width(), 10);
        assert_eq!(t.predictors, vec!["p".to_string()]);
        assert!((t.confidence - 0.2).abs() < 1e-12);
    }
}
