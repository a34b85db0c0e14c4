//! Central-tendency imputation.
//!
//! Numeric fields take the midpoint median of their known values, all other
//! fields take the mode. Neither looks at other fields.

use super::{EstimatorOutput, Imputer, central_tendency, fillable_fields};
use crate::config::{ImputationConfig, ImputationMethod};
use crate::quality::confidence;
use crate::types::{Dataset, Schema};
use tracing::debug;

/// Median / mode imputer.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticalImputer;

impl Imputer for StatisticalImputer {
    fn method(&self) -> ImputationMethod {
        ImputationMethod::MeanMedian
    }

    fn impute(
        &self,
        dataset: &Dataset,
        schema: &Schema,
        _config: &ImputationConfig,
    ) -> EstimatorOutput {
        let mut output = EstimatorOutput::new(dataset);

        for field in fillable_fields(dataset, schema) {
            let Some(value) = central_tendency(dataset, schema, &field) else {
                debug!("No central tendency for '{}', skipping", field);
                continue;
            };

            let rows = dataset.missing_rows(&field);
            debug!("Filling {} cell(s) of '{}' with {}", rows.len(), field, value);
            for row in rows {
                output.fill(
                    row,
                    &field,
                    value.clone(),
                    confidence::CENTRAL_TENDENCY,
                    self.method(),
                );
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::types::Value;

    #[test]
    fn test_numeric_midpoint_median() {
        let xs = [
            Some(1.0),
            Some(2.0),
            Some(3.0),
            None,
            Some(5.0),
            Some(6.0),
            Some(7.0),
            Some(8.0),
            Some(9.0),
            Some(10.0),
        ];
        let (ds, schema) = dataset(xs.iter().map(|x| vec![("x", opt(*x))]).collect());

        let out = StatisticalImputer.impute(&ds, &schema, &ImputationConfig::default());

        assert_eq!(out.data.get(3, "x"), &num(5.5));
        assert_eq!(out.imputed.len(), 1);
        assert_eq!(out.imputed[0].confidence, confidence::CENTRAL_TENDENCY);
        assert_eq!(out.imputed[0].method, ImputationMethod::MeanMedian);
        assert_eq!(out.imputed[0].original_value, Value::Missing);
    }

    #[test]
    fn test_categorical_mode_first_seen_tie() {
        let (ds, schema) = dataset(vec![
            vec![("c", Value::from("b"))],
            vec![("c", Value::from("a"))],
            vec![("c", Value::Missing)],
        ]);

        let out = StatisticalImputer.impute(&ds, &schema, &ImputationConfig::default());
        assert_eq!(out.data.get(2, "c"), &Value::from("b"));
    }

    #[test]
    fn test_complete_and_empty_fields_untouched() {
        let (ds, schema) = dataset(vec![
            vec![("a", num(1.0)), ("e", Value::Missing)],
            vec![("a", num(2.0)), ("e", Value::Missing)],
        ]);

        let out = StatisticalImputer.impute(&ds, &schema, &ImputationConfig::default());
        assert_eq!(out.data, ds);
        assert!(out.imputed.is_empty());
    }
}
