//! Distance-weighted nearest-neighbour imputation.

use super::{EstimatorOutput, Imputer, fillable_fields, present_rows};
use crate::config::{ImputationConfig, ImputationMethod};
use crate::quality::confidence;
use crate::types::{Dataset, Schema, Value};
use crate::utils::{mean, mode};
use tracing::debug;

/// Upper bound of the derived neighbour count.
const MAX_DERIVED_NEIGHBORS: usize = 5;

/// Rows per derived neighbour.
const ROWS_PER_NEIGHBOR: usize = 10;

/// Distances below this are treated as identical rows.
const ZERO_DISTANCE: f64 = 1e-10;

/// Weight of an identical neighbour.
const ZERO_DISTANCE_WEIGHT: f64 = 1e10;

/// K-nearest-neighbours imputer.
///
/// Donors are the rows where the target field is present. The distance to a
/// donor is the root mean square of per-field differences over the other
/// fields present in both rows: `|Δ|` for numeric fields, `0`/`1` for a
/// category match/mismatch. Numeric targets take the inverse-distance
/// weighted mean of the `k` nearest donors, other targets take their mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct KNNImputer;

impl KNNImputer {
    /// Neighbour count: the configured override, else `max(1, min(5, rows / 10))`.
    pub fn neighbors(config: &ImputationConfig, rows: usize) -> usize {
        config
            .knn_neighbors
            .unwrap_or_else(|| (rows / ROWS_PER_NEIGHBOR).min(MAX_DERIVED_NEIGHBORS))
            .max(1)
    }

    /// Distance between two rows, ignoring `skip` and cells missing in either.
    ///
    /// Rows sharing no present field are infinitely far apart.
    fn distance(dataset: &Dataset, schema: &Schema, a: usize, b: usize, skip: &str) -> f64 {
        let mut sum_squared_diff = 0.0;
        let mut count = 0usize;

        for field in dataset.fields().iter().filter(|f| f.as_str() != skip) {
            let (va, vb) = (dataset.get(a, field), dataset.get(b, field));
            if va.is_missing() || vb.is_missing() {
                continue;
            }

            let diff = match (schema.is_numeric(field), va.as_f64(), vb.as_f64()) {
                (true, Some(x), Some(y)) => (x - y).abs(),
                _ => {
                    if va.category_key() == vb.category_key() {
                        0.0
                    } else {
                        1.0
                    }
                }
            };
            sum_squared_diff += diff * diff;
            count += 1;
        }

        if count > 0 {
            (sum_squared_diff / count as f64).sqrt()
        } else {
            f64::INFINITY
        }
    }

    /// Estimate one cell; returns the value and the nearest distance.
    fn impute_value(
        dataset: &Dataset,
        schema: &Schema,
        field: &str,
        row: usize,
        donors: &[usize],
        k: usize,
    ) -> Option<(Value, f64)> {
        let mut distances: Vec<(usize, f64)> = donors
            .iter()
            .map(|&donor| (donor, Self::distance(dataset, schema, row, donor, field)))
            .collect();
        distances.sort_by(|a, b| a.1.total_cmp(&b.1));
        distances.truncate(k);

        let nearest = distances.first()?.1;

        let value = if schema.is_numeric(field) {
            let mut weighted_sum = 0.0;
            let mut weight_sum = 0.0;
            for &(donor, distance) in &distances {
                let Some(v) = dataset.get(donor, field).as_f64() else {
                    continue;
                };
                let weight = if distance < ZERO_DISTANCE {
                    ZERO_DISTANCE_WEIGHT
                } else {
                    1.0 / distance
                };
                weighted_sum += v * weight;
                weight_sum += weight;
            }

            if weight_sum > 0.0 {
                Value::Number(weighted_sum / weight_sum)
            } else {
                // Every neighbour is infinitely far: plain mean of the neighbours.
                let values: Vec<f64> = distances
                    .iter()
                    .filter_map(|&(donor, _)| dataset.get(donor, field).as_f64())
                    .collect();
                Value::Number(mean(&values)?)
            }
        } else {
            mode(distances.iter().map(|&(donor, _)| dataset.get(donor, field)))?
        };

        Some((value, nearest))
    }
}

impl Imputer for KNNImputer {
    fn method(&self) -> ImputationMethod {
        ImputationMethod::Knn
    }

    fn impute(
        &self,
        dataset: &Dataset,
        schema: &Schema,
        config: &ImputationConfig,
    ) -> EstimatorOutput {
        let mut output = EstimatorOutput::new(dataset);
        let k = Self::neighbors(config, dataset.len());
        debug!("KNN imputing with k = {}", k);

        for field in fillable_fields(dataset, schema) {
            let donors = present_rows(dataset, &field);

            for row in dataset.missing_rows(&field) {
                if let Some((value, nearest)) =
                    Self::impute_value(dataset, schema, &field, row, &donors, k)
                {
                    output.fill(row, &field, value, confidence::knn(nearest), self.method());
                }
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn config_k(k: usize) -> ImputationConfig {
        ImputationConfig {
            knn_neighbors: Some(k),
            ..ImputationConfig::default()
        }
    }

    #[test]
    fn test_derived_neighbors() {
        let config = ImputationConfig::default();
        assert_eq!(KNNImputer::neighbors(&config, 4), 1);
        assert_eq!(KNNImputer::neighbors(&config, 35), 3);
        assert_eq!(KNNImputer::neighbors(&config, 500), 5);
        assert_eq!(KNNImputer::neighbors(&config_k(7), 4), 7);
    }

    #[test]
    fn test_exact_neighbour_dominates() {
        let (ds, schema) = dataset(vec![
            vec![("f1", num(1.0)), ("f2", num(10.0))],
            vec![("f1", num(2.0)), ("f2", num(20.0))],
            vec![("f1", num(2.0)), ("f2", Value::Missing)],
            vec![("f1", num(4.0)), ("f2", num(40.0))],
        ]);

        let out = KNNImputer.impute(&ds, &schema, &config_k(2));
        let filled = out.data.get(2, "f2").as_f64().unwrap_or_default();

        // Row 1 is at distance 0 and carries almost all the weight.
        assert!((filled - 20.0).abs() < 1e-6);
        assert_eq!(out.imputed.len(), 1);
        assert_eq!(out.imputed[0].confidence, 1.0);
        assert_eq!(out.imputed[0].method, ImputationMethod::Knn);
    }

    #[test]
    fn test_inverse_distance_weighting() {
        let (ds, schema) = dataset(vec![
            vec![("x", num(0.0)), ("y", num(0.0))],
            vec![("x", num(3.0)), ("y", num(30.0))],
            vec![("x", num(1.0)), ("y", Value::Missing)],
        ]);

        let out = KNNImputer.impute(&ds, &schema, &config_k(2));
        // Weights 1/1 and 1/2: (0 * 1 + 30 * 0.5) / 1.5 = 10
        let filled = out.data.get(2, "y").as_f64().unwrap_or_default();
        assert!((filled - 10.0).abs() < 1e-9);
        assert_eq!(out.imputed[0].confidence, confidence::KNN_FLOOR);
    }

    #[test]
    fn test_categorical_target_uses_mode() {
        let (ds, schema) = dataset(vec![
            vec![("size", num(1.0)), ("label", Value::from("small"))],
            vec![("size", num(1.1)), ("label", Value::from("small"))],
            vec![("size", num(9.0)), ("label", Value::from("large"))],
            vec![("size", num(1.05)), ("label", Value::Missing)],
        ]);

        let out = KNNImputer.impute(&ds, &schema, &config_k(2));
        assert_eq!(out.data.get(3, "label"), &Value::from("small"));
    }

    #[test]
    fn test_categorical_predictor_mismatch() {
        let (ds, schema) = dataset(vec![
            vec![("city", Value::from("Oslo")), ("v", num(1.0))],
            vec![("city", Value::from("Rome")), ("v", num(100.0))],
            vec![("city", Value::from("Oslo")), ("v", Value::Missing)],
        ]);

        let out = KNNImputer.impute(&ds, &schema, &config_k(1));
        assert_eq!(out.data.get(2, "v"), &num(1.0));
    }

    #[test]
    fn test_deterministic() {
        let (ds, schema) = dataset(vec![
            vec![("a", num(1.0)), ("b", num(3.0))],
            vec![("a", Value::Missing), ("b", num(4.0))],
            vec![("a", num(5.0)), ("b", Value::Missing)],
            vec![("a", num(2.0)), ("b", num(8.0))],
        ]);
        let config = ImputationConfig::default();
        assert_eq!(
            KNNImputer.impute(&ds, &schema, &config),
            KNNImputer.impute(&ds, &schema, &config)
        );
    }
}
