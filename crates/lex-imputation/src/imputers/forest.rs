//! Ensemble-of-stumps imputation.
//!
//! Each target field gets `forest_trees` one-split trees, every one trained on
//! a bootstrap sample of the rows where the target is present. The sampling
//! RNG is seeded from the configured seed plus the field's position, so runs
//! are reproducible.

use super::{EstimatorOutput, Imputer, fillable_fields, present_rows};
use crate::config::{ImputationConfig, ImputationMethod};
use crate::quality::confidence;
use crate::types::{Dataset, Schema, Value};
use crate::utils::{gini_impurity, mean, midpoint_median, mode, variance};
use rand::prelude::*;
use tracing::debug;

/// Impurity reductions at or below this do not justify a split.
const MIN_IMPURITY_REDUCTION: f64 = 1e-12;

#[derive(Debug, Clone)]
struct Split {
    field: String,
    threshold: f64,
    left: Value,
    right: Value,
}

/// A one-split tree with a fallback for rows missing the split field.
#[derive(Debug, Clone)]
struct Stump {
    split: Option<Split>,
    fallback: Value,
}

impl Stump {
    fn predict(&self, dataset: &Dataset, row: usize) -> Value {
        match &self.split {
            Some(split) => match dataset.get(row, &split.field).as_f64() {
                Some(x) if x <= split.threshold => split.left.clone(),
                Some(_) => split.right.clone(),
                None => self.fallback.clone(),
            },
            None => self.fallback.clone(),
        }
    }
}

/// Target-side helpers, numeric or categorical.
struct Target<'a> {
    dataset: &'a Dataset,
    field: &'a str,
    numeric: bool,
}

impl Target<'_> {
    fn aggregate(&self, rows: &[usize]) -> Option<Value> {
        if self.numeric {
            let values: Vec<f64> = rows
                .iter()
                .filter_map(|&r| self.dataset.get(r, self.field).as_f64())
                .collect();
            mean(&values).map(Value::Number)
        } else {
            mode(rows.iter().map(|&r| self.dataset.get(r, self.field)))
        }
    }

    fn impurity(&self, rows: &[usize]) -> f64 {
        if self.numeric {
            let values: Vec<f64> = rows
                .iter()
                .filter_map(|&r| self.dataset.get(r, self.field).as_f64())
                .collect();
            variance(&values).unwrap_or_default()
        } else {
            gini_impurity(rows.iter().map(|&r| self.dataset.get(r, self.field)))
        }
    }
}

/// Random-forest style imputer built from decision stumps.
///
/// Candidate splits are the numeric fields other than the target, each split
/// at its median within the bootstrap sample. The split with the largest
/// impurity reduction (variance for numeric targets, Gini otherwise) wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomForestImputer;

impl RandomForestImputer {
    fn train_stump(
        target: &Target<'_>,
        predictors: &[&String],
        sample: &[usize],
    ) -> Option<Stump> {
        let fallback = target.aggregate(sample)?;
        let mut best: Option<(f64, Split)> = None;

        for &predictor in predictors {
            let rows: Vec<usize> = sample
                .iter()
                .copied()
                .filter(|&r| target.dataset.get(r, predictor).as_f64().is_some())
                .collect();
            let xs: Vec<f64> = rows
                .iter()
                .filter_map(|&r| target.dataset.get(r, predictor).as_f64())
                .collect();
            let Some(threshold) = midpoint_median(&xs) else {
                continue;
            };

            let (left, right): (Vec<usize>, Vec<usize>) = rows.iter().copied().partition(|&r| {
                target
                    .dataset
                    .get(r, predictor)
                    .as_f64()
                    .is_some_and(|x| x <= threshold)
            });
            if left.is_empty() || right.is_empty() {
                continue;
            }

            let n = rows.len() as f64;
            let reduction = target.impurity(&rows)
                - (left.len() as f64 / n) * target.impurity(&left)
                - (right.len() as f64 / n) * target.impurity(&right);
            if reduction <= MIN_IMPURITY_REDUCTION
                || best.as_ref().is_some_and(|(r, _)| reduction <= *r)
            {
                continue;
            }

            if let (Some(l), Some(r)) = (target.aggregate(&left), target.aggregate(&right)) {
                best = Some((
                    reduction,
                    Split {
                        field: predictor.clone(),
                        threshold,
                        left: l,
                        right: r,
                    },
                ));
            }
        }

        Some(Stump {
            split: best.map(|(_, split)| split),
            fallback,
        })
    }
}

impl Imputer for RandomForestImputer {
    fn method(&self) -> ImputationMethod {
        ImputationMethod::RandomForest
    }

    fn impute(
        &self,
        dataset: &Dataset,
        schema: &Schema,
        config: &ImputationConfig,
    ) -> EstimatorOutput {
        let mut output = EstimatorOutput::new(dataset);
        let fillable = fillable_fields(dataset, schema);

        for (index, field) in dataset.fields().iter().enumerate() {
            if !fillable.contains(field) {
                continue;
            }

            let donors = present_rows(dataset, field);
            let target = Target {
                dataset,
                field,
                numeric: schema.is_numeric(field),
            };
            let predictors: Vec<&String> = dataset
                .fields()
                .iter()
                .filter(|p| *p != field && schema.is_numeric(p))
                .collect();

            let mut rng = StdRng::seed_from_u64(config.random_seed.wrapping_add(index as u64));
            let stumps: Vec<Stump> = (0..config.forest_trees)
                .filter_map(|_| {
                    let sample: Vec<usize> = (0..donors.len())
                        .map(|_| donors[rng.gen_range(0..donors.len())])
                        .collect();
                    Self::train_stump(&target, &predictors, &sample)
                })
                .collect();
            if stumps.is_empty() {
                continue;
            }

            let split_stumps = stumps.iter().filter(|s| s.split.is_some()).count();
            let score = confidence::forest(split_stumps, config.forest_trees);
            debug!(
                "Forest for '{}': {}/{} stumps split",
                field,
                split_stumps,
                stumps.len()
            );

            for row in dataset.missing_rows(field) {
                let predictions: Vec<Value> =
                    stumps.iter().map(|s| s.predict(dataset, row)).collect();
                let value = if target.numeric {
                    let values: Vec<f64> = predictions.iter().filter_map(Value::as_f64).collect();
                    mean(&values).map(Value::Number)
                } else {
                    mode(predictions.iter())
                };
                if let Some(value) = value {
                    output.fill(row, field, value, score, self.method());
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

    fn step_dataset() -> (Dataset, Schema) {
        let rows = (1..=10)
            .map(|i| {
                let x = i as f64;
                let y = if i == 2 || i == 9 {
                    Value::Missing
                } else if i <= 5 {
                    num(0.0)
                } else {
                    num(100.0)
                };
                vec![("x", num(x)), ("y", y)]
            })
            .collect();
        dataset(rows)
    }

    #[test]
    fn test_fills_every_missing_cell() {
        let (ds, schema) = step_dataset();
        let out = RandomForestImputer.impute(&ds, &schema, &ImputationConfig::default());

        assert_eq!(out.data.total_missing(), 0);
        assert_eq!(out.imputed.len(), 2);
        for record in &out.imputed {
            assert!(record.confidence >= confidence::FOREST_BASE);
            assert!(record.confidence <= 0.9 + 1e-12);
            assert_eq!(record.method, ImputationMethod::RandomForest);
        }
    }

    #[test]
    fn test_split_follows_predictor() {
        let (ds, schema) = step_dataset();
        let out = RandomForestImputer.impute(&ds, &schema, &ImputationConfig::default());

        let low = out.data.get(1, "y").as_f64().unwrap();
        let high = out.data.get(8, "y").as_f64().unwrap();
        assert!(low < high);
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let (ds, schema) = step_dataset();
        let config = ImputationConfig::default();
        assert_eq!(
            RandomForestImputer.impute(&ds, &schema, &config),
            RandomForestImputer.impute(&ds, &schema, &config)
        );
    }

    #[test]
    fn test_categorical_target() {
        let (ds, schema) = dataset(vec![
            vec![("x", num(1.0)), ("label", Value::from("low"))],
            vec![("x", num(2.0)), ("label", Value::from("low"))],
            vec![("x", num(3.0)), ("label", Value::Missing)],
            vec![("x", num(8.0)), ("label", Value::from("high"))],
            vec![("x", num(9.0)), ("label", Value::from("high"))],
        ]);
        let out = RandomForestImputer.impute(&ds, &schema, &ImputationConfig::default());

        let filled = out.data.get(2, "label");
        assert!(filled == &Value::from("low") || filled == &Value::from("high"));
    }

    #[test]
    fn test_no_predictors_gives_constant_stumps() {
        let (ds, schema) = dataset(vec![
            vec![("c", Value::from("a"))],
            vec![("c", Value::from("a"))],
            vec![("c", Value::Missing)],
        ]);
        let out = RandomForestImputer.impute(&ds, &schema, &ImputationConfig::default());

        assert_eq!(out.data.get(2, "c"), &Value::from("a"));
        assert_eq!(out.imputed[0].confidence, confidence::FOREST_BASE);
    }
}
