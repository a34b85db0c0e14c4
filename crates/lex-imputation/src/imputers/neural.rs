//! Similarity-weighted matrix imputation.
//!
//! Every field is encoded into `[0, 1]`: numeric fields by min-max scaling,
//! other fields by their category index. A missing cell is estimated from all
//! donor rows, each weighted by `1 / (1 + RMS distance)` over the fields both
//! rows share. This is the estimator selected by the `neural_network` method
//! name; there is no trained network behind it.

use super::{EstimatorOutput, Imputer, fillable_fields, present_rows};
use crate::config::{ImputationConfig, ImputationMethod};
use crate::quality::confidence;
use crate::types::{Dataset, Schema, Value};
use crate::utils::mean;
use std::collections::HashMap;
use tracing::debug;

/// How a field maps to and from the unit interval.
#[derive(Debug, Clone)]
enum Encoding {
    Numeric { min: f64, max: f64 },
    Categorical { categories: Vec<Value>, index: HashMap<String, usize> },
}

impl Encoding {
    fn fit(dataset: &Dataset, schema: &Schema, field: &str) -> Option<Self> {
        if schema.field_type(field).is_empty() {
            return None;
        }

        if schema.is_numeric(field) {
            let values: Vec<f64> = dataset.numeric_column(field).into_iter().flatten().collect();
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            return min.is_finite().then_some(Encoding::Numeric { min, max });
        }

        let mut categories = Vec::new();
        let mut index = HashMap::new();
        for row in 0..dataset.len() {
            let value = dataset.get(row, field);
            if let Some(key) = value.category_key()
                && !index.contains_key(&key)
            {
                index.insert(key, categories.len());
                categories.push(value.clone());
            }
        }
        (!categories.is_empty()).then_some(Encoding::Categorical { categories, index })
    }

    fn encode(&self, value: &Value) -> Option<f64> {
        match self {
            Encoding::Numeric { min, max } => {
                let x = value.as_f64()?;
                let range = max - min;
                Some(if range > 0.0 { (x - min) / range } else { 0.0 })
            }
            Encoding::Categorical { categories, index } => {
                let i = *index.get(&value.category_key()?)?;
                Some(if categories.len() > 1 {
                    i as f64 / (categories.len() - 1) as f64
                } else {
                    0.0
                })
            }
        }
    }

    fn decode(&self, encoded: f64) -> Option<Value> {
        match self {
            Encoding::Numeric { min, max } => Some(Value::Number(min + encoded * (max - min))),
            Encoding::Categorical { categories, .. } => {
                let last = categories.len().checked_sub(1)?;
                let i = (encoded * last as f64).round().clamp(0.0, last as f64) as usize;
                categories.get(i).cloned()
            }
        }
    }
}

/// The dataset encoded into `[0, 1]`, one column per field.
struct EncodedMatrix {
    fields: Vec<String>,
    encodings: Vec<Option<Encoding>>,
    cells: Vec<Vec<Option<f64>>>,
}

impl EncodedMatrix {
    fn build(dataset: &Dataset, schema: &Schema) -> Self {
        let fields = dataset.fields().to_vec();
        let encodings: Vec<Option<Encoding>> = fields
            .iter()
            .map(|field| Encoding::fit(dataset, schema, field))
            .collect();
        let cells = (0..dataset.len())
            .map(|row| {
                fields
                    .iter()
                    .zip(&encodings)
                    .map(|(field, encoding)| {
                        encoding.as_ref().and_then(|e| e.encode(dataset.get(row, field)))
                    })
                    .collect()
            })
            .collect();

        Self {
            fields,
            encodings,
            cells,
        }
    }

    /// `1 / (1 + RMS distance)` over the columns present in both rows.
    fn similarity(&self, a: usize, b: usize, skip: usize) -> f64 {
        let mut sum_squared_diff = 0.0;
        let mut shared = 0usize;
        for (col, (x, y)) in self.cells[a].iter().zip(&self.cells[b]).enumerate() {
            if col == skip {
                continue;
            }
            if let (Some(x), Some(y)) = (x, y) {
                sum_squared_diff += (x - y).powi(2);
                shared += 1;
            }
        }

        if shared == 0 {
            confidence::NEUTRAL_SIMILARITY
        } else {
            1.0 / (1.0 + (sum_squared_diff / shared as f64).sqrt())
        }
    }

    /// Estimate column `col` of `row` from `donors`.
    fn estimate(&self, row: usize, col: usize, donors: &[usize]) -> Option<(Value, f64)> {
        let encoding = self.encodings[col].as_ref()?;
        let weighted: Vec<(f64, f64)> = donors
            .iter()
            .filter_map(|&d| Some((self.cells[d][col]?, self.similarity(row, d, col))))
            .collect();
        let mean_similarity = mean(&weighted.iter().map(|(_, s)| *s).collect::<Vec<_>>())?;

        let encoded = match encoding {
            Encoding::Numeric { .. } => {
                let weight_sum: f64 = weighted.iter().map(|(_, s)| s).sum();
                weighted.iter().map(|(v, s)| v * s).sum::<f64>() / weight_sum
            }
            Encoding::Categorical { .. } => {
                // Vote on category codes; ties keep the first code seen.
                let mut votes: Vec<(f64, f64)> = Vec::new();
                for &(code, s) in &weighted {
                    match votes.iter_mut().find(|(c, _)| (*c - code).abs() < f64::EPSILON) {
                        Some((_, total)) => *total += s,
                        None => votes.push((code, s)),
                    }
                }
                votes
                    .iter()
                    .fold(None, |best: Option<(f64, f64)>, &(code, total)| match best {
                        Some((_, t)) if t >= total => best,
                        _ => Some((code, total)),
                    })?
                    .0
            }
        };

        Some((encoding.decode(encoded)?, mean_similarity))
    }
}

/// Similarity-weighted matrix imputer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityImputer;

impl SimilarityImputer {
    /// Async entry point; the work itself never suspends.
    pub async fn impute_async(
        &self,
        dataset: &Dataset,
        schema: &Schema,
        config: &ImputationConfig,
    ) -> EstimatorOutput {
        self.impute(dataset, schema, config)
    }
}

impl Imputer for SimilarityImputer {
    fn method(&self) -> ImputationMethod {
        ImputationMethod::NeuralNetwork
    }

    fn impute(
        &self,
        dataset: &Dataset,
        schema: &Schema,
        _config: &ImputationConfig,
    ) -> EstimatorOutput {
        let mut output = EstimatorOutput::new(dataset);
        let matrix = EncodedMatrix::build(dataset, schema);

        for field in fillable_fields(dataset, schema) {
            let Some(col) = matrix.fields.iter().position(|f| *f == field) else {
                continue;
            };
            let donors = present_rows(dataset, &field);
            debug!("Similarity estimate for '{}' from {} donor(s)", field, donors.len());

            for row in dataset.missing_rows(&field) {
                if let Some((value, mean_similarity)) = matrix.estimate(row, col, &donors) {
                    output.fill(
                        row,
                        &field,
                        value,
                        confidence::similarity(mean_similarity),
                        self.method(),
                    );
                }
            }
        }

        output
    }
}
