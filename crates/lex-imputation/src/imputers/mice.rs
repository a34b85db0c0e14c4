//! Multiple imputation by chained equations (single chain).
//!
//! Missing cells start at their field's central tendency. Each pass then
//! regresses every numeric field with missing cells on the other numeric
//! fields and re-predicts its originally missing cells. A pass reads the last
//! committed state and writes a fresh buffer, so every regression in a pass
//! sees the same inputs regardless of field order.

use super::regression::{fit_least_squares, numeric_row};
use super::{EstimatorOutput, Imputer, central_tendency, fillable_fields, present_rows};
use crate::config::{ImputationConfig, ImputationMethod};
use crate::quality::confidence;
use crate::types::{Dataset, Schema, Value};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A cell whose prediction moves by less than this is unchanged.
pub const CHANGE_TOLERANCE: f64 = 1e-9;

/// Result of a chained-equations run.
#[derive(Debug, Clone, PartialEq)]
pub struct MiceOutcome {
    pub output: EstimatorOutput,
    /// Number of changed cells in each pass that ran.
    pub passes: Vec<usize>,
    /// `true` when the last pass changed nothing.
    pub converged: bool,
}

/// Chained-equations imputer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MiceImputer;

impl MiceImputer {
    /// Run the chain and report per-pass changes.
    pub fn run(
        &self,
        dataset: &Dataset,
        schema: &Schema,
        config: &ImputationConfig,
    ) -> MiceOutcome {
        let fillable = fillable_fields(dataset, schema);
        let missing: HashMap<&str, Vec<usize>> = fillable
            .iter()
            .map(|field| (field.as_str(), dataset.missing_rows(field)))
            .collect();

        let mut state = dataset.clone();
        for field in &fillable {
            if let Some(value) = central_tendency(dataset, schema, field) {
                for &row in &missing[field.as_str()] {
                    state.set(row, field, value.clone());
                }
            }
        }

        let numeric_fields: Vec<&String> = dataset
            .fields()
            .iter()
            .filter(|f| schema.is_numeric(f))
            .collect();
        let targets: Vec<&String> = fillable.iter().filter(|f| schema.is_numeric(f)).collect();

        let mut r_squared: HashMap<&str, f64> = HashMap::new();
        let mut refined: HashSet<(&str, usize)> = HashSet::new();
        let mut passes = Vec::new();
        let mut converged = false;

        for pass in 0..config.max_iterations {
            let mut next = state.clone();
            let mut changes = 0usize;

            for &target in &targets {
                let predictors: Vec<String> = numeric_fields
                    .iter()
                    .filter(|p| **p != target)
                    .map(|p| p.to_string())
                    .collect();
                if predictors.is_empty() {
                    continue;
                }

                let mut x = Vec::new();
                let mut y = Vec::new();
                for row in present_rows(dataset, target) {
                    if let (Some(features), Some(value)) = (
                        numeric_row(&state, row, &predictors),
                        dataset.get(row, target).as_f64(),
                    ) {
                        x.push(features);
                        y.push(value);
                    }
                }

                let fit = match fit_least_squares(target, &x, &y) {
                    Ok(fit) => fit,
                    Err(e) => {
                        debug!("MICE pass {}: '{}' not refined: {}", pass + 1, target, e);
                        continue;
                    }
                };
                r_squared.insert(target.as_str(), fit.r_squared);

                for &row in &missing[target.as_str()] {
                    let Some(features) = numeric_row(&state, row, &predictors) else {
                        continue;
                    };
                    let prediction = fit.predict(&features);
                    let previous = state.get(row, target).as_f64();
                    if previous.is_none_or(|p| (prediction - p).abs() > CHANGE_TOLERANCE) {
                        changes += 1;
                    }
                    next.set(row, target, Value::Number(prediction));
                    refined.insert((target.as_str(), row));
                }
            }

            state = next;
            passes.push(changes);
            debug!("MICE pass {}: {} cell(s) changed", pass + 1, changes);
            if changes == 0 {
                converged = true;
                break;
            }
        }

        let mut output = EstimatorOutput::new(dataset);
        for field in &fillable {
            for &row in &missing[field.as_str()] {
                let score = if refined.contains(&(field.as_str(), row)) {
                    let r2 = r_squared.get(field.as_str()).copied().unwrap_or_default();
                    confidence::regression(r2)
                } else {
                    confidence::CENTRAL_TENDENCY
                };
                output.fill(row, field, state.get(row, field).clone(), score, self.method());
            }
        }

        MiceOutcome {
            output,
            passes,
            converged,
        }
    }
}

impl Imputer for MiceImputer {
    fn method(&self) -> ImputationMethod {
        ImputationMethod::Mice
    }

    fn impute(
        &self,
        dataset: &Dataset,
        schema: &Schema,
        config: &ImputationConfig,
    ) -> EstimatorOutput {
        self.run(dataset, schema, config).output
    }
}
