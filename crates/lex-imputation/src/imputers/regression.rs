//! Linear regression imputation.
//!
//! Ordinary least squares with an intercept, solved through the normal
//! equations `(XᵀX)β = Xᵀy` with the [`crate::linalg`] kernel. The fit is
//! shared with the chained-equations estimator.

use super::{EstimatorOutput, Imputer, fillable_fields};
use crate::config::{ImputationConfig, ImputationMethod};
use crate::diagnosis::predictor_fields;
use crate::error::{ImputationError, Result};
use crate::linalg::{mat_mul, mat_vec_mul, solve, transpose};
use crate::quality::confidence;
use crate::types::{Dataset, Schema, Value};
use crate::utils::mean;
use tracing::{debug, warn};

/// Minimum number of training rows for any fit.
pub const MIN_TRAINING_ROWS: usize = 3;

/// Sums of squares below this are treated as zero.
const SS_EPSILON: f64 = 1e-12;

/// A fitted linear model.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionFit {
    /// Intercept followed by one coefficient per predictor.
    pub coefficients: Vec<f64>,
    /// Coefficient of determination on the training rows, in `[0, 1]`.
    pub r_squared: f64,
}

impl RegressionFit {
    pub fn predict(&self, x: &[f64]) -> f64 {
        self.coefficients[0]
            + self.coefficients[1..]
                .iter()
                .zip(x)
                .map(|(beta, xi)| beta * xi)
                .sum::<f64>()
    }
}

/// Fit `y ≈ β₀ + Σ βᵢ·xᵢ`.
///
/// Needs at least `max(3, p + 1)` rows. Fails with
/// [`ImputationError::SingularSystem`] when the normal equations have no
/// unique solution.
pub fn fit_least_squares(field: &str, x: &[Vec<f64>], y: &[f64]) -> Result<RegressionFit> {
    let p = x.first().map_or(0, Vec::len);
    let required = MIN_TRAINING_ROWS.max(p + 1);
    if y.len() < required || x.len() != y.len() {
        return Err(ImputationError::InsufficientData {
            field: field.to_string(),
            rows: y.len().min(x.len()),
            required,
        });
    }

    let design: Vec<Vec<f64>> = x
        .iter()
        .map(|row| std::iter::once(1.0).chain(row.iter().copied()).collect())
        .collect();
    let xt = transpose(&design);
    let singular = || ImputationError::SingularSystem(field.to_string());

    let xtx = mat_mul(&xt, &design).ok_or_else(singular)?;
    let xty = mat_vec_mul(&xt, y).ok_or_else(singular)?;
    let coefficients = solve(&xtx, &xty).ok_or_else(singular)?;

    let mut fit = RegressionFit {
        coefficients,
        r_squared: 0.0,
    };

    let y_mean = mean(y).unwrap_or_default();
    let ss_tot: f64 = y.iter().map(|yi| (yi - y_mean).powi(2)).sum();
    let ss_res: f64 = x
        .iter()
        .zip(y)
        .map(|(row, yi)| (yi - fit.predict(row)).powi(2))
        .sum();

    fit.r_squared = if ss_tot < SS_EPSILON {
        if ss_res < SS_EPSILON { 1.0 } else { 0.0 }
    } else {
        confidence::clamp(1.0 - ss_res / ss_tot)
    };

    Ok(fit)
}

/// Numeric values of `fields` in `row`, or `None` if any is missing.
pub(crate) fn numeric_row(dataset: &Dataset, row: usize, fields: &[String]) -> Option<Vec<f64>> {
    fields
        .iter()
        .map(|field| dataset.get(row, field).as_f64())
        .collect()
}

/// Least-squares imputer for numeric fields.
///
/// Predictors are the numeric fields the diagnostician considers usable for
/// the target. Rows whose predictors are not all present stay missing, as do
/// non-numeric targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegressionImputer;

impl RegressionImputer {
    fn impute_field(
        &self,
        dataset: &Dataset,
        schema: &Schema,
        field: &str,
        output: &mut EstimatorOutput,
    ) -> Result<()> {
        let predictors: Vec<String> = predictor_fields(dataset, field)
            .into_iter()
            .filter(|p| schema.is_numeric(p))
            .collect();
        if predictors.is_empty() {
            return Err(ImputationError::NoPredictors(field.to_string()));
        }

        let mut x = Vec::new();
        let mut y = Vec::new();
        for row in 0..dataset.len() {
            let Some(target) = dataset.get(row, field).as_f64() else {
                continue;
            };
            if let Some(features) = numeric_row(dataset, row, &predictors) {
                x.push(features);
                y.push(target);
            }
        }

        let fit = fit_least_squares(field, &x, &y)?;
        debug!(
            "Regression for '{}' on {:?}: R² = {:.4}",
            field, predictors, fit.r_squared
        );

        for row in dataset.missing_rows(field) {
            match numeric_row(dataset, row, &predictors) {
                Some(features) => output.fill(
                    row,
                    field,
                    Value::Number(fit.predict(&features)),
                    confidence::regression(fit.r_squared),
                    self.method(),
                ),
                None => debug!("Row {} of '{}' has missing predictors, left missing", row, field),
            }
        }

        Ok(())
    }
}

impl Imputer for RegressionImputer {
    fn method(&self) -> ImputationMethod {
        ImputationMethod::Regression
    }

    fn impute(
        &self,
        dataset: &Dataset,
        schema: &Schema,
        _config: &ImputationConfig,
    ) -> EstimatorOutput {
        let mut output = EstimatorOutput::new(dataset);

        for field in fillable_fields(dataset, schema) {
            if !schema.is_numeric(&field) {
                debug!("Skipping non-numeric field '{}' for regression", field);
                continue;
            }
            match self.impute_field(dataset, schema, &field, &mut output) {
                Ok(()) => {}
                Err(e) if e.is_field_local() => debug!("Regression skipped '{}': {}", field, e),
                Err(e) => warn!("Regression failed for '{}': {}", field, e),
            }
        }

        output
    }
}
