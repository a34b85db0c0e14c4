//! Imputation estimators.
//!
//! Every estimator implements [`Imputer`]: it receives the original dataset,
//! the schema built once by the profiler and the request configuration, and
//! returns an independent copy with missing cells filled plus one
//! [`ImputedFieldRecord`] per filled cell.
//!
//! Estimators only overwrite cells that were missing in the input and always
//! read predictor values from the input, never from their own fills.
//!
//! - [`StatisticalImputer`]: median / mode
//! - [`KNNImputer`]: distance-weighted nearest neighbours
//! - [`RegressionImputer`]: ordinary least squares on numeric predictors
//! - [`RandomForestImputer`]: bootstrap ensemble of decision stumps
//! - [`SimilarityImputer`]: similarity-weighted matrix estimate
//! - [`MiceImputer`]: chained equations with a double-buffered state

mod forest;
mod knn;
mod mice;
mod neural;
mod regression;
mod statistical;

pub use forest::RandomForestImputer;
pub use knn::KNNImputer;
pub use mice::{MiceImputer, MiceOutcome};
pub use neural::SimilarityImputer;
pub use regression::{RegressionFit, RegressionImputer, fit_least_squares};
pub use statistical::StatisticalImputer;

use crate::config::{ImputationConfig, ImputationMethod};
use crate::types::{Dataset, ImputedFieldRecord, Schema, Value};
use crate::utils::{midpoint_median, mode};

/// Filled dataset and the audit trail of an estimator run.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorOutput {
    pub data: Dataset,
    pub imputed: Vec<ImputedFieldRecord>,
}

impl EstimatorOutput {
    /// Start from an independent copy of the input.
    pub fn new(dataset: &Dataset) -> Self {
        Self {
            data: dataset.clone(),
            imputed: Vec::new(),
        }
    }

    /// Fill one cell and record it.
    ///
    /// Cells that are already present are left alone.
    pub fn fill(
        &mut self,
        row: usize,
        field: &str,
        value: Value,
        confidence: f64,
        method: ImputationMethod,
    ) {
        if value.is_missing() || !self.data.is_missing(row, field) {
            return;
        }
        let original_value = self.data.get(row, field).clone();
        self.data.set(row, field, value.clone());
        self.imputed.push(ImputedFieldRecord {
            field: field.to_string(),
            original_value,
            imputed_value: value,
            confidence: crate::quality::confidence::clamp(confidence),
            method,
            row_index: row,
        });
    }
}

/// Common contract of every estimator.
pub trait Imputer {
    /// Method recorded on every filled cell.
    fn method(&self) -> ImputationMethod;

    /// Fill the missing cells of `dataset`.
    ///
    /// Never fails: fields an estimator cannot handle are left missing.
    fn impute(&self, dataset: &Dataset, schema: &Schema, config: &ImputationConfig)
    -> EstimatorOutput;
}

/// Fields with at least one missing cell and at least one present value.
pub(crate) fn fillable_fields(dataset: &Dataset, schema: &Schema) -> Vec<String> {
    dataset
        .fields()
        .iter()
        .filter(|field| !schema.field_type(field).is_empty() && dataset.missing_count(field) > 0)
        .cloned()
        .collect()
}

/// Median of a numeric field or mode of any other field.
pub(crate) fn central_tendency(dataset: &Dataset, schema: &Schema, field: &str) -> Option<Value> {
    if schema.is_numeric(field) {
        let known: Vec<f64> = dataset.numeric_column(field).into_iter().flatten().collect();
        midpoint_median(&known).map(Value::Number)
    } else {
        mode((0..dataset.len()).map(|row| dataset.get(row, field)))
    }
}

/// Rows where `field` is present.
pub(crate) fn present_rows(dataset: &Dataset, field: &str) -> Vec<usize> {
    (0..dataset.len())
        .filter(|&row| !dataset.is_missing(row, field))
        .collect()
}
