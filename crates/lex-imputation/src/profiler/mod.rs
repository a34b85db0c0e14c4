//! Field profiling for imputation.
//!
//! This module builds the explicit [`Schema`] every estimator receives, so
//! types are sniffed once per request instead of per estimator call, and the
//! per-field summaries shown by the CLI.

mod type_inference;

pub(crate) use type_inference::infer_field_type;

use crate::types::{Dataset, FieldType, Schema};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Per-field summary of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldProfile {
    pub name: String,
    pub field_type: FieldType,
    pub missing_count: usize,
    /// Percentage of rows missing this field (0 - 100).
    pub missing_percentage: f64,
    /// Distinct non-missing values.
    pub unique_count: usize,
}

/// Data profiler for analyzing dataset structure.
pub struct DataProfiler;

impl DataProfiler {
    /// Infer the semantic type of every field.
    pub fn infer_schema(dataset: &Dataset) -> Schema {
        let mut schema = Schema::new();
        for field in dataset.fields() {
            let field_type =
                infer_field_type((0..dataset.len()).map(|row| dataset.get(row, field)));
            debug!("Field '{}' inferred as {}", field, field_type.as_str());
            schema.insert(field.clone(), field_type);
        }
        schema
    }

    /// Profile every field of the dataset, in dataset order.
    pub fn profile_dataset(dataset: &Dataset) -> Vec<FieldProfile> {
        let schema = Self::infer_schema(dataset);
        dataset
            .fields()
            .iter()
            .map(|field| {
                let missing_count = dataset.missing_count(field);
                let unique_count = (0..dataset.len())
                    .filter_map(|row| dataset.get(row, field).category_key())
                    .collect::<HashSet<_>>()
                    .len();
                FieldProfile {
                    name: field.clone(),
                    field_type: schema.field_type(field),
                    missing_count,
                    missing_percentage: percentage(missing_count, dataset.len()),
                    unique_count,
                }
            })
            .collect()
    }
}

/// `part / whole` as a percentage; 0 when `whole` is 0.
pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
