//! Imputation orchestration.
//!
//! The engine profiles the dataset once, resolves the requested method
//! (`auto` asks the diagnostician), runs the estimator and assembles the
//! [`ImputationResult`] with statistics, quality metrics and warnings.

use crate::config::{ImputationConfig, ImputationMethod};
use crate::diagnosis::MissingDataDiagnostician;
use crate::error::{ImputationError, Result};
use crate::imputers::{
    EstimatorOutput, Imputer, KNNImputer, MiceImputer, RandomForestImputer, RegressionImputer,
    SimilarityImputer, StatisticalImputer,
};
use crate::profiler::DataProfiler;
use crate::quality::QualityScorer;
use crate::types::{
    Dataset, Diagnosis, FieldType, ImputationResult, ImputedFieldRecord, Schema, Value,
};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Suffix of the marker field added next to each imputed field.
pub const IMPUTED_MARKER_SUFFIX: &str = "_imputed";

/// A request that passed validation and method resolution.
struct Plan {
    schema: Schema,
    method: ImputationMethod,
    warnings: Vec<String>,
}

/// Runs imputation requests with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct ImputationEngine {
    config: ImputationConfig,
}

impl ImputationEngine {
    pub fn new(config: ImputationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImputationConfig {
        &self.config
    }

    /// Diagnose missingness without imputing.
    pub fn diagnose(&self, dataset: &Dataset) -> Diagnosis {
        MissingDataDiagnostician::diagnose(dataset)
    }

    /// Impute `dataset`. The input is never modified.
    pub fn impute(&self, dataset: &Dataset) -> Result<ImputationResult> {
        let plan = self.plan(dataset)?;
        let output = Self::run_estimator(&plan.method, dataset, &plan.schema, &self.config);
        Ok(self.finish(dataset, plan, output))
    }

    /// Async variant of [`impute`](Self::impute); awaits the similarity
    /// estimator's async entry point.
    pub async fn impute_async(&self, dataset: &Dataset) -> Result<ImputationResult> {
        let plan = self.plan(dataset)?;
        let output = match plan.method {
            ImputationMethod::NeuralNetwork => {
                SimilarityImputer
                    .impute_async(dataset, &plan.schema, &self.config)
                    .await
            }
            ref method => Self::run_estimator(method, dataset, &plan.schema, &self.config),
        };
        Ok(self.finish(dataset, plan, output))
    }

    fn plan(&self, dataset: &Dataset) -> Result<Plan> {
        if dataset.is_empty() {
            return Err(ImputationError::EmptyDataset);
        }
        self.config
            .validate()
            .map_err(|e| ImputationError::InvalidConfig(e.to_string()))?;

        info!(
            "Starting imputation: {} rows, {} fields, {} missing cells",
            dataset.len(),
            dataset.width(),
            dataset.total_missing()
        );

        let schema = DataProfiler::infer_schema(dataset);
        let mut warnings = Vec::new();

        let method = match &self.config.method {
            ImputationMethod::Auto => {
                let suggested = MissingDataDiagnostician::diagnose(dataset).suggested_method;
                info!("Auto-selected method: {}", suggested);
                suggested
            }
            ImputationMethod::Unrecognized(name) => {
                let message = format!(
                    "Unknown imputation method '{}', falling back to {}",
                    name,
                    ImputationMethod::MeanMedian
                );
                warn!("{}", message);
                warnings.push(message);
                ImputationMethod::MeanMedian
            }
            method => method.clone(),
        };

        for field in dataset.fields() {
            if schema.field_type(field) == FieldType::Empty {
                warnings.push(format!("Field '{}' has no values and was left empty", field));
            }
        }

        Ok(Plan {
            schema,
            method,
            warnings,
        })
    }

    fn run_estimator(
        method: &ImputationMethod,
        dataset: &Dataset,
        schema: &Schema,
        config: &ImputationConfig,
    ) -> EstimatorOutput {
        let estimator: Box<dyn Imputer> = match method {
            ImputationMethod::MeanMedian => Box::new(StatisticalImputer),
            ImputationMethod::Knn => Box::new(KNNImputer),
            ImputationMethod::Regression => Box::new(RegressionImputer),
            ImputationMethod::RandomForest => Box::new(RandomForestImputer),
            ImputationMethod::NeuralNetwork => Box::new(SimilarityImputer),
            ImputationMethod::Mice => Box::new(MiceImputer),
            ImputationMethod::None | ImputationMethod::Auto | ImputationMethod::Unrecognized(_) => {
                debug!("No estimator for method {}, returning input unchanged", method);
                return EstimatorOutput::new(dataset);
            }
        };
        info!("Running {} estimator", estimator.method());
        estimator.impute(dataset, schema, config)
    }

    fn finish(&self, original: &Dataset, plan: Plan, output: EstimatorOutput) -> ImputationResult {
        let Plan {
            method,
            mut warnings,
            ..
        } = plan;
        let EstimatorOutput {
            mut data,
            imputed: imputed_fields,
        } = output;

        let remaining_missing: usize = original
            .fields()
            .iter()
            .map(|field| data.missing_count(field))
            .sum();
        if remaining_missing > 0 {
            warnings.push(format!(
                "{} cell(s) remain missing after imputation",
                remaining_missing
            ));
        }

        if self.config.mark_imputed {
            mark_imputed(&mut data, &imputed_fields);
        }

        let statistics = QualityScorer::statistics(
            &imputed_fields,
            original.total_missing(),
            remaining_missing,
            self.config.confidence_threshold,
        );
        let quality_metrics = QualityScorer::quality_metrics(&statistics);

        info!(
            "Imputation finished: {} cell(s) imputed with {}, average confidence {:.3}",
            statistics.total_imputed, method, statistics.average_confidence
        );

        ImputationResult {
            data,
            imputed_fields,
            statistics,
            quality_metrics,
            method,
            warnings,
        }
    }
}

/// Add a `<field>_imputed` boolean to every row for each field that received
/// fills: `true` where the cell was filled, `false` elsewhere.
fn mark_imputed(data: &mut Dataset, imputed_fields: &[ImputedFieldRecord]) {
    let mut filled: Vec<(&str, HashSet<usize>)> = Vec::new();
    for record in imputed_fields {
        match filled.iter_mut().find(|(field, _)| *field == record.field) {
            Some((_, rows)) => {
                rows.insert(record.row_index);
            }
            None => filled.push((record.field.as_str(), HashSet::from([record.row_index]))),
        }
    }

    for (field, rows) in filled {
        let marker = format!("{}{}", field, IMPUTED_MARKER_SUFFIX);
        for row in 0..data.len() {
            data.set(row, &marker, Value::Bool(rows.contains(&row)));
        }
    }
}

/// Diagnose missingness patterns and suggest an estimator.
pub fn diagnose_missing_data(dataset: &Dataset) -> Diagnosis {
    MissingDataDiagnostician::diagnose(dataset)
}

/// Impute `dataset` with `config`.
///
/// Fails only for an empty dataset or an invalid configuration; estimator
/// problems on individual fields leave those cells missing and are reported
/// through the result's statistics and warnings.
pub fn impute_missing_data(
    dataset: &Dataset,
    config: &ImputationConfig,
) -> Result<ImputationResult> {
    ImputationEngine::new(config.clone()).impute(dataset)
}

/// Async variant of [`impute_missing_data`].
pub async fn impute_missing_data_async(
    dataset: &Dataset,
    config: &ImputationConfig,
) -> Result<ImputationResult> {
    ImputationEngine::new(config.clone()).impute_async(dataset).await
}
