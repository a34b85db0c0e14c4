//! Missing-Data Imputation Library
//!
//! Diagnoses why values are missing in a tabular dataset, fills them with one
//! of six estimators, scores every synthesized cell and grades the
//! completeness of the result.
//!
//! # Overview
//!
//! - **Profiling**: one pass infers a [`Schema`] (numeric, boolean,
//!   categorical, date, text or empty) that every estimator shares
//! - **Diagnosis**: per-field missingness patterns (random, systematic,
//!   correlated), predictor fields and a suggested method
//! - **Estimators**: median/mode, distance-weighted KNN, least-squares
//!   regression, seeded ensemble stumps, similarity-weighted matrix estimate
//!   and chained equations (MICE)
//! - **Audit trail**: one [`ImputedFieldRecord`] with a confidence in `[0, 1]`
//!   for each filled cell, plus aggregate statistics and quality metrics
//! - **Completeness**: before/after grading with a proceed / caution / stop
//!   recommendation
//!
//! The input dataset is never modified; results own an independent copy.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_imputation::{Dataset, ImputationConfig, ImputationMethod, impute_missing_data};
//!
//! let dataset: Dataset = serde_json::from_str(r#"[
//!     {"a": 1, "b": 2}, {"a": 2, "b": 4}, {"a": 3, "b": null}, {"a": 4, "b": 8}
//! ]"#)?;
//!
//! let config = ImputationConfig::builder()
//!     .method(ImputationMethod::Regression)
//!     .confidence_threshold(0.8)
//!     .build()?;
//!
//! let result = impute_missing_data(&dataset, &config)?;
//! println!("b[2] = {}", result.data.get(2, "b"));          // 6
//! println!("confidence = {}", result.imputed_fields[0].confidence);
//! ```
//!
//! # Diagnosis only
//!
//! ```rust,ignore
//! let diagnosis = lex_imputation::diagnose_missing_data(&dataset);
//! for pattern in &diagnosis.patterns {
//!     println!(
//!         "{}: {:?} ({:.1}% missing)",
//!         pattern.field, pattern.pattern, pattern.missing_percentage
//!     );
//! }
//! println!("suggested: {}", diagnosis.suggested_method);
//! ```
//!
//! # DataFrames
//!
//! [`Dataset::from_dataframe`] and [`Dataset::to_dataframe`] convert to and
//! from polars.

pub mod completeness;
pub mod config;
pub mod diagnosis;
pub mod engine;
pub mod error;
mod frame;
pub mod imputers;
pub mod linalg;
pub mod profiler;
pub mod quality;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use completeness::{
    DataCompletenessMetrics, FieldCompleteness, ProceedRecommendation, QualityLevel,
    analyze_original_completeness, analyze_post_imputation_completeness,
};
pub use config::{
    ConfigValidationError, ImputationConfig, ImputationConfigBuilder, ImputationMethod,
};
pub use diagnosis::MissingDataDiagnostician;
pub use engine::{
    ImputationEngine, diagnose_missing_data, impute_missing_data, impute_missing_data_async,
};
pub use error::{ImputationError, ResultExt};
pub use imputers::{
    EstimatorOutput, Imputer, KNNImputer, MiceImputer, MiceOutcome, RandomForestImputer,
    RegressionImputer, SimilarityImputer, StatisticalImputer,
};
pub use profiler::{DataProfiler, FieldProfile};
pub use quality::QualityScorer;
pub use types::{
    Dataset, Diagnosis, FieldType, ImputationResult, ImputationStatistics, ImputedFieldRecord,
    MissingDataPattern, PatternKind, QualityMetrics, Record, Schema, Value,
};
