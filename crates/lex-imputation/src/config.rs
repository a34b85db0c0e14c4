//! Configuration types for the imputation engine.
//!
//! This module provides the estimator selector ([`ImputationMethod`]) and the
//! per-request [`ImputationConfig`] with a builder for fluent setup.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Estimation strategy requested by the caller or chosen by the diagnostician.
///
/// Method names parse leniently (case-insensitive, `-` and `_` are
/// interchangeable). A name that matches nothing is kept as
/// [`ImputationMethod::Unrecognized`] so the orchestrator can fall back to
/// central tendency *and* report the misconfiguration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImputationMethod {
    /// Median for numeric fields, mode for everything else.
    MeanMedian,
    /// Distance-weighted nearest neighbours.
    Knn,
    /// Ordinary least squares on numeric predictors.
    Regression,
    /// Ensemble of single-split decision stumps.
    RandomForest,
    /// Similarity-weighted matrix estimator.
    NeuralNetwork,
    /// Iterative chained-equation imputation.
    Mice,
    /// Let the diagnostician pick.
    #[default]
    Auto,
    /// Nothing to impute.
    None,
    /// A method name that matched nothing.
    Unrecognized(String),
}

impl ImputationMethod {
    /// All concrete estimators, in dispatch order.
    pub const ESTIMATORS: [ImputationMethod; 6] = [
        ImputationMethod::MeanMedian,
        ImputationMethod::Knn,
        ImputationMethod::Regression,
        ImputationMethod::RandomForest,
        ImputationMethod::NeuralNetwork,
        ImputationMethod::Mice,
    ];

    /// Canonical name of the method.
    pub fn as_str(&self) -> &str {
        match self {
            Self::MeanMedian => "mean_median",
            Self::Knn => "knn",
            Self::Regression => "regression",
            Self::RandomForest => "random_forest",
            Self::NeuralNetwork => "neural_network",
            Self::Mice => "mice",
            Self::Auto => "auto",
            Self::None => "none",
            Self::Unrecognized(name) => name,
        }
    }
}

impl From<&str> for ImputationMethod {
    fn from(name: &str) -> Self {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "mean_median" | "mean" | "median" | "mode" | "statistical" => Self::MeanMedian,
            "knn" => Self::Knn,
            "regression" | "linear_regression" => Self::Regression,
            "random_forest" | "forest" => Self::RandomForest,
            "neural_network" | "neural" | "similarity" => Self::NeuralNetwork,
            "mice" => Self::Mice,
            "auto" | "" => Self::Auto,
            "none" => Self::None,
            _ => Self::Unrecognized(name.trim().to_string()),
        }
    }
}

impl From<String> for ImputationMethod {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<ImputationMethod> for String {
    fn from(method: ImputationMethod) -> Self {
        method.as_str().to_string()
    }
}

impl fmt::Display for ImputationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for one imputation request.
///
/// Use [`ImputationConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use lex_imputation::config::{ImputationConfig, ImputationMethod};
///
/// let config = ImputationConfig::builder()
///     .method(ImputationMethod::Mice)
///     .max_iterations(20)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputationConfig {
    /// Estimator to run.
    /// Default: Auto
    pub method: ImputationMethod,

    /// Confidence below which a filled cell is counted as low-confidence.
    /// Advisory only; estimators never consult it.
    /// Default: 0.7
    pub confidence_threshold: f64,

    /// Hard cap on MICE passes.
    /// Default: 10
    pub max_iterations: usize,

    /// Add a `<field>_imputed = true` flag to every row that received a value.
    /// Default: true
    pub mark_imputed: bool,

    /// Number of neighbours for KNN.
    /// If None, derived from the row count as `max(1, min(5, rows / 10))`.
    /// Default: None
    pub knn_neighbors: Option<usize>,

    /// Number of stumps in the ensemble tree estimator.
    /// Default: 10
    pub forest_trees: usize,

    /// Seed for the ensemble tree estimator's bootstrap sampling.
    /// Default: 42
    pub random_seed: u64,
}

impl Default for ImputationConfig {
    fn default() -> Self {
        Self {
            method: ImputationMethod::Auto,
            confidence_threshold: 0.7,
            max_iterations: 10,
            mark_imputed: true,
            knn_neighbors: None,
            forest_trees: 10,
            random_seed: 42,
        }
    }
}

impl ImputationConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ImputationConfigBuilder {
        ImputationConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "confidence_threshold".to_string(),
                value: self.confidence_threshold,
            });
        }

        if self.max_iterations == 0 {
            return Err(ConfigValidationError::InvalidMaxIterations(
                self.max_iterations,
            ));
        }

        if self.knn_neighbors == Some(0) {
            return Err(ConfigValidationError::InvalidKnnNeighbors(0));
        }

        if self.forest_trees == 0 {
            return Err(ConfigValidationError::InvalidForestTrees(self.forest_trees));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid max iterations: {0} (must be at least 1)")]
    InvalidMaxIterations(usize),

    #[error("Invalid KNN neighbors: {0} (must be at least 1)")]
    InvalidKnnNeighbors(usize),

    #[error("Invalid forest size: {0} (must be at least 1)")]
    InvalidForestTrees(usize),
}

/// Builder for [`ImputationConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ImputationConfigBuilder {
    method: Option<ImputationMethod>,
    confidence_threshold: Option<f64>,
    max_iterations: Option<usize>,
    mark_imputed: Option<bool>,
    knn_neighbors: Option<usize>,
    forest_trees: Option<usize>,
    random_seed: Option<u64>,
}

impl ImputationConfigBuilder {
    /// Set the estimator.
    pub fn method(mut self, method: ImputationMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the estimator by name; unknown names are kept as
    /// [`ImputationMethod::Unrecognized`].
    pub fn method_name(mut self, name: &str) -> Self {
        self.method = Some(ImputationMethod::from(name));
        self
    }

    /// Set the advisory confidence threshold.
    ///
    /// # Arguments
    /// * `threshold` - Value between 0.0 and 1.0
    pub fn confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = Some(threshold);
        self
    }

    /// Set the hard cap on MICE passes.
    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    /// Enable or disable `<field>_imputed` flags.
    pub fn mark_imputed(mut self, mark: bool) -> Self {
        self.mark_imputed = Some(mark);
        self
    }

    /// Override the derived number of KNN neighbours.
    pub fn knn_neighbors(mut self, k: usize) -> Self {
        self.knn_neighbors = Some(k);
        self
    }

    /// Set the number of stumps in the ensemble tree estimator.
    pub fn forest_trees(mut self, trees: usize) -> Self {
        self.forest_trees = Some(trees);
        self
    }

    /// Set the bootstrap sampling seed.
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ImputationConfig` or an error if validation fails.
    pub fn build(self) -> Result<ImputationConfig, ConfigValidationError> {
        let defaults = ImputationConfig::default();
        let config = ImputationConfig {
            method: self.method.unwrap_or(defaults.method),
            confidence_threshold: self
                .confidence_threshold
                .unwrap_or(defaults.confidence_threshold),
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            mark_imputed: self.mark_imputed.unwrap_or(defaults.mark_imputed),
            knn_neighbors: self.knn_neighbors.or(defaults.knn_neighbors),
            forest_trees: self.forest_trees.unwrap_or(defaults.forest_trees),
            random_seed: self.random_seed.unwrap_or(defaults.random_seed),
        };

        config.validate()?;
        Ok(config)
    }
}
