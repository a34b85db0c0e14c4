//! Custom error types for the imputation engine.
//!
//! Only [`ImputationError::EmptyDataset`] and
//! [`ImputationError::InvalidConfig`] escape the engine's public entry
//! points. The estimation variants (`SingularSystem`,
//! `InsufficientData`, `NoPredictors`) are produced by the estimators'
//! private computations and absorbed there: the affected field is skipped
//! and the cells stay missing.
//!
//! `Io` and `Json` come from reading and writing datasets as JSON.
//!
//! Errors are serializable so they can be handed to a frontend or written
//! into a JSON report unchanged.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the imputation engine.
#[derive(Error, Debug)]
pub enum ImputationError {
    /// The dataset has no rows.
    #[error("Dataset is empty; nothing to diagnose or impute")]
    EmptyDataset,

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The normal-equation system could not be solved (near-zero pivot).
    #[error("Linear system for field '{0}' is singular")]
    SingularSystem(String),

    /// Too few usable rows to fit a model for the field.
    #[error("Field '{field}' has {rows} usable rows, at least {required} required")]
    InsufficientData {
        field: String,
        rows: usize,
        required: usize,
    },

    /// No usable predictor fields exist for the field.
    #[error("No usable predictor fields for '{0}'")]
    NoPredictors(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ImputationError>,
    },
}

impl ImputationError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ImputationError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for callers that branch on the failure kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyDataset => "EMPTY_DATASET",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::SingularSystem(_) => "SINGULAR_SYSTEM",
            Self::InsufficientData { .. } => "INSUFFICIENT_DATA",
            Self::NoPredictors(_) => "NO_PREDICTORS",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is an input error (the whole call is rejected).
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::EmptyDataset | Self::InvalidConfig(_) => true,
            Self::WithContext { source, .. } => source.is_input_error(),
            _ => false,
        }
    }

    /// Check if this error is a field-local estimation failure.
    ///
    /// Estimators absorb these and skip the affected field.
    pub fn is_field_local(&self) -> bool {
        match self {
            Self::SingularSystem(_) | Self::InsufficientData { .. } | Self::NoPredictors(_) => {
                true
            }
            Self::WithContext { source, .. } => source.is_field_local(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for ImputationError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ImputationError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for imputation operations.
pub type Result<T> = std::result::Result<T, ImputationError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ImputationError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::io::Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ImputationError::Io(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(ImputationError::EmptyDataset.error_code(), "EMPTY_DATASET");
        assert_eq!(
            ImputationError::NoPredictors("age".to_string()).error_code(),
            "NO_PREDICTORS"
        );
        assert_eq!(
            ImputationError::InsufficientData {
                field: "age".to_string(),
                rows: 1,
                required: 3
            }
            .error_code(),
            "INSUFFICIENT_DATA"
        );
    }

    #[test]
    fn test_is_input_error() {
        assert!(ImputationError::EmptyDataset.is_input_error());
        assert!(!ImputationError::SingularSystem("x".to_string()).is_input_error());
    }

    #[test]
    fn test_is_field_local() {
        assert!(ImputationError::SingularSystem("x".to_string()).is_field_local());
        assert!(ImputationError::NoPredictors("x".to_string()).is_field_local());
        assert!(!ImputationError::EmptyDataset.is_field_local());
    }

    #[test]
    fn test_error_serialization() {
        let error = ImputationError::SingularSystem("Age".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("SINGULAR_SYSTEM"));
        assert!(json.contains("Age"));
    }

    #[test]
    fn test_io_context() {
        let result: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ));
        let error = result.context("Reading data.json").unwrap_err();
        assert_eq!(error.error_code(), "IO_ERROR");
        assert!(error.to_string().starts_with("Reading data.json"));
    }

    #[test]
    fn test_with_context() {
        let error = ImputationError::EmptyDataset.with_context("During imputation");
        assert!(error.to_string().contains("During imputation"));
        assert_eq!(error.error_code(), "EMPTY_DATASET");
        assert!(error.is_input_error());
    }
}
