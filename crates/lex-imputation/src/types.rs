use crate::config::ImputationMethod;
use crate::utils::{parse_boolean_string, parse_numeric_string};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Cell values
// ============================================================================

/// A single scalar cell of a record.
///
/// Date values are carried as text; the [`Schema`] marks their field as
/// [`FieldType::Date`]. Serialized untagged, so a JSON record such as
/// `{"age": 31, "city": "Oslo", "vip": true, "email": null}` round-trips.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value (`null`).
    #[default]
    Missing,
    Bool(bool),
    Number(f64),
    Text(String),
}

static MISSING: Value = Value::Missing;

impl Value {
    /// Check if the value counts as missing.
    ///
    /// `Missing`, blank text and non-finite numbers are all canonicalized
    /// as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Text(s) => s.trim().is_empty(),
            Value::Number(n) => !n.is_finite(),
            Value::Bool(_) => false,
        }
    }

    /// Numeric view of the value, parsing numeric text such as `"$1,200"`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Text(s) => parse_numeric_string(s),
            _ => None,
        }
    }

    /// Boolean view of the value, parsing strings such as `"yes"`/`"no"`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Text(s) => parse_boolean_string(s),
            _ => None,
        }
    }

    /// Key used to compare values categorically (mode, mismatch).
    ///
    /// Returns `None` for missing values.
    pub fn category_key(&self) -> Option<String> {
        match self {
            _ if self.is_missing() => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Text(s) => Some(s.trim().to_string()),
            Value::Missing => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Missing)
    }
}

// ============================================================================
// Records and datasets
// ============================================================================

/// A record maps field names to cell values.
pub type Record = BTreeMap<String, Value>;

/// An ordered collection of records sharing (approximately) one field set.
///
/// The field list keeps first-seen order so that output columns and
/// per-field processing are reproducible. A field absent from a record reads
/// as [`Value::Missing`]. Serializes as a plain array of records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Record>", into = "Vec<Record>")]
pub struct Dataset {
    fields: Vec<String>,
    rows: Vec<Record>,
}

impl Dataset {
    /// Create a dataset with an explicit field order.
    ///
    /// Keys present in rows but not listed in `fields` are appended in
    /// first-seen order.
    pub fn new(fields: Vec<String>, rows: Vec<Record>) -> Self {
        let mut dataset = Self { fields, rows };
        let extra: Vec<String> = dataset
            .rows
            .iter()
            .flat_map(|row| row.keys())
            .filter(|key| !dataset.fields.contains(key))
            .cloned()
            .collect();
        for key in extra {
            if !dataset.fields.contains(&key) {
                dataset.fields.push(key);
            }
        }
        dataset
    }

    /// Create a dataset from records, deriving the field list.
    pub fn from_records(rows: Vec<Record>) -> Self {
        Self::new(Vec::new(), rows)
    }

    /// Field names in dataset order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of fields.
    pub fn width(&self) -> usize {
        self.fields.len()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Read a cell; absent rows or fields read as missing.
    pub fn get(&self, row: usize, field: &str) -> &Value {
        self.rows
            .get(row)
            .and_then(|record| record.get(field))
            .unwrap_or(&MISSING)
    }

    /// Write a cell, registering the field if it is new.
    ///
    /// Out-of-range rows are ignored.
    pub fn set(&mut self, row: usize, field: &str, value: Value) {
        if !self.has_field(field) {
            self.fields.push(field.to_string());
        }
        if let Some(record) = self.rows.get_mut(row) {
            record.insert(field.to_string(), value);
        }
    }

    pub fn is_missing(&self, row: usize, field: &str) -> bool {
        self.get(row, field).is_missing()
    }

    /// Count missing cells in a field.
    pub fn missing_count(&self, field: &str) -> usize {
        (0..self.len()).filter(|&r| self.is_missing(r, field)).count()
    }

    /// Count missing cells across all fields.
    pub fn total_missing(&self) -> usize {
        self.fields.iter().map(|f| self.missing_count(f)).sum()
    }

    /// Total number of cells (`rows × fields`).
    pub fn total_cells(&self) -> usize {
        self.len() * self.width()
    }

    /// Row indices where the field is missing.
    pub fn missing_rows(&self, field: &str) -> Vec<usize> {
        (0..self.len()).filter(|&r| self.is_missing(r, field)).collect()
    }

    /// Numeric view of a column; non-numeric and missing cells are `None`.
    pub fn numeric_column(&self, field: &str) -> Vec<Option<f64>> {
        (0..self.len())
            .map(|r| {
                let value = self.get(r, field);
                if value.is_missing() {
                    None
                } else {
                    value.as_f64()
                }
            })
            .collect()
    }
}

impl From<Vec<Record>> for Dataset {
    fn from(rows: Vec<Record>) -> Self {
        Self::from_records(rows)
    }
}

impl From<Dataset> for Vec<Record> {
    fn from(dataset: Dataset) -> Self {
        dataset.rows
    }
}

// ============================================================================
// Schema
// ============================================================================

/// Semantic type of a field, inferred once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Numeric,
    Boolean,
    Categorical,
    Date,
    Text,
    /// No non-missing value anywhere; no estimator can be grounded on it.
    Empty,
}

impl FieldType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Numeric)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldType::Empty)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Numeric => "numeric",
            FieldType::Boolean => "boolean",
            FieldType::Categorical => "categorical",
            FieldType::Date => "date",
            FieldType::Text => "text",
            FieldType::Empty => "empty",
        }
    }
}

/// Mapping from field name to its declared semantic type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    types: BTreeMap<String, FieldType>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, field_type: FieldType) {
        self.types.insert(field.into(), field_type);
    }

    /// Type of a field; unknown fields are treated as empty.
    pub fn field_type(&self, field: &str) -> FieldType {
        self.types.get(field).copied().unwrap_or(FieldType::Empty)
    }

    pub fn is_numeric(&self, field: &str) -> bool {
        self.field_type(field).is_numeric()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

// ============================================================================
// Diagnosis
// ============================================================================

/// Classification of a field's missingness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Random,
    Systematic,
    Correlated,
}

/// Missingness statistics for one field with at least one missing value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingDataPattern {
    pub field: String,
    pub missing_count: usize,
    /// Percentage of rows missing this field (0 - 100).
    pub missing_percentage: f64,
    pub pattern: PatternKind,
    /// Fields whose missingness co-occurs with this field's.
    pub correlated_with: Vec<String>,
    /// Candidate regressors for this field.
    pub predictors: Vec<String>,
    pub confidence: f64,
}

/// Output of the diagnostician.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub patterns: Vec<MissingDataPattern>,
    pub recommendations: Vec<String>,
    pub suggested_method: ImputationMethod,
}

// ============================================================================
// Imputation results
// ============================================================================

/// Audit trail entry for one synthesized cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImputedFieldRecord {
    pub field: String,
    pub original_value: Value,
    pub imputed_value: Value,
    pub confidence: f64,
    pub method: ImputationMethod,
    pub row_index: usize,
}

/// Aggregate counters attached to an [`ImputationResult`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImputationStatistics {
    /// Missing cells in the input dataset.
    pub total_missing: usize,
    /// Cells filled by the engine.
    pub total_imputed: usize,
    /// Missing cells left in the output (degenerate fields, regression limits).
    pub remaining_missing: usize,
    pub methods_used: Vec<ImputationMethod>,
    pub average_confidence: f64,
    /// Filled cells whose confidence is below the configured threshold.
    pub low_confidence_count: usize,
}

/// Summary quality metrics on a 0 - 100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub completeness: f64,
    pub reliability: f64,
    pub consistency: f64,
}

/// Complete output of one imputation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImputationResult {
    pub data: Dataset,
    pub imputed_fields: Vec<ImputedFieldRecord>,
    pub statistics: ImputationStatistics,
    pub quality_metrics: QualityMetrics,
    /// Estimator that actually ran.
    pub method: ImputationMethod,
    /// Non-fatal conditions callers should surface (fallbacks, leftovers).
    pub warnings: Vec<String>,
}

impl ImputationResult {
    /// Check if the output still contains missing cells.
    pub fn has_remaining_missing(&self) -> bool {
        self.statistics.remaining_missing > 0
    }
}

static_assertions::assert_impl_all!(Dataset: Send, Sync);
static_assertions::assert_impl_all!(ImputationResult: Send, Sync);
