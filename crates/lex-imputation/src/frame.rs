//! Conversion between [`Dataset`], polars [`DataFrame`] and JSON files.

use crate::error::{Result, ResultExt};
use crate::profiler::infer_field_type;
use crate::types::{Dataset, FieldType, Record, Schema, Value};
use polars::prelude::*;
use std::path::Path;

/// Map one polars cell to a [`Value`].
fn any_value_to_value(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Missing,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::String(s) => Value::from(s),
        AnyValue::StringOwned(s) => Value::from(s.as_str()),
        AnyValue::Float32(x) => Value::Number(x as f64),
        AnyValue::Float64(x) => Value::Number(x),
        AnyValue::Int8(x) => Value::Number(x as f64),
        AnyValue::Int16(x) => Value::Number(x as f64),
        AnyValue::Int32(x) => Value::Number(x as f64),
        AnyValue::Int64(x) => Value::Number(x as f64),
        AnyValue::UInt8(x) => Value::Number(x as f64),
        AnyValue::UInt16(x) => Value::Number(x as f64),
        AnyValue::UInt32(x) => Value::Number(x as f64),
        AnyValue::UInt64(x) => Value::Number(x as f64),
        other => Value::Text(other.to_string()),
    }
}

impl Dataset {
    /// Build a dataset from a DataFrame, keeping its column order.
    ///
    /// Nulls become [`Value::Missing`], integers and floats become numbers,
    /// booleans stay booleans, strings become text and any other dtype is
    /// stringified.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let fields: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let mut rows: Vec<Record> = vec![Record::new(); df.height()];

        for column in df.get_columns() {
            let name = column.name().to_string();
            let series = column.as_materialized_series();
            for (i, row) in rows.iter_mut().enumerate() {
                let value = series
                    .get(i)
                    .context(format!("Reading row {} of column '{}'", i, name))?;
                row.insert(name.clone(), any_value_to_value(value));
            }
        }

        Ok(Dataset::new(fields, rows))
    }

    /// Build a typed DataFrame.
    ///
    /// Numeric fields become `Float64`, boolean fields `Boolean`, everything
    /// else `String`. Fields unknown to `schema` (such as imputation markers)
    /// are typed from their values.
    pub fn to_dataframe(&self, schema: &Schema) -> Result<DataFrame> {
        let columns: Vec<Column> = self
            .fields()
            .iter()
            .map(|field| {
                let values = (0..self.len()).map(|row| self.get(row, field));
                let field_type = match schema.field_type(field) {
                    FieldType::Empty => infer_field_type(values.clone()),
                    known => known,
                };

                let series = match field_type {
                    FieldType::Numeric => {
                        let data: Vec<Option<f64>> = values
                            .map(|v| if v.is_missing() { None } else { v.as_f64() })
                            .collect();
                        Series::new(field.as_str().into(), data)
                    }
                    FieldType::Boolean => {
                        let data: Vec<Option<bool>> = values
                            .map(|v| if v.is_missing() { None } else { v.as_bool() })
                            .collect();
                        Series::new(field.as_str().into(), data)
                    }
                    _ => {
                        let data: Vec<Option<String>> = values
                            .map(|v| (!v.is_missing()).then(|| v.to_string()))
                            .collect();
                        Series::new(field.as_str().into(), data)
                    }
                };
                Column::from(series)
            })
            .collect();

        DataFrame::new(columns).context("Building DataFrame from dataset")
    }

    /// Parse a JSON array of records.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON array of records from `path`.
    pub fn read_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).context(format!("Reading {}", path.display()))?;
        Self::from_json_str(&content).context(format!("Parsing {}", path.display()))
    }

    /// Pretty-printed JSON array of records.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiler::DataProfiler;

    #[test]
    fn test_from_dataframe() {
        let df = df![
            "age" => [Some(30i64), None, Some(41)],
            "name" => [Some("Ana"), Some("Bo"), None],
            "active" => [Some(true), Some(false), None],
        ]
        .unwrap();

        let ds = Dataset::from_dataframe(&df).unwrap();
        assert_eq!(ds.fields(), &["age", "name", "active"]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.get(0, "age"), &Value::Number(30.0));
        assert!(ds.is_missing(1, "age"));
        assert_eq!(ds.get(1, "name"), &Value::from("Bo"));
        assert_eq!(ds.get(0, "active"), &Value::Bool(true));
        assert_eq!(ds.total_missing(), 3);
    }

    #[test]
    fn test_to_dataframe_types() {
        let df = df![
            "x" => [Some(1.5), None, Some(3.0)],
            "c" => [Some("a"), Some("b"), None],
        ]
        .unwrap();
        let mut ds = Dataset::from_dataframe(&df).unwrap();
        let schema = DataProfiler::infer_schema(&ds);
        ds.set(1, "x_imputed", Value::Bool(true));

        let out = ds.to_dataframe(&schema).unwrap();
        assert_eq!(out.width(), 3);
        assert_eq!(out.column("x").unwrap().dtype(), &DataType::Float64);
        assert_eq!(out.column("c").unwrap().dtype(), &DataType::String);
        assert_eq!(out.column("x_imputed").unwrap().dtype(), &DataType::Boolean);
        assert_eq!(out.column("x").unwrap().null_count(), 1);
    }

    #[test]
    fn test_json_round_trip() {
        let ds = Dataset::from_json_str(r#"[{"a": 1, "b": "x"}, {"a": null, "b": true}]"#).unwrap();
        assert_eq!(ds.fields(), &["a", "b"]);
        assert!(ds.is_missing(1, "a"));

        let back = Dataset::from_json_str(&ds.to_json_string().unwrap()).unwrap();
        assert_eq!(back, ds);
    }

    #[test]
    fn test_json_errors() {
        let err = Dataset::from_json_str("{not json").unwrap_err();
        assert_eq!(err.error_code(), "JSON_ERROR");

        let err = Dataset::read_json("/nonexistent/lex-imputation/data.json").unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
        assert!(err.to_string().contains("data.json"));
    }
}
