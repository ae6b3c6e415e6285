//! Column-level helpers over polars DataFrames.
//!
//! The dataset type throughout the workspace is a plain `DataFrame`. These
//! helpers turn polars' dynamic column access into typed results with
//! [`SchemaError`] on the failure paths.

use ndarray::{Array1, Array2};
use polars::prelude::*;

use crate::error::{SchemaError, TransformError};

/// Column names in frame order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

/// Fail with the first requested column that is absent.
pub fn require_columns<S: AsRef<str>>(df: &DataFrame, columns: &[S]) -> Result<(), SchemaError> {
    for column in columns {
        let column = column.as_ref();
        if df.column(column).is_err() {
            return Err(SchemaError::MissingColumn(column.to_string()));
        }
    }
    Ok(())
}

/// Read a text column. Nulls are rejected.
pub fn string_values(df: &DataFrame, column: &str) -> Result<Vec<String>, TransformError> {
    let col = df
        .column(column)
        .map_err(|_| SchemaError::MissingColumn(column.to_string()))?;
    if col.dtype() != &DataType::String {
        return Err(SchemaError::TypeMismatch {
            column: column.to_string(),
            expected: "String".into(),
            actual: col.dtype().to_string(),
        }
        .into());
    }
    let ca = col.str()?;
    ca.into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.map(str::to_string).ok_or_else(|| {
                SchemaError::NullValue {
                    column: column.to_string(),
                    row,
                }
                .into()
            })
        })
        .collect()
}

/// Read a column as `f64`, casting from any non-text dtype. Nulls are rejected.
pub fn numeric_values(df: &DataFrame, column: &str) -> Result<Vec<f64>, TransformError> {
    let col = df
        .column(column)
        .map_err(|_| SchemaError::MissingColumn(column.to_string()))?;
    if col.dtype() == &DataType::String {
        return Err(SchemaError::TypeMismatch {
            column: column.to_string(),
            expected: "numeric".into(),
            actual: col.dtype().to_string(),
        }
        .into());
    }
    let casted = col.cast(&DataType::Float64)?;
    let ca = casted.f64()?;
    ca.into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| {
                SchemaError::NullValue {
                    column: column.to_string(),
                    row,
                }
                .into()
            })
        })
        .collect()
}

/// Dense row-major feature matrix from every column of the frame.
pub fn to_feature_matrix(df: &DataFrame) -> Result<Array2<f64>, TransformError> {
    let names = column_names(df);
    let mut matrix = Array2::<f64>::zeros((df.height(), names.len()));
    for (j, name) in names.iter().enumerate() {
        let values = numeric_values(df, name)?;
        for (i, v) in values.into_iter().enumerate() {
            matrix[[i, j]] = v;
        }
    }
    Ok(matrix)
}

/// Extract a numeric target column as a vector.
pub fn target_vector(df: &DataFrame, column: &str) -> Result<Array1<f64>, TransformError> {
    numeric_values(df, column).map(Array1::from)
}
