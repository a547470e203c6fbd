//! # Transformer Implementations
//!
//! The submodules contain the transformers the rule interpreter is built from.
//! This module also hosts the small helpers they share for validating and reading columns.

pub mod categorical_encoding;
pub mod feature_creation;
pub mod feature_selection;
pub mod imputation;
pub mod type_conversion;
pub mod variable_discretization;

use crate::exceptions::{PreprocError, PreprocResult};
use datafusion::arrow::array::{Array, Float64Array};
use datafusion::arrow::datatypes::DataType;
use datafusion::logical_expr::{cast, ident, Expr};
use datafusion::prelude::*;
use datafusion::scalar::ScalarValue;

/// Unqualified column reference. Names are taken verbatim, so generated names such as
/// `Fare_7.25` or `1stFlrSF` are never split into relation and column parts.
pub(crate) fn column(name: &str) -> Expr {
    ident(name)
}

/// Names of the DataFrame's columns, in order.
pub(crate) fn column_names(df: &DataFrame) -> Vec<String> {
    df.schema()
        .fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect()
}

/// Validates that every column in `target_cols` exists in the DataFrame.
/// Returns an error if any target column is missing.
pub(crate) fn validate_columns(df: &DataFrame, target_cols: &[String]) -> PreprocResult<()> {
    let schema = df.schema();
    for col_name in target_cols {
        if schema.field_with_name(None, col_name).is_err() {
            return Err(PreprocError::MissingColumn(format!(
                "Column '{}' not found in DataFrame",
                col_name
            )));
        }
    }
    Ok(())
}

/// Validates that a column exists and holds numbers.
pub(crate) fn validate_numeric_column(df: &DataFrame, col_name: &str) -> PreprocResult<()> {
    let field = df.schema().field_with_name(None, col_name).map_err(|_| {
        PreprocError::MissingColumn(format!("Column '{}' not found in DataFrame", col_name))
    })?;
    if field.data_type().is_numeric() {
        Ok(())
    } else {
        Err(PreprocError::InvalidData(format!(
            "Column '{}' must be numeric, but found {:?}",
            col_name,
            field.data_type()
        )))
    }
}

/// Reads every value of a column (missing values included) in row order.
pub(crate) async fn collect_scalars(
    df: &DataFrame,
    col_name: &str,
) -> PreprocResult<Vec<ScalarValue>> {
    let batches = df.clone().select(vec![column(col_name)])?.collect().await?;
    let mut values = Vec::new();
    for batch in batches {
        let array = batch.column(0);
        for i in 0..array.len() {
            values.push(ScalarValue::try_from_array(array, i)?);
        }
    }
    Ok(values)
}

/// Reads the non-missing values of a numeric column as `f64`, in row order.
pub(crate) async fn collect_f64(df: &DataFrame, col_name: &str) -> PreprocResult<Vec<f64>> {
    validate_numeric_column(df, col_name)?;
    let batches = df
        .clone()
        .select(vec![cast(column(col_name), DataType::Float64).alias(col_name)])?
        .collect()
        .await?;
    let mut values = Vec::new();
    for batch in batches {
        let array = batch
            .column(0)
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| {
                PreprocError::InvalidData(format!("Expected Float64 array for column {}", col_name))
            })?;
        values.extend(array.iter().flatten());
    }
    Ok(values)
}

/// Text used for a category when it becomes part of a generated column name.
pub(crate) fn category_label(value: &ScalarValue) -> String {
    match value {
        ScalarValue::Utf8(Some(s))
        | ScalarValue::LargeUtf8(Some(s))
        | ScalarValue::Utf8View(Some(s)) => s.clone(),
        other => other.to_string(),
    }
}
