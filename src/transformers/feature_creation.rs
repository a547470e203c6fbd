//! ## Transformers for creating new features
//!
//! This module provides transformers that derive new columns from existing ones.
//!
//! Currently, the following transformers are implemented:
//!
//! - **SumFeatures:** Adds a column holding the sum of other numeric columns plus a constant.
//! - **RegexExtractor:** Adds a column holding the first capture group of a pattern matched
//!   against a text column (missing when the pattern does not match).
//! - **PrefixExtractor:** Adds a column holding the first characters of a text column.
//!
//! Each transformer provides a constructor, an (async) `fit` method validating its inputs, and a
//! `transform` method that returns a new DataFrame with the new column appended (or replaced,
//! if a column with the same name already exists).

use super::{column, validate_columns, validate_numeric_column};
use crate::exceptions::{PreprocError, PreprocResult};
use crate::impl_transformer;
use datafusion::arrow::datatypes::DataType;
use datafusion::functions_nested::expr_fn::array_element;
use datafusion::prelude::*;
use datafusion_expr::{lit, Expr};

/// Validates that a column exists and holds text.
fn validate_text_column(df: &DataFrame, col_name: &str) -> PreprocResult<()> {
    let field = df.schema().field_with_name(None, col_name).map_err(|_| {
        PreprocError::MissingColumn(format!("Column '{}' not found in DataFrame", col_name))
    })?;
    match field.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => Ok(()),
        dt => Err(PreprocError::InvalidData(format!(
            "Column '{}' must be a text column, but found {:?}",
            col_name, dt
        ))),
    }
}

fn validate_output_name(name: &str) -> PreprocResult<()> {
    if name.trim().is_empty() {
        return Err(PreprocError::InvalidParameter(
            "New feature name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Appends `expr` as column `name`, replacing an existing column of that name.
fn append_feature(df: DataFrame, name: &str, expr: Expr) -> PreprocResult<DataFrame> {
    let mut exprs: Vec<Expr> = df
        .schema()
        .fields()
        .iter()
        .filter(|field| field.name() != name)
        .map(|field| column(field.name()))
        .collect();
    exprs.push(expr.alias(name));
    df.select(exprs).map_err(PreprocError::from)
}

/// Creates a new feature as the sum of existing numeric columns plus a constant offset,
/// e.g. a family size computed as siblings + parents + 1.
pub struct SumFeatures {
    pub name: String,
    pub columns: Vec<String>,
    pub offset: i64,
}

impl SumFeatures {
    pub fn new(name: impl Into<String>, columns: Vec<String>, offset: i64) -> Self {
        Self {
            name: name.into(),
            columns,
            offset,
        }
    }

    /// Validates that the summed columns exist and are numeric.
    pub async fn fit(&mut self, df: &DataFrame) -> PreprocResult<()> {
        validate_output_name(&self.name)?;
        if self.columns.is_empty() {
            return Err(PreprocError::InvalidParameter(format!(
                "SumFeatures '{}' needs at least one column",
                self.name
            )));
        }
        for col_name in &self.columns {
            validate_numeric_column(df, col_name)?;
        }
        Ok(())
    }

    /// Adds the sum column to the DataFrame.
    pub fn transform(&self, df: DataFrame) -> PreprocResult<DataFrame> {
        validate_columns(&df, &self.columns)?;
        let sum = self
            .columns
            .iter()
            .map(|c| column(c))
            .fold(lit(self.offset), |acc, e| acc + e);
        append_feature(df, &self.name, sum)
    }

    fn inherent_is_stateful(&self) -> bool {
        false
    }
}

/// Extracts the first capture group of `pattern` from a text column into a new column.
/// Only the first match in each value is considered.
pub struct RegexExtractor {
    pub source: String,
    pub output: String,
    pub pattern: String,
}

impl RegexExtractor {
    pub fn new(
        source: impl Into<String>,
        output: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            pattern: pattern.into(),
        }
    }

    /// Validates the source column and that the pattern has a capture group.
    pub async fn fit(&mut self, df: &DataFrame) -> PreprocResult<()> {
        validate_output_name(&self.output)?;
        validate_text_column(df, &self.source)?;
        if !self.pattern.contains('(') {
            return Err(PreprocError::InvalidParameter(format!(
                "Pattern '{}' must contain a capture group",
                self.pattern
            )));
        }
        Ok(())
    }

    /// Adds the extracted column to the DataFrame.
    pub fn transform(&self, df: DataFrame) -> PreprocResult<DataFrame> {
        validate_text_column(&df, &self.source)?;
        let matched = datafusion_functions::regex::regexp_match()
            .call(vec![column(&self.source), lit(self.pattern.clone())]);
        append_feature(df, &self.output, array_element(matched, lit(1_i64)))
    }

    fn inherent_is_stateful(&self) -> bool {
        false
    }
}

/// Extracts the first `length` characters of a text column into a new column.
pub struct PrefixExtractor {
    pub source: String,
    pub output: String,
    pub length: usize,
}

impl PrefixExtractor {
    pub fn new(source: impl Into<String>, output: impl Into<String>, length: usize) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            length,
        }
    }

    pub async fn fit(&mut self, df: &DataFrame) -> PreprocResult<()> {
        validate_output_name(&self.output)?;
        if self.length == 0 {
            return Err(PreprocError::InvalidParameter(
                "Prefix length must be at least 1".to_string(),
            ));
        }
        validate_text_column(df, &self.source)
    }

    /// Adds the prefix column to the DataFrame.
    pub fn transform(&self, df: DataFrame) -> PreprocResult<DataFrame> {
        validate_text_column(&df, &self.source)?;
        let prefix = datafusion_functions::unicode::left()
            .call(vec![column(&self.source), lit(self.length as i64)]);
        append_feature(df, &self.output, prefix)
    }

    fn inherent_is_stateful(&self) -> bool {
        false
    }
}

impl_transformer!(SumFeatures);
impl_transformer!(RegexExtractor);
impl_transformer!(PrefixExtractor);
