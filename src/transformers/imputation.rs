//! ## Transformers for imputing missing values
//!
//! This module provides the transformers (or imputers) the rule interpreter uses for dealing
//! with missing values.
//!
//! Currently, the following transformers are implemented:
//!
//! - **ArbitraryValueImputer**: Fills missing values with a fixed value (number or text).
//! - **ModeImputer**: Fills missing values with the most frequent value of the column.
//! - **GroupMedianImputer**: Fills missing values with the median of the row's group, falling
//!   back to the median of the whole column.
//! - **DropMissingData**: Filters out rows that contain a missing value in the specified columns.
//!
//! Each transformer returns a new DataFrame with the imputation strategy applied to the specified columns.
//! Errors are returned as `PreprocError` and results are wrapped in `PreprocResult`.

use super::{column, validate_columns, validate_numeric_column};
use crate::exceptions::{PreprocError, PreprocResult};
use crate::impl_transformer;
use crate::rules::FillValue;
use datafusion::arrow::datatypes::DataType;
use datafusion::functions_aggregate::expr_fn::{count, median};
use datafusion::logical_expr::{cast, col, lit, not, Case as DFCase, Expr};
use datafusion::prelude::*;
use datafusion::scalar::ScalarValue;
use std::collections::HashMap;

/// Constructs an expression equivalent to SQL COALESCE(col, fallback).
/// This is implemented as a CASE expression: if `col` is not null then return it, otherwise return `fallback`.
fn coalesce_expr_for(name: &str, fallback: Expr) -> Expr {
    Expr::Case(DFCase {
        expr: None,
        when_then_expr: vec![(Box::new(not(column(name).is_null())), Box::new(column(name)))],
        else_expr: Some(Box::new(fallback)),
    })
}

/// Generic helper function to apply a mapping to a set of target columns.
/// For each field in the DataFrame, if its name is in `target_cols` and a fallback is available via `get_fallback`,
/// then the column is replaced by a CASE-WHEN expression; otherwise, the original column is retained.
fn apply_imputation<F>(
    df: DataFrame,
    target_cols: &[String],
    get_fallback: F,
) -> PreprocResult<DataFrame>
where
    F: Fn(&str) -> Option<Expr>,
{
    let exprs: Vec<Expr> = df
        .schema()
        .fields()
        .iter()
        .map(|field| {
            let name = field.name();
            if target_cols.contains(name) {
                if let Some(fallback_expr) = get_fallback(name) {
                    coalesce_expr_for(name, fallback_expr).alias(name)
                } else {
                    column(name)
                }
            } else {
                column(name)
            }
        })
        .collect();
    df.select(exprs).map_err(PreprocError::from)
}

/// Replaces missing values with the given value.
///
/// The literal is resolved against each column's type when fitting, so a whole number filled
/// into an integer column stays an integer.
pub struct ArbitraryValueImputer {
    pub columns: Vec<String>,
    pub value: FillValue,
    pub impute_values: HashMap<String, ScalarValue>,
    fitted: bool,
}

impl ArbitraryValueImputer {
    /// Create a new arbitrary value imputer for the given columns.
    pub fn new(columns: Vec<String>, value: impl Into<FillValue>) -> Self {
        Self {
            columns,
            value: value.into(),
            impute_values: HashMap::new(),
            fitted: false,
        }
    }

    /// Validates the fill value and resolves its literal for every target column.
    pub async fn fit(&mut self, df: &DataFrame) -> PreprocResult<()> {
        validate_columns(df, &self.columns)?;
        if let FillValue::Number(v) = self.value {
            if !v.is_finite() {
                return Err(PreprocError::InvalidParameter(format!(
                    "Fixed number {} must be finite",
                    v
                )));
            }
        }
        self.impute_values = self
            .columns
            .iter()
            .map(|name| -> PreprocResult<(String, ScalarValue)> {
                let field = df.schema().field_with_name(None, name)?;
                Ok((name.clone(), self.value.to_scalar(field.data_type())))
            })
            .collect::<PreprocResult<HashMap<_, _>>>()?;
        self.fitted = true;
        Ok(())
    }

    /// Returns a new DataFrame where, for each target column, missing values are replaced with the fixed value.
    pub fn transform(&self, df: DataFrame) -> PreprocResult<DataFrame> {
        if !self.fitted {
            return Err(PreprocError::FitNotCalled);
        }
        validate_columns(&df, &self.columns)?;
        apply_imputation(df, &self.columns, |c| {
            self.impute_values.get(c).map(|v| lit(v.clone()))
        })
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

/// Replaces missing values with the most frequent value of each column.
/// Ties are broken in favor of the smallest value.
pub struct ModeImputer {
    pub columns: Vec<String>,
    pub impute_values: HashMap<String, ScalarValue>,
    fitted: bool,
}

impl ModeImputer {
    /// Create a new mode imputer for the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            impute_values: HashMap::new(),
            fitted: false,
        }
    }

    /// For each target column, compute the mode via grouping and counting.
    pub async fn fit(&mut self, df: &DataFrame) -> PreprocResult<()> {
        validate_columns(df, &self.columns)?;
        for col_name in &self.columns {
            let grouped = df
                .clone()
                .filter(column(col_name).is_not_null())?
                .aggregate(
                    vec![column(col_name)],
                    vec![count(column(col_name)).alias("cnt")],
                )?
                .sort(vec![
                    col("cnt").sort(false, false),
                    column(col_name).sort(true, false),
                ])?
                .limit(0, Some(1))?;
            let batches = grouped.collect().await?;
            let mode = match batches.iter().find(|b| b.num_rows() > 0) {
                Some(batch) => ScalarValue::try_from_array(batch.column(0), 0)?,
                None => {
                    return Err(PreprocError::InvalidData(format!(
                        "Column '{}' has no values to compute a mode from",
                        col_name
                    )))
                }
            };
            self.impute_values.insert(col_name.clone(), mode);
        }
        self.fitted = true;
        Ok(())
    }

    /// Returns a new DataFrame where, for each target column, missing values are replaced with the computed mode.
    pub fn transform(&self, df: DataFrame) -> PreprocResult<DataFrame> {
        if !self.fitted {
            return Err(PreprocError::FitNotCalled);
        }
        validate_columns(&df, &self.columns)?;
        apply_imputation(df, &self.columns, |name| {
            self.impute_values.get(name).map(|v| lit(v.clone()))
        })
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

/// Replaces missing values of a numeric column with the median of the rows sharing the same
/// group value. When a group has no usable values (or the group value itself is missing),
/// the median of the whole column is used instead. Medians ignore missing values and
/// average the two middle values for even counts. The group column is left untouched.
pub struct GroupMedianImputer {
    pub column: String,
    pub group: String,
    /// Median per group value, only for groups that have one.
    pub group_medians: Vec<(ScalarValue, f64)>,
    /// Median over the whole column; `None` when the column has no values at all.
    pub overall_median: Option<f64>,
    fitted: bool,
}

impl GroupMedianImputer {
    pub fn new(column: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            group: group.into(),
            group_medians: Vec::new(),
            overall_median: None,
            fitted: false,
        }
    }

    /// Computes the per-group medians and the overall median.
    pub async fn fit(&mut self, df: &DataFrame) -> PreprocResult<()> {
        validate_columns(df, &[self.column.clone(), self.group.clone()])?;
        validate_numeric_column(df, &self.column)?;

        let value = cast(column(&self.column), DataType::Float64);
        let per_group = df.clone().aggregate(
            vec![column(&self.group)],
            vec![median(value.clone()).alias("median")],
        )?;
        let overall = df
            .clone()
            .aggregate(vec![], vec![median(value).alias("median")])?;
        let (group_batches, overall_batches) =
            futures::try_join!(per_group.collect(), overall.collect())?;

        self.group_medians.clear();
        for batch in &group_batches {
            for i in 0..batch.num_rows() {
                let key = ScalarValue::try_from_array(batch.column(0), i)?;
                let med = ScalarValue::try_from_array(batch.column(1), i)?;
                if key.is_null() {
                    continue;
                }
                if let ScalarValue::Float64(Some(m)) = med {
                    self.group_medians.push((key, m));
                }
            }
        }

        self.overall_median = match overall_batches.iter().find(|b| b.num_rows() > 0) {
            Some(batch) => match ScalarValue::try_from_array(batch.column(0), 0)? {
                ScalarValue::Float64(m) => m,
                _ => None,
            },
            None => None,
        };
        tracing::debug!(
            column = %self.column,
            group = %self.group,
            groups = self.group_medians.len(),
            overall = ?self.overall_median,
            "fitted group medians"
        );
        self.fitted = true;
        Ok(())
    }

    /// Replaces the target column by its imputed (Float64) version, keeping the column position.
    pub fn transform(&self, df: DataFrame) -> PreprocResult<DataFrame> {
        if !self.fitted {
            return Err(PreprocError::FitNotCalled);
        }
        validate_columns(&df, &[self.column.clone(), self.group.clone()])?;

        let mut when_then_expr = vec![(
            Box::new(column(&self.column).is_not_null()),
            Box::new(cast(column(&self.column), DataType::Float64)),
        )];
        for (key, m) in &self.group_medians {
            when_then_expr.push((
                Box::new(column(&self.group).eq(lit(key.clone()))),
                Box::new(lit(*m)),
            ));
        }
        let imputed = Expr::Case(DFCase {
            expr: None,
            when_then_expr,
            else_expr: Some(Box::new(lit(ScalarValue::Float64(self.overall_median)))),
        })
        .alias(&self.column);

        let exprs: Vec<Expr> = df
            .schema()
            .fields()
            .iter()
            .map(|field| {
                if field.name() == &self.column {
                    imputed.clone()
                } else {
                    column(field.name())
                }
            })
            .collect();
        df.select(exprs).map_err(PreprocError::from)
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

/// Fills the missing values of `target_field` with group-conditional medians (see [`GroupMedianImputer`]).
pub async fn fill_group_median(
    df: DataFrame,
    target_field: &str,
    group_field: &str,
) -> PreprocResult<DataFrame> {
    let mut imputer = GroupMedianImputer::new(target_field, group_field);
    imputer.fit(&df).await?;
    imputer.transform(df)
}

/// Removes rows that contain a missing value in the given columns.
pub struct DropMissingData {
    pub columns: Vec<String>,
}

impl DropMissingData {
    /// Create a new drop-missing-data transformer that checks the specified columns.
    pub fn with_columns(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// Validates that the requested columns exist.
    pub async fn fit(&mut self, df: &DataFrame) -> PreprocResult<()> {
        validate_columns(df, &self.columns)
    }

    /// Returns a new DataFrame that excludes rows with any missing values in the given columns.
    /// The relative order of the remaining rows is unchanged.
    pub fn transform(&self, df: DataFrame) -> PreprocResult<DataFrame> {
        validate_columns(&df, &self.columns)?;
        let combined = self
            .columns
            .iter()
            .map(|col_name| column(col_name).is_not_null())
            .reduce(|acc, expr| acc.and(expr));
        match combined {
            Some(predicate) => df.filter(predicate).map_err(PreprocError::from),
            None => Ok(df),
        }
    }

    fn inherent_is_stateful(&self) -> bool {
        false
    }
}

impl_transformer!(ArbitraryValueImputer);
impl_transformer!(ModeImputer);
impl_transformer!(GroupMedianImputer);
impl_transformer!(DropMissingData);
