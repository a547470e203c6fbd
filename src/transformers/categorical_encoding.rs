//! # Categorical Encoding Transformers
//!
//! This module provides the categorical encoding strategies used by the rule interpreter to
//! transform categorical columns into numeric representations.
//!
//! The encoders include:
//! - **IndexEncoder:** Replaces each category with a dense integer code, assigned in the order
//!   in which categories first appear in the column.
//! - **OneHotEncoder:** Expands each categorical column into one indicator column per distinct
//!   category, optionally leaving out a baseline category.
//!
//! Each encoder exposes a constructor, an asynchronous `fit` method to learn the categories from
//! a DataFrame, and a `transform` method that applies the encoding.

use super::{category_label, collect_scalars, column, validate_columns};
use crate::exceptions::{PreprocError, PreprocResult};
use crate::impl_transformer;
use datafusion::arrow::array::Array;
use datafusion::logical_expr::{lit, Case as DFCase, Expr};
use datafusion::prelude::*;
use datafusion::scalar::ScalarValue;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Helper to build a CASE WHEN expression given a mapping from categories to codes.
/// For each pair, the expression generated is:
/// `WHEN <col> = lit(<category>) THEN lit(<code>)`
/// Values outside the mapping (and missing values) become NULL.
fn build_case_expr(col_name: &str, mapping: &[(ScalarValue, i64)]) -> Expr {
    let when_then_expr = mapping
        .iter()
        .map(|(cat, code)| {
            (
                Box::new(column(col_name).eq(lit(cat.clone()))),
                Box::new(lit(*code)),
            )
        })
        .collect();
    Expr::Case(DFCase {
        expr: None,
        when_then_expr,
        else_expr: Some(Box::new(lit(ScalarValue::Int64(None)))),
    })
}

/// Extract the distinct non-missing values of a column, sorted ascending.
async fn extract_distinct_values(
    df: &DataFrame,
    col_name: &str,
) -> PreprocResult<Vec<ScalarValue>> {
    let distinct_df = df.clone().select(vec![column(col_name)])?.distinct()?;
    let batches = distinct_df.collect().await?;
    let mut values = Vec::new();
    for batch in batches {
        let array = batch.column(0);
        for i in 0..array.len() {
            if !array.is_null(i) {
                values.push(ScalarValue::try_from_array(array, i)?);
            }
        }
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Ok(values)
}

/// Distinct non-missing values in order of first appearance.
fn first_seen_order(values: Vec<ScalarValue>) -> Vec<ScalarValue> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| !v.is_null() && seen.insert(v.clone()))
        .collect()
}

/// ------------------------- IndexEncoder -------------------------
///
/// IndexEncoder replaces each category with a dense integer code starting at 0.
/// Codes follow first appearance, so encoding an already encoded column leaves it unchanged.
pub struct IndexEncoder {
    pub columns: Vec<String>,
    /// Mapping from column to (category, code) pairs in code order.
    pub mapping: HashMap<String, Vec<(ScalarValue, i64)>>,
    fitted: bool,
}

impl IndexEncoder {
    /// Create a new IndexEncoder for the specified columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            mapping: HashMap::new(),
            fitted: false,
        }
    }

    /// Learn the code of every category of each target column.
    pub async fn fit(&mut self, df: &DataFrame) -> PreprocResult<()> {
        validate_columns(df, &self.columns)?;
        for col_name in &self.columns {
            let values = collect_scalars(df, col_name).await?;
            let mapping = first_seen_order(values)
                .into_iter()
                .enumerate()
                .map(|(i, cat)| (cat, i as i64))
                .collect();
            self.mapping.insert(col_name.clone(), mapping);
        }
        self.fitted = true;
        Ok(())
    }

    /// Transform the DataFrame by replacing each target column's value with its code.
    pub fn transform(&self, df: DataFrame) -> PreprocResult<DataFrame> {
        if !self.fitted {
            return Err(PreprocError::FitNotCalled);
        }
        validate_columns(&df, &self.columns)?;
        let exprs: Vec<Expr> = df
            .schema()
            .fields()
            .iter()
            .map(|field| {
                let name = field.name();
                match self.mapping.get(name) {
                    Some(map) if self.columns.contains(name) => {
                        build_case_expr(name, map).alias(name)
                    }
                    _ => column(name),
                }
            })
            .collect();
        df.select(exprs).map_err(PreprocError::from)
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

/// ------------------------- OneHotEncoder -------------------------
///
/// OneHotEncoder transforms each categorical column into multiple indicator columns
/// (one per distinct category, in ascending category order). The new column names are
/// constructed by concatenating the original column name, an underscore, and the category value.
/// The indicator columns are appended after the existing columns.
pub struct OneHotEncoder {
    pub columns: Vec<String>,
    /// Mapping from column name to list of distinct category values.
    pub categories: HashMap<String, Vec<ScalarValue>>,
    /// Category per column whose indicator column is left out.
    pub baselines: HashMap<String, String>,
    pub drop_original: bool,
    fitted: bool,
}

impl OneHotEncoder {
    /// Create a new OneHotEncoder for the specified columns. The original columns are removed.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            categories: HashMap::new(),
            baselines: HashMap::new(),
            drop_original: true,
            fitted: false,
        }
    }

    /// Leave out the indicator column of `category` for `column`.
    pub fn with_baseline(mut self, column: impl Into<String>, category: impl Into<String>) -> Self {
        self.baselines.insert(column.into(), category.into());
        self
    }

    /// Keep the original columns next to the indicators.
    pub fn keep_original(mut self) -> Self {
        self.drop_original = false;
        self
    }

    /// Name of the indicator column for `category` of `col_name`.
    pub fn indicator_name(col_name: &str, category: &ScalarValue) -> String {
        format!("{}_{}", col_name, category_label(category))
    }

    /// Learn distinct category values for each target column.
    pub async fn fit(&mut self, df: &DataFrame) -> PreprocResult<()> {
        validate_columns(df, &self.columns)?;
        for col_name in &self.columns {
            let values = extract_distinct_values(df, col_name).await?;
            if let Some(baseline) = self.baselines.get(col_name) {
                if !values.iter().any(|v| &category_label(v) == baseline) {
                    return Err(PreprocError::MissingColumn(format!(
                        "Column '{}_{}' not found: '{}' is not a category of '{}'",
                        col_name, baseline, baseline, col_name
                    )));
                }
            }
            self.categories.insert(col_name.clone(), values);
        }
        self.fitted = true;
        Ok(())
    }

    /// Transform the DataFrame by adding an indicator column (0/1) for each category.
    pub fn transform(&self, df: DataFrame) -> PreprocResult<DataFrame> {
        if !self.fitted {
            return Err(PreprocError::FitNotCalled);
        }
        validate_columns(&df, &self.columns)?;
        let mut exprs: Vec<Expr> = df
            .schema()
            .fields()
            .iter()
            .filter(|field| !(self.drop_original && self.columns.contains(field.name())))
            .map(|field| column(field.name()))
            .collect();
        for col_name in &self.columns {
            let Some(cats) = self.categories.get(col_name) else {
                continue;
            };
            let baseline = self.baselines.get(col_name);
            for cat in cats {
                if baseline.is_some_and(|b| b == &category_label(cat)) {
                    continue;
                }
                let indicator = Expr::Case(DFCase {
                    expr: None,
                    when_then_expr: vec![(
                        Box::new(column(col_name).eq(lit(cat.clone()))),
                        Box::new(lit(1_i64)),
                    )],
                    else_expr: Some(Box::new(lit(0_i64))),
                })
                .alias(Self::indicator_name(col_name, cat));
                exprs.push(indicator);
            }
        }
        df.select(exprs).map_err(PreprocError::from)
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

impl_transformer!(IndexEncoder);
impl_transformer!(OneHotEncoder);
