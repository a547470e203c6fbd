//! ## Transformers for discretizing continuous variables
//!
//! This module provides transformers (or discretizers) that sort the values of a numeric column
//! into ordered bins and store the bin label of each row in a new integer column.
//!
//! Currently, the following transformers are implemented:
//!
//! - **ArbitraryDiscretizer:** Discretizes based on user-defined bin edges and labels.
//! - **EqualFrequencyDiscretizer:** Discretizes a column into bins containing roughly equal numbers of records.
//!
//! Bins are right-closed intervals `(lower, upper]`, except the first one, which also contains
//! its lower edge. Columns with missing values are rejected, so every row gets a bin. The source column is left in place; dropping it is up to the caller.
//! Errors are returned as `PreprocError` and results are wrapped in `PreprocResult`.

use super::{collect_f64, column, validate_numeric_column};
use crate::exceptions::{PreprocError, PreprocResult};
use crate::impl_transformer;
use datafusion::logical_expr::{lit, Case as DFCase, Expr};
use datafusion::prelude::*;
use datafusion::scalar::ScalarValue;
use rayon::prelude::*;

/// Helper function to build a CASE expression for the bins described by `edges` and `labels`.
/// For bin `i` (between `edges[i]` and `edges[i + 1]`), it generates the condition:
/// `WHEN col >= lower AND col <= upper THEN label` for the first bin and
/// `WHEN col > lower AND col <= upper THEN label` for every other bin.
/// If none match, returns NULL.
fn build_interval_case_expr(col_name: &str, edges: &[f64], labels: &[i64]) -> Expr {
    let when_then_expr = edges
        .windows(2)
        .zip(labels)
        .enumerate()
        .map(|(i, (pair, label))| {
            let (lower, upper) = (pair[0], pair[1]);
            let lower_cond = if i == 0 {
                column(col_name).gt_eq(lit(lower))
            } else {
                column(col_name).gt(lit(lower))
            };
            let condition = lower_cond.and(column(col_name).lt_eq(lit(upper)));
            (Box::new(condition), Box::new(lit(*label)))
        })
        .collect::<Vec<_>>();
    Expr::Case(DFCase {
        expr: None,
        when_then_expr,
        else_expr: Some(Box::new(lit(ScalarValue::Int64(None)))),
    })
}

/// Appends the bin column computed from `edges`/`labels` to the DataFrame.
fn append_bin_column(
    df: DataFrame,
    source: &str,
    output: &str,
    edges: &[f64],
    labels: &[i64],
) -> PreprocResult<DataFrame> {
    validate_numeric_column(&df, source)?;
    let mut exprs: Vec<Expr> = df
        .schema()
        .fields()
        .iter()
        .filter(|field| field.name() != output)
        .map(|field| column(field.name()))
        .collect();
    exprs.push(build_interval_case_expr(source, edges, labels).alias(output));
    df.select(exprs).map_err(PreprocError::from)
}

/// Fails with `InvalidData` when `name` has missing values; a bin index is never left empty.
async fn ensure_no_missing(df: &DataFrame, name: &str) -> PreprocResult<()> {
    let missing = df.clone().filter(column(name).is_null())?.count().await?;
    if missing > 0 {
        return Err(PreprocError::InvalidData(format!(
            "Column '{}' has {} missing value(s) and cannot be binned",
            name, missing
        )));
    }
    Ok(())
}

/// Computes the `q`-quantile of sorted values with linear interpolation between neighbours.
pub fn quantile_linear(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Discretizes a column with user-defined edges. `labels[i]` is assigned to the bin between
/// `edges[i]` and `edges[i + 1]`. Edges may include `f64::INFINITY` for an open last bin.
pub struct ArbitraryDiscretizer {
    pub column: String,
    pub output: String,
    pub edges: Vec<f64>,
    pub labels: Vec<i64>,
}

impl ArbitraryDiscretizer {
    pub fn new(
        column: impl Into<String>,
        output: impl Into<String>,
        edges: Vec<f64>,
        labels: Vec<i64>,
    ) -> Self {
        Self {
            column: column.into(),
            output: output.into(),
            edges,
            labels,
        }
    }

    /// Validates the edges and labels, and that every value of the column falls inside the edges.
    pub async fn fit(&mut self, df: &DataFrame) -> PreprocResult<()> {
        validate_numeric_column(df, &self.column)?;
        if self.edges.len() < 2 {
            return Err(PreprocError::InvalidParameter(format!(
                "Binning '{}' needs at least two edges",
                self.column
            )));
        }
        if self.labels.len() != self.edges.len() - 1 {
            return Err(PreprocError::InvalidParameter(format!(
                "Binning '{}' has {} edges but {} labels",
                self.column,
                self.edges.len(),
                self.labels.len()
            )));
        }
        for pair in self.edges.windows(2) {
            if pair[0] >= pair[1] {
                return Err(PreprocError::InvalidParameter(format!(
                    "For column '{}', edge {} is not less than edge {}",
                    self.column, pair[0], pair[1]
                )));
            }
        }

        ensure_no_missing(df, &self.column).await?;
        let (lowest, highest) = (self.edges[0], self.edges[self.edges.len() - 1]);
        let outside = df
            .clone()
            .filter(
                column(&self.column)
                    .lt(lit(lowest))
                    .or(column(&self.column).gt(lit(highest))),
            )?
            .count()
            .await?;
        if outside > 0 {
            return Err(PreprocError::InvalidData(format!(
                "{} value(s) of column '{}' fall outside the bin edges [{}, {}]",
                outside, self.column, lowest, highest
            )));
        }
        Ok(())
    }

    /// Adds the bin column.
    pub fn transform(&self, df: DataFrame) -> PreprocResult<DataFrame> {
        append_bin_column(df, &self.column, &self.output, &self.edges, &self.labels)
    }

    fn inherent_is_stateful(&self) -> bool {
        false
    }
}

/// Splits a column into `bins` bins containing approximately equal numbers of values.
/// Edges are the exact quantiles `i / bins` of the non-missing values; bin labels are `0..bins`.
pub struct EqualFrequencyDiscretizer {
    pub column: String,
    pub output: String,
    pub bins: usize,
    /// Quantile edges learned by `fit`.
    pub edges: Vec<f64>,
}

impl EqualFrequencyDiscretizer {
    /// Create a new EqualFrequencyDiscretizer with the specified number of bins.
    pub fn new(column: impl Into<String>, output: impl Into<String>, bins: usize) -> Self {
        Self {
            column: column.into(),
            output: output.into(),
            bins,
            edges: Vec::new(),
        }
    }

    /// Fit the discretizer by computing the quantile edges of the column.
    pub async fn fit(&mut self, df: &DataFrame) -> PreprocResult<()> {
        if self.bins < 1 {
            return Err(PreprocError::InvalidParameter(
                "Number of bins must be at least 1".to_string(),
            ));
        }
        validate_numeric_column(df, &self.column)?;
        ensure_no_missing(df, &self.column).await?;
        let mut values = collect_f64(df, &self.column).await?;
        if values.is_empty() {
            return Err(PreprocError::InvalidData(format!(
                "Column '{}' has no values to compute quantiles from",
                self.column
            )));
        }
        values.par_sort_unstable_by(f64::total_cmp);

        let edges = (0..=self.bins)
            .filter_map(|i| quantile_linear(&values, i as f64 / self.bins as f64))
            .collect::<Vec<_>>();
        if edges
            .windows(2)
            .any(|pair| approx::relative_eq!(pair[0], pair[1]))
        {
            return Err(PreprocError::InvalidData(format!(
                "Bin edges must be unique: column '{}' cannot be split into {} equal-frequency bins {:?}",
                self.column, self.bins, edges
            )));
        }
        self.edges = edges;
        Ok(())
    }

    /// Adds the bin column.
    pub fn transform(&self, df: DataFrame) -> PreprocResult<DataFrame> {
        if self.edges.is_empty() {
            return Err(PreprocError::FitNotCalled);
        }
        let labels: Vec<i64> = (0..self.bins as i64).collect();
        append_bin_column(df, &self.column, &self.output, &self.edges, &labels)
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

impl_transformer!(ArbitraryDiscretizer);
impl_transformer!(EqualFrequencyDiscretizer);

#[cfg(test)]
mod tests {
    use super::quantile_linear;
    use approx::assert_relative_eq;

    #[test]
    fn test_quantile_linear_interpolates() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        assert_relative_eq!(quantile_linear(&values, 0.0).unwrap(), 1.0);
        assert_relative_eq!(quantile_linear(&values, 0.25).unwrap(), 25.75);
        assert_relative_eq!(quantile_linear(&values, 0.5).unwrap(), 50.5);
        assert_relative_eq!(quantile_linear(&values, 1.0).unwrap(), 100.0);
    }

    #[test]
    fn test_quantile_linear_empty() {
        assert!(quantile_linear(&[], 0.5).is_none());
    }
}
