//! ## Transformers for selecting features
//!
//! - [`DropFeatures`]: Removes columns from the DataFrame, keeping the order of the others.

use super::{column, validate_columns};
use crate::exceptions::{PreprocError, PreprocResult};
use crate::impl_transformer;
use datafusion::dataframe::DataFrame;
use datafusion::logical_expr::Expr;

/// Removes the listed columns. Every listed column must exist, and at least one column must remain.
pub struct DropFeatures {
    pub features: Vec<String>,
}

impl DropFeatures {
    pub fn new(features: Vec<String>) -> Self {
        Self { features }
    }

    pub async fn fit(&mut self, df: &DataFrame) -> PreprocResult<()> {
        validate_columns(df, &self.features)
    }

    pub fn transform(&self, df: DataFrame) -> PreprocResult<DataFrame> {
        validate_columns(&df, &self.features)?;
        let kept: Vec<Expr> = df
            .schema()
            .fields()
            .iter()
            .map(|field| field.name())
            .filter(|name| !self.features.contains(name))
            .map(|name| column(name))
            .collect();
        if kept.is_empty() {
            return Err(PreprocError::InvalidParameter(format!(
                "Dropping {:?} would leave no columns",
                self.features
            )));
        }
        df.select(kept).map_err(PreprocError::from)
    }

    fn inherent_is_stateful(&self) -> bool {
        false
    }
}

impl_transformer!(DropFeatures);
