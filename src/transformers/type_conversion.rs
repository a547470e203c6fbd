//! ## Transformers for converting column types
//!
//! - [`IntegerCaster`]: Casts columns to `Int64`, either an explicit list or every column that
//!   was added since a known set of columns (the derived columns of a preprocessing pass).

use super::{column, column_names, validate_columns};
use crate::exceptions::{PreprocError, PreprocResult};
use crate::impl_transformer;
use datafusion::arrow::datatypes::DataType;
use datafusion::logical_expr::{cast, Expr};
use datafusion::prelude::*;

enum Selection {
    Columns(Vec<String>),
    AddedSince(Vec<String>),
}

/// Casts columns to `Int64`, keeping their position. Missing values stay missing.
pub struct IntegerCaster {
    selection: Selection,
    /// Columns resolved by `fit`.
    pub columns: Vec<String>,
    fitted: bool,
}

impl IntegerCaster {
    /// Casts the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            selection: Selection::Columns(columns),
            columns: Vec::new(),
            fitted: false,
        }
    }

    /// Casts every column that is not in `baseline` at fit time.
    pub fn added_since(baseline: Vec<String>) -> Self {
        Self {
            selection: Selection::AddedSince(baseline),
            columns: Vec::new(),
            fitted: false,
        }
    }

    /// Resolves the columns to cast and checks that each one holds numbers or booleans.
    pub async fn fit(&mut self, df: &DataFrame) -> PreprocResult<()> {
        self.columns = match &self.selection {
            Selection::Columns(cols) => {
                validate_columns(df, cols)?;
                cols.clone()
            }
            Selection::AddedSince(baseline) => column_names(df)
                .into_iter()
                .filter(|name| !baseline.contains(name))
                .collect(),
        };
        for name in &self.columns {
            let field = df.schema().field_with_name(None, name)?;
            let data_type = field.data_type();
            if !(data_type.is_numeric() || data_type == &DataType::Boolean) {
                return Err(PreprocError::InvalidData(format!(
                    "Column '{}' cannot be converted to integers, it holds {:?}",
                    name, data_type
                )));
            }
        }
        self.fitted = true;
        Ok(())
    }

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
                if self.columns.contains(name) {
                    cast(column(name), DataType::Int64).alias(name)
                } else {
                    column(name)
                }
            })
            .collect();
        df.select(exprs).map_err(PreprocError::from)
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

impl_transformer!(IntegerCaster);
