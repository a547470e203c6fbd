//! ## Problem Classification
//!
//! Decides whether predicting a target column is a regression or a classification problem.
//! Regression targets are a fixed list of known numeric columns across the supported datasets;
//! every other target is treated as a class label.

use crate::exceptions::{PreprocError, PreprocResult};
use crate::transformers::column;
use datafusion::functions_aggregate::expr_fn::count_distinct;
use datafusion::prelude::*;
use datafusion::scalar::ScalarValue;
use std::fmt;

/// Target columns that are predicted with regression.
pub const REGRESSION_TARGETS: &[&str] = &[
    // titanic
    "Age",
    "SibSp",
    "Parch",
    "Fare",
    // lego
    "Year",
    "NumInstructions",
    "Pieces",
    "Minifigures",
    "Owned",
    "Rating",
    "UsdMsrp",
    "TotalQuantity",
    "CurrentPrice",
    // house
    "LotFrontage",
    "LotArea",
    "YearBuilt",
    "YearRemodAdd",
    "MasVnrArea",
    "BsmtFinSF1",
    "BsmtFinSF2",
    "BsmtUnfSF",
    "TotalBsmtSF",
    "1stFlrSF",
    "2ndFlrSF",
    "LowQualFinSF",
    "GrLivArea",
    "BsmtFullBath",
    "BsmtHalfBath",
    "FullBath",
    "HalfBath",
    "BedroomAbvGr",
    "KitchenAbvGr",
    "TotRmsAbvGrd",
    "Fireplaces",
    "GarageYrBlt",
    "GarageCars",
    "GarageArea",
    "WoodDeckSF",
    "OpenPorchSF",
    "EnclosedPorch",
    "3SsnPorch",
    "ScreenPorch",
    "PoolArea",
    "MiscVal",
    "MoSold",
    "YrSold",
    "SalePrice",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    Regression,
    Classification,
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemKind::Regression => f.write_str("regression"),
            ProblemKind::Classification => f.write_str("classification"),
        }
    }
}

/// The kind of learning problem, with the number of classes for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemDescriptor {
    Regression,
    Classification { class_count: usize },
}

impl ProblemDescriptor {
    pub fn kind(&self) -> ProblemKind {
        match self {
            ProblemDescriptor::Regression => ProblemKind::Regression,
            ProblemDescriptor::Classification { .. } => ProblemKind::Classification,
        }
    }

    /// Number of model outputs: 1 for regression, the class count otherwise.
    pub fn class_count(&self) -> usize {
        match self {
            ProblemDescriptor::Regression => 1,
            ProblemDescriptor::Classification { class_count } => *class_count,
        }
    }
}

impl fmt::Display for ProblemDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemDescriptor::Regression => write!(f, "regression"),
            ProblemDescriptor::Classification { class_count } => {
                write!(f, "classification ({} classes)", class_count)
            }
        }
    }
}

pub fn is_regression_target(target: &str) -> bool {
    REGRESSION_TARGETS.contains(&target)
}

/// Classifies the problem of predicting `target` from `df`.
///
/// Regression targets are recognised by name alone. The class count of a classification
/// problem is the number of distinct non-missing values of the target column.
pub async fn classify(df: &DataFrame, target: &str) -> PreprocResult<ProblemDescriptor> {
    if is_regression_target(target) {
        return Ok(ProblemDescriptor::Regression);
    }
    if df.schema().field_with_name(None, target).is_err() {
        return Err(PreprocError::MissingColumn(format!(
            "Target column '{}' not found in DataFrame",
            target
        )));
    }
    let batches = df
        .clone()
        .aggregate(vec![], vec![count_distinct(column(target)).alias("classes")])?
        .collect()
        .await?;
    let class_count = match batches.iter().find(|b| b.num_rows() > 0) {
        Some(batch) => match ScalarValue::try_from_array(batch.column(0), 0)? {
            ScalarValue::Int64(Some(n)) => n as usize,
            other => {
                return Err(PreprocError::InvalidData(format!(
                    "Unexpected distinct count {:?} for target '{}'",
                    other, target
                )))
            }
        },
        None => 0,
    };
    Ok(ProblemDescriptor::Classification { class_count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list() {
        assert!(is_regression_target("SalePrice"));
        assert!(is_regression_target("1stFlrSF"));
        assert!(!is_regression_target("Survived"));
        assert!(!is_regression_target("saleprice"));
        assert_eq!(REGRESSION_TARGETS.len(), 47);
    }

    #[tokio::test]
    async fn test_regression_target_is_a_name_lookup() {
        let df = SessionContext::new().read_empty().unwrap();
        assert_eq!(
            classify(&df, "SalePrice").await.unwrap(),
            ProblemDescriptor::Regression
        );
        assert!(matches!(
            classify(&df, "Survived").await,
            Err(PreprocError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_descriptor_class_count() {
        assert_eq!(ProblemDescriptor::Regression.class_count(), 1);
        let problem = ProblemDescriptor::Classification { class_count: 3 };
        assert_eq!(problem.class_count(), 3);
        assert_eq!(problem.kind(), ProblemKind::Classification);
        assert_eq!(problem.to_string(), "classification (3 classes)");
    }
}
