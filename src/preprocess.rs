//! ## Preprocessing Entry Point
//!
//! Runs the complete preprocessing of a dataset: the registered rules, the dataset-specific
//! extension (titanic only), and the problem classification of the result.

use crate::exceptions::PreprocResult;
use crate::extension::apply_titanic_extension;
use crate::interpreter;
use crate::pipeline::TransformationLog;
use crate::problem::{classify, ProblemDescriptor};
use crate::registry::{rules_for, Dataset};
use crate::rules::Rule;
use datafusion::prelude::*;
use tracing::info;

/// Result of preprocessing a table.
pub struct PreprocessOutput {
    pub table: DataFrame,
    pub log: TransformationLog,
    pub problem: ProblemDescriptor,
}

/// Preprocesses `df` with the rules registered for `dataset_id`, predicting `target`.
///
/// Fails with [`crate::exceptions::PreprocError::UnknownDataset`] for unregistered datasets.
pub async fn apply_preprocessing(
    dataset_id: &str,
    df: DataFrame,
    target: &str,
) -> PreprocResult<PreprocessOutput> {
    let dataset: Dataset = dataset_id.parse()?;
    apply_preprocessing_with_rules(dataset, df, &rules_for(dataset), target).await
}

/// Like [`apply_preprocessing`], with a caller-supplied rule list in place of the registered one.
/// The dataset still decides whether an extension runs.
pub async fn apply_preprocessing_with_rules(
    dataset: Dataset,
    df: DataFrame,
    rules: &[Rule],
    target: &str,
) -> PreprocResult<PreprocessOutput> {
    info!(dataset = %dataset, target_column = target, "preprocessing");
    let (df, log) = interpreter::apply(df, rules, target).await?;
    let (table, log) = match dataset {
        Dataset::Titanic => apply_titanic_extension(df, target, log).await?,
        Dataset::Lego | Dataset::House => (df, log),
    };
    let problem = classify(&table, target).await?;
    info!(problem = %problem, lines = log.len(), "preprocessing finished");
    Ok(PreprocessOutput {
        table,
        log,
        problem,
    })
}
