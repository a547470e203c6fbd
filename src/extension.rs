//! ## Titanic Extension
//!
//! Feature engineering that runs after the registered rules of the `titanic` dataset: a title
//! extracted from the passenger name drives the age imputation, ages are bucketed, a family size
//! is derived and the cabin is reduced to its deck.
//!
//! Like the rule interpreter, the extension casts every column it creates to `Int64` at the end.

use crate::exceptions::PreprocResult;
use crate::interpreter::{dropped_rows_line, group_median_lines, one_hot_line, removed_line};
use crate::pipeline::{Pipeline, PipelineStep, TransformationLog};
use crate::transformers::categorical_encoding::OneHotEncoder;
use crate::transformers::column_names;
use crate::transformers::feature_creation::{PrefixExtractor, RegexExtractor, SumFeatures};
use crate::transformers::feature_selection::DropFeatures;
use crate::transformers::imputation::{ArbitraryValueImputer, DropMissingData, GroupMedianImputer};
use crate::transformers::type_conversion::IntegerCaster;
use crate::transformers::variable_discretization::ArbitraryDiscretizer;
use datafusion::prelude::*;
use tracing::info;

/// Matches the salutation in names such as `Braund, Mr. Owen Harris`.
pub const TITLE_PATTERN: &str = r" ([A-Za-z]+)\.";

/// Cabin value used when the cabin is unknown; it becomes deck `U`.
pub const UNKNOWN_CABIN: &str = "U";

/// Upper edges of the age buckets; the first bucket starts at 0.
pub const AGE_EDGES: [f64; 6] = [0.0, 10.0, 20.0, 40.0, 60.0, f64::INFINITY];

fn to_strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Builds the extension pipeline for a titanic table shaped like `df`.
pub fn plan_titanic_extension(df: &DataFrame, target: &str) -> Pipeline {
    let mut steps = vec![
        PipelineStep::new(
            "extract title",
            RegexExtractor::new("Name", "Title", TITLE_PATTERN),
            to_strings(&["title (Mr, Mrs, Miss, ...) was extracted from name"]),
        ),
        PipelineStep::new(
            "drop name",
            DropFeatures::new(to_strings(&["Name"])),
            vec![removed_line("name")],
        ),
    ];

    if target != "Age" {
        steps.push(PipelineStep::new(
            "fill age by title",
            GroupMedianImputer::new("Age", "Title"),
            group_median_lines("age", "title"),
        ));
        steps.push(PipelineStep::new(
            "bucket age",
            ArbitraryDiscretizer::new("Age", "AgeBin", AGE_EDGES.to_vec(), vec![0, 1, 2, 3, 4]),
            to_strings(&[
                "age was grouped as follows; the group index was added as AgeBin",
                "(0-10: child, 10-20: teenager, 20-40: adult, 40-60: middle-aged, over 60: senior)",
            ]),
        ));
        steps.push(PipelineStep::new(
            "drop age",
            DropFeatures::new(to_strings(&["Age"])),
            vec![removed_line("age")],
        ));
    } else {
        steps.push(PipelineStep::new(
            "drop rows with missing age",
            DropMissingData::with_columns(to_strings(&["Age"])),
            vec![dropped_rows_line("age")],
        ));
    }

    steps.push(PipelineStep::new(
        "one-hot encode title",
        OneHotEncoder::new(to_strings(&["Title"])),
        vec![one_hot_line("title")],
    ));

    if target != "SibSp" && target != "Parch" {
        steps.push(PipelineStep::new(
            "family size",
            SumFeatures::new("FamilySize", to_strings(&["SibSp", "Parch"]), 1),
            to_strings(&["family size (siblings/spouses + parents/children + self) was added"]),
        ));
    }

    steps.push(PipelineStep::new(
        "fill cabin",
        ArbitraryValueImputer::new(to_strings(&["Cabin"]), UNKNOWN_CABIN),
        vec![format!(
            "missing values of cabin were set to \"{}\"",
            UNKNOWN_CABIN
        )],
    ));
    steps.push(PipelineStep::new(
        "extract deck",
        PrefixExtractor::new("Cabin", "Deck", 1),
        to_strings(&["the first letter of cabin was added as deck"]),
    ));
    steps.push(PipelineStep::new(
        "one-hot encode deck",
        OneHotEncoder::new(to_strings(&["Deck"])),
        vec![one_hot_line("deck")],
    ));
    steps.push(PipelineStep::new(
        "drop cabin",
        DropFeatures::new(to_strings(&["Cabin"])),
        vec![removed_line("cabin")],
    ));
    steps.push(PipelineStep::silent(
        "cast derived columns",
        IntegerCaster::added_since(column_names(df)),
    ));
    Pipeline::new(steps, false)
}

/// Runs the titanic extension over `df`, appending its lines to `log`.
pub async fn apply_titanic_extension(
    df: DataFrame,
    target: &str,
    mut log: TransformationLog,
) -> PreprocResult<(DataFrame, TransformationLog)> {
    let mut pipeline = plan_titanic_extension(&df, target);
    info!(steps = pipeline.len(), "applying titanic extension");
    let (df, extension_log) = pipeline.fit_transform(df).await?;
    log.append(extension_log);
    Ok((df, log))
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::arrow::array::{Float64Array, Int64Array, StringArray};
    use datafusion::arrow::datatypes::{DataType, Field, Schema};
    use datafusion::arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    fn passengers() -> DataFrame {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Name", DataType::Utf8, false),
            Field::new("Age", DataType::Float64, true),
            Field::new("SibSp", DataType::Int64, false),
            Field::new("Parch", DataType::Int64, false),
            Field::new("Cabin", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["Braund, Mr. Owen"])),
                Arc::new(Float64Array::from(vec![Some(22.0)])),
                Arc::new(Int64Array::from(vec![1])),
                Arc::new(Int64Array::from(vec![0])),
                Arc::new(StringArray::from(vec![None::<&str>])),
            ],
        )
        .unwrap();
        SessionContext::new().read_batch(batch).unwrap()
    }

    #[test]
    fn test_age_target_skips_bucketing() {
        let names = plan_titanic_extension(&passengers(), "Age")
            .step_names()
            .join(",");
        assert!(names.contains("drop rows with missing age"));
        assert!(!names.contains("bucket age"));
    }

    #[test]
    fn test_family_size_skipped_for_family_targets() {
        let pipeline = plan_titanic_extension(&passengers(), "Parch");
        assert!(!pipeline.step_names().contains(&"family size"));
        let pipeline = plan_titanic_extension(&passengers(), "Survived");
        assert!(pipeline.step_names().contains(&"family size"));
    }
}
