//! ## Rule Interpreter
//!
//! Compiles an ordered list of [`Rule`]s into a [`Pipeline`] and runs it over a table.
//!
//! For every rule, the missing-value policy runs first and the column transform second. Whether
//! a policy fills values or drops rows, and whether a transform applies at all, depends on the
//! prediction target:
//!
//! | rule part        | `field != target`          | `field == target`                               |
//! |------------------|----------------------------|-------------------------------------------------|
//! | `fill_na`        | fill                       | drop rows with a missing value (fill if exempt) |
//! | `Drop`           | drop column                | drop column                                     |
//! | `IndexEncode`    | index encode               | index encode                                    |
//! | `OneHotEncode`   | one-hot encode             | index encode                                    |
//! | `Bin`            | add `<field>Bin`, drop     | nothing                                         |
//!
//! After the last rule, every column that did not exist before the pass is cast to `Int64`.

use crate::exceptions::PreprocResult;
use crate::pipeline::{Pipeline, PipelineStep, TransformationLog};
use crate::rules::{BinSpec, FillNa, Proc, Rule};
use crate::transformers::categorical_encoding::{IndexEncoder, OneHotEncoder};
use crate::transformers::column_names;
use crate::transformers::feature_selection::DropFeatures;
use crate::transformers::imputation::{
    ArbitraryValueImputer, DropMissingData, GroupMedianImputer, ModeImputer,
};
use crate::transformers::type_conversion::IntegerCaster;
use crate::transformers::variable_discretization::{
    ArbitraryDiscretizer, EqualFrequencyDiscretizer,
};
use datafusion::prelude::*;
use tracing::{debug, info};

/// Name of the column holding the bin index of `field`.
pub fn bin_column_name(field: &str) -> String {
    format!("{}Bin", field)
}

pub(crate) fn dropped_rows_line(display_name: &str) -> String {
    format!("rows where {} is missing were dropped", display_name)
}

pub(crate) fn group_median_lines(display_name: &str, group_display_name: &str) -> Vec<String> {
    vec![
        format!(
            "missing values of {} were set to the median of each {} group",
            display_name, group_display_name
        ),
        format!(
            "where a {} group had no median, the overall median of {} was used",
            group_display_name, display_name
        ),
    ]
}

pub(crate) fn one_hot_line(display_name: &str) -> String {
    format!("{} was one-hot encoded", display_name)
}

pub(crate) fn removed_line(display_name: &str) -> String {
    format!("{} was dropped", display_name)
}

fn index_line(display_name: &str) -> String {
    format!("{} was converted to index values", display_name)
}

/// Compiles `rules` into a pipeline for a table shaped like `df`.
///
/// Every rule is validated first; a malformed rule fails here, before anything runs.
/// Columns are checked against the table while the pipeline runs, since earlier rules
/// may add or remove columns.
pub fn plan(df: &DataFrame, rules: &[Rule], target: &str) -> PreprocResult<Pipeline> {
    let original_columns = column_names(df);
    let mut steps = Vec::new();
    for rule in rules {
        rule.validate()?;
        compile_rule(rule, target, &mut steps);
    }
    steps.push(PipelineStep::silent(
        "cast derived columns",
        IntegerCaster::added_since(original_columns),
    ));
    debug!(rules = rules.len(), steps = steps.len(), "compiled rules");
    Ok(Pipeline::new(steps, false))
}

/// Applies `rules` in order to `df`, returning the transformed table and the log of what was done.
///
/// Any failure aborts the whole pass; no log is returned in that case.
pub async fn apply(
    df: DataFrame,
    rules: &[Rule],
    target: &str,
) -> PreprocResult<(DataFrame, TransformationLog)> {
    let mut pipeline = plan(&df, rules, target)?;
    info!(rules = rules.len(), target_column = target, "applying preprocessing rules");
    let (df, log) = pipeline.fit_transform(df).await?;
    info!(lines = log.len(), "preprocessing rules applied");
    Ok((df, log))
}

fn compile_rule(rule: &Rule, target: &str, steps: &mut Vec<PipelineStep>) {
    let field = rule.field.clone();
    let display = rule.display_name.as_str();
    let is_target = rule.field == target;

    if let Some(fill) = &rule.fill_na {
        if !is_target || rule.target_exempt_from_drop {
            steps.push(fill_step(rule, fill));
        } else {
            steps.push(PipelineStep::new(
                format!("{}: drop rows with missing target", field),
                DropMissingData::with_columns(vec![field.clone()]),
                vec![dropped_rows_line(display)],
            ));
        }
    }

    let Some(proc) = &rule.proc else {
        return;
    };
    match proc {
        Proc::Drop => steps.push(PipelineStep::new(
            format!("{}: drop", field),
            DropFeatures::new(vec![field.clone()]),
            vec![format!(
                "{} was dropped because it has little relation to the target",
                display
            )],
        )),
        Proc::OneHotEncode { baseline } if !is_target => {
            let mut encoder = OneHotEncoder::new(vec![field.clone()]);
            if let Some(baseline) = baseline {
                encoder = encoder.with_baseline(field.clone(), baseline.clone());
            }
            steps.push(PipelineStep::new(
                format!("{}: one-hot encode", field),
                encoder,
                vec![one_hot_line(display)],
            ));
        }
        Proc::IndexEncode | Proc::OneHotEncode { .. } => steps.push(PipelineStep::new(
            format!("{}: index encode", field),
            IndexEncoder::new(vec![field.clone()]),
            vec![index_line(display)],
        )),
        Proc::Bin { .. } if is_target => {
            debug!(field = %field, "skipping binning of the target column");
        }
        Proc::Bin { spec, narration } => {
            let output = bin_column_name(&field);
            let name = format!("{}: bin", field);
            let step = match spec {
                BinSpec::Quantiles { bins } => PipelineStep::new(
                    name,
                    EqualFrequencyDiscretizer::new(field.clone(), output, *bins),
                    narration.clone(),
                ),
                BinSpec::Boundaries { edges, labels } => PipelineStep::new(
                    name,
                    ArbitraryDiscretizer::new(field.clone(), output, edges.clone(), labels.clone()),
                    narration.clone(),
                ),
            };
            steps.push(step);
            steps.push(PipelineStep::new(
                format!("{}: drop binned source", field),
                DropFeatures::new(vec![field.clone()]),
                vec![removed_line(display)],
            ));
        }
    }
}

fn fill_step(rule: &Rule, fill: &FillNa) -> PipelineStep {
    let field = rule.field.clone();
    let display = rule.display_name.as_str();
    let name = format!("{}: fill missing", field);
    match fill {
        FillNa::Value { value } => PipelineStep::new(
            name,
            ArbitraryValueImputer::new(vec![field], value.clone()),
            vec![format!("missing values of {} were set to {}", display, value)],
        ),
        FillNa::Mode => PipelineStep::new(
            name,
            ModeImputer::new(vec![field]),
            vec![format!(
                "missing values of {} were set to the most frequent value",
                display
            )],
        ),
        FillNa::GroupMedian {
            group_field,
            group_display_name,
        } => PipelineStep::new(
            name,
            GroupMedianImputer::new(field, group_field.clone()),
            group_median_lines(display, group_display_name),
        ),
    }
}
