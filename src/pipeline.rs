//! ## Preprocessing Pipeline
//!
//! This module provides the core abstractions for running ordered, narrated transformation steps
//! over a DataFusion [`DataFrame`].
//!
//! ### Overview
//!
//! - The [`Transformer`] trait defines a common interface for data transformation steps,
//!   supporting both stateful (requiring fitting) and stateless transformations.
//! - A [`PipelineStep`] pairs a transformer with the log lines that describe it to the user.
//! - The [`Pipeline`] runs its steps in order and collects those lines into a [`TransformationLog`].
//!   A step's lines are appended only after the step succeeded, so the log always reflects
//!   exactly the transformations that were applied, in the order they were applied.
//! - The [`crate::impl_transformer`] macro implements [`Transformer`] for types that already
//!   expose inherent `fit`/`transform`/`inherent_is_stateful` methods.

use crate::exceptions::{PreprocError, PreprocResult};
use async_trait::async_trait;
use datafusion::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Trait for components used in the data transformation pipeline.
///
/// Every transformer must provide a `fit` method (which may collect data to compute parameters)
/// and a `transform` method (which updates the DataFrame's logical plan without triggering execution).
#[async_trait]
pub trait Transformer {
    /// Fit the transformer given a DataFrame.
    async fn fit(&mut self, df: &DataFrame) -> PreprocResult<()>;

    /// Transform the input DataFrame, returning a new DataFrame with the transformation applied.
    fn transform(&self, df: DataFrame) -> PreprocResult<DataFrame>;

    /// Returns true if the transformer is stateful (i.e. requires a call to fit before transform can be called).
    fn is_stateful(&self) -> bool;
}

/// Macro to implement the [`Transformer`] trait for the engine's transformers.
///
/// The type must already have inherent methods:
/// - `async fn fit(&mut self, &DataFrame) -> PreprocResult<()>`
/// - `fn transform(&self, DataFrame) -> PreprocResult<DataFrame>`
/// - `fn inherent_is_stateful(&self) -> bool`
///
/// # Example
///
/// ```rust,no_run
/// use preproc_engine::exceptions::PreprocResult;
/// use datafusion::prelude::DataFrame;
/// use preproc_engine::impl_transformer;
///
/// pub struct Passthrough;
///
/// impl Passthrough {
///     pub async fn fit(&mut self, _df: &DataFrame) -> PreprocResult<()> {
///         Ok(())
///     }
///
///     pub fn transform(&self, df: DataFrame) -> PreprocResult<DataFrame> {
///         Ok(df)
///     }
///
///     pub fn inherent_is_stateful(&self) -> bool {
///         false
///     }
/// }
///
/// impl_transformer!(Passthrough);
/// ```
#[macro_export]
macro_rules! impl_transformer {
    ($ty:ty) => {
        #[async_trait::async_trait]
        impl $crate::pipeline::Transformer for $ty {
            async fn fit(
                &mut self,
                df: &datafusion::prelude::DataFrame,
            ) -> $crate::exceptions::PreprocResult<()> {
                <$ty>::fit(self, df).await
            }
            fn transform(
                &self,
                df: datafusion::prelude::DataFrame,
            ) -> $crate::exceptions::PreprocResult<datafusion::prelude::DataFrame> {
                <$ty>::transform(self, df)
            }
            fn is_stateful(&self) -> bool {
                <$ty>::inherent_is_stateful(self)
            }
        }
    };
}

/// Ordered, append-only list of human-readable lines describing what was done to a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformationLog {
    lines: Vec<String>,
}

impl TransformationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Appends all lines of `other`, keeping their order.
    pub fn append(&mut self, other: TransformationLog) {
        self.lines.extend(other.lines);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.lines.iter()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl<'a> IntoIterator for &'a TransformationLog {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

impl From<Vec<String>> for TransformationLog {
    fn from(lines: Vec<String>) -> Self {
        Self { lines }
    }
}

/// A named transformer together with the log lines emitted once it has been applied.
pub struct PipelineStep {
    pub name: String,
    pub transformer: Box<dyn Transformer + Send + Sync>,
    pub narration: Vec<String>,
}

impl PipelineStep {
    pub fn new<T>(name: impl Into<String>, transformer: T, narration: Vec<String>) -> Self
    where
        T: Transformer + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            transformer: Box::new(transformer),
            narration,
        }
    }

    /// A step that does not add anything to the transformation log.
    pub fn silent<T>(name: impl Into<String>, transformer: T) -> Self
    where
        T: Transformer + Send + Sync + 'static,
    {
        Self::new(name, transformer, Vec::new())
    }
}

/// A pipeline that chains a sequence of narrated transformers.
///
/// Each transformer is fitted on the output of the previous one, so statistics such as medians
/// or category sets always reflect the table as it is at that point of the sequence.
pub struct Pipeline {
    steps: Vec<PipelineStep>,
    verbose: bool,
}

impl Pipeline {
    /// Creates a new pipeline.
    ///
    /// # Arguments
    ///
    /// * `steps` - The steps, in execution order.
    /// * `verbose` - If true, reports each step and its timing at `info` level.
    pub fn new(steps: Vec<PipelineStep>, verbose: bool) -> Self {
        Self { steps, verbose }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Names of the steps in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    /// Fits and applies each step in order, returning the final DataFrame and the log.
    ///
    /// Errors are returned unchanged; no partial log is produced on failure.
    pub async fn fit_transform(
        &mut self,
        df: DataFrame,
    ) -> PreprocResult<(DataFrame, TransformationLog)> {
        if self.steps.is_empty() {
            return Err(PreprocError::InvalidParameter(
                "Pipeline must have at least one step.".to_string(),
            ));
        }
        let mut current_df = df;
        let mut log = TransformationLog::new();
        for step in self.steps.iter_mut() {
            let start = Instant::now();
            step.transformer.fit(&current_df).await?;
            current_df = step.transformer.transform(current_df)?;
            for line in &step.narration {
                log.push(line.clone());
            }
            if self.verbose {
                info!(step = %step.name, elapsed = ?start.elapsed(), "step completed");
            } else {
                debug!(step = %step.name, elapsed = ?start.elapsed(), "step completed");
            }
        }
        Ok((current_df, log))
    }

    /// Applies the `transform` method of each step without fitting.
    ///
    /// Only valid when every stateful step has already been fitted, e.g. to replay a fitted
    /// pipeline on another table with the same schema.
    pub fn transform(&self, df: DataFrame) -> PreprocResult<DataFrame> {
        if self.steps.is_empty() {
            return Err(PreprocError::InvalidParameter(
                "Pipeline must have at least one step.".to_string(),
            ));
        }
        let mut current_df = df;
        for step in self.steps.iter() {
            debug!(step = %step.name, "applying transformer");
            current_df = step.transformer.transform(current_df)?;
        }
        Ok(current_df)
    }
}
