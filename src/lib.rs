//! # Preproc Engine
//!
//! A declarative preprocessing engine for tabular machine learning datasets, built on
//! [Apache DataFusion](https://datafusion.apache.org/).
//!
//! Each supported dataset has an ordered list of per-column [`rules::Rule`]s in the
//! [`registry`]. The [`interpreter`] applies them to a DataFusion `DataFrame` (filling missing
//! values, dropping columns, encoding categories, binning numbers) and narrates every change in a
//! [`pipeline::TransformationLog`]. The entry point [`preprocess::apply_preprocessing`] also runs
//! the dataset-specific [`extension`] and classifies the learning problem ([`problem`]).
//!
//! ```rust,no_run
//! use preproc_engine::preprocess::apply_preprocessing;
//! use preproc_engine::settings::Settings;
//! use preproc_engine::source::load_dataset;
//!
//! # async fn run() -> preproc_engine::exceptions::PreprocResult<()> {
//! let settings = Settings::from_env()?;
//! let ctx = settings.session_context();
//! let raw = load_dataset(&ctx, &settings.data_dir, "titanic").await?;
//! let output = apply_preprocessing("titanic", raw, "Survived").await?;
//! for line in &output.log {
//!     println!("{}", line);
//! }
//! println!("{}", output.problem);
//! # Ok(())
//! # }
//! ```

pub mod exceptions;
pub mod extension;
pub mod interpreter;
pub mod logging;
pub mod pipeline;
pub mod preprocess;
pub mod problem;
pub mod registry;
pub mod rules;
pub mod settings;
pub mod source;
pub mod transformers;

pub use exceptions::{PreprocError, PreprocResult};
pub use pipeline::TransformationLog;
pub use preprocess::{apply_preprocessing, PreprocessOutput};
pub use problem::ProblemDescriptor;
pub use registry::{rules_for, Dataset};
pub use rules::{Rule, RuleSet};
