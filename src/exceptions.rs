//! ## Custom Errors for the Preprocessing Engine
//!
//! This module defines the error type returned by every fallible operation of the crate.
//! It uses the `thiserror` crate to derive the `Error` trait.
//! The `PreprocError` enum separates configuration problems (a rule that does not fit the table
//! or is malformed) from data problems (values that cannot be processed as the rule demands),
//! and wraps errors coming from DataFusion, Arrow, I/O, and JSON handling unchanged.
//!
//! The `PreprocResult` type alias simplifies error handling by providing a convenient
//! alias for results returned by the library.
//!
//! ### Example
//!
//! ```rust
//! use preproc_engine::exceptions::{ErrorKind, PreprocError, PreprocResult};
//!
//! fn lookup() -> PreprocResult<()> {
//!     Err(PreprocError::UnknownDataset("iris".into()))
//! }
//!
//! assert_eq!(lookup().unwrap_err().kind(), ErrorKind::Configuration);
//! ```

use thiserror::Error;

/// Errors specific to the preprocessing engine.
#[derive(Debug, Error)]
pub enum PreprocError {
    /// Wraps underlying I/O errors.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Wraps errors from DataFusion.
    #[error("DataFusion error: {0}")]
    DataFusionError(#[from] datafusion::error::DataFusionError),

    /// Wraps errors from Arrow.
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// Wraps errors from reading or writing JSON rule sets.
    #[error("JSON error: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// Indicates that a rule or transformer was configured with an invalid parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Indicates that the provided data format is unsupported (e.g., unknown file extension).
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Indicates that no rule set is registered for the requested dataset.
    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    /// Indicates that the specified column does not exist in the DataFrame.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Indicates that the values of a column cannot be processed as requested.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Indicates the transform method was called before calling fit for a stateful transformer.
    #[error("Transform called before fit for stateful transformer")]
    FitNotCalled,
}

/// Coarse classification of a [`PreprocError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The rule registry does not match the table, or a rule is malformed. Not retryable.
    Configuration,
    /// A column holds values the requested operation cannot handle.
    Data,
    /// A failure inside the query engine, the file system, or a serializer.
    Engine,
}

impl PreprocError {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PreprocError::InvalidParameter(_)
            | PreprocError::UnsupportedFormat(_)
            | PreprocError::UnknownDataset(_)
            | PreprocError::MissingColumn(_)
            | PreprocError::FitNotCalled => ErrorKind::Configuration,
            PreprocError::InvalidData(_) => ErrorKind::Data,
            PreprocError::IoError(_)
            | PreprocError::DataFusionError(_)
            | PreprocError::ArrowError(_)
            | PreprocError::SerdeError(_) => ErrorKind::Engine,
        }
    }
}

/// A convenient result type for the preprocessing engine.
pub type PreprocResult<T> = Result<T, PreprocError>;
